//! The session container shared by every page.
//!
//! `Session` owns the client-side state and runs one HTTP request per
//! operation through a [`SessionApi`]. Outcomes are reported through a
//! [`Notifier`] and page changes go through [`Navigate`], so the whole
//! container can run without a browser.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use shared_types::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, UpdateUserRequest, User, MIN_PASSWORD_LEN,
};
use uuid::Uuid;

use super::api::{SessionApi, SessionError};
use super::state::{FormField, SessionState, Toast, ToastKind, UserForm};
use crate::router::Route;

pub const INVALID_REGISTRATION: &str = "Please enter a valid email and password (min 6 characters)";

pub trait Navigate {
    fn navigate(&self, route: Route);
}

pub trait Notifier {
    fn notify(&self, toast: &Toast);
}

#[derive(Clone)]
pub struct Session {
    state: Rc<RefCell<SessionState>>,
    revision: Rc<Cell<u64>>,
    api: Rc<dyn SessionApi>,
    navigator: Rc<dyn Navigate>,
    notifier: Rc<dyn Notifier>,
    on_change: Rc<dyn Fn()>,
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Session {
    pub fn new(
        api: Rc<dyn SessionApi>,
        navigator: Rc<dyn Navigate>,
        notifier: Rc<dyn Notifier>,
        on_change: Rc<dyn Fn()>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(SessionState::default())),
            revision: Rc::new(Cell::new(0)),
            api,
            navigator,
            notifier,
            on_change,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Bumped on every change; lets the provider tell renders apart.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.state.borrow_mut());
        self.revision.set(self.revision.get() + 1);
        (self.on_change)();
    }

    fn set_loading(&self, loading: bool) {
        self.update(|state| state.loading = loading);
    }

    fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        let toast = Toast {
            kind,
            message: message.into(),
        };
        self.notifier.notify(&toast);
        self.update(|state| state.toast = Some(toast));
    }

    /// Log a failed operation and show the user why.
    fn fail(&self, context: &str, err: SessionError, fallback: &str) -> SessionError {
        tracing::warn!("{}: {}", context, err);
        self.toast(ToastKind::Error, err.user_message(fallback));
        err
    }

    /// Run `call` with the loading flag raised, clearing it on every outcome.
    async fn with_loading<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        self.set_loading(true);
        let result = call.await;
        self.set_loading(false);
        result
    }

    pub fn dismiss_toast(&self) {
        self.update(|state| state.toast = None);
    }

    pub fn handle_input(&self, field: FormField, value: String) {
        self.update(|state| state.form.set(field, value));
    }

    pub async fn register_user(&self) -> Result<User, SessionError> {
        let form = self.state.borrow().form.clone();
        if !form.email.contains('@') || form.password.chars().count() < MIN_PASSWORD_LEN {
            let err = SessionError::Invalid(INVALID_REGISTRATION.to_string());
            return Err(self.fail("Registration rejected", err, INVALID_REGISTRATION));
        }

        let request = RegisterRequest {
            name: form.name,
            email: form.email,
            password: form.password,
        };
        match self.with_loading(self.api.register(&request)).await {
            Ok(user) => {
                self.toast(ToastKind::Success, "User registered successfully");
                self.update(|state| state.form = UserForm::default());
                self.navigator.navigate(Route::Login);
                Ok(user)
            }
            Err(err) => Err(self.fail("Error registering user", err, "Registration failed")),
        }
    }

    pub async fn login_user(&self) -> Result<(), SessionError> {
        let request = {
            let state = self.state.borrow();
            LoginRequest {
                email: state.form.email.clone(),
                password: state.form.password.clone(),
            }
        };

        match self.with_loading(self.api.login(&request)).await {
            Ok(_) => {
                self.toast(ToastKind::Success, "User logged in successfully");
                self.update(|state| state.form = UserForm::default());
                // Already toasted on failure.
                let _ = self.get_user().await;
                self.navigator.navigate(Route::Home);
                Ok(())
            }
            Err(err) => Err(self.fail("Error logging in user", err, "Login failed")),
        }
    }

    /// Whether the session cookie is still good. A definite "no" from the
    /// server sends the user to the login page; a failed check does not.
    pub async fn user_login_status(&self) -> bool {
        match self.with_loading(self.api.login_status()).await {
            Ok(logged_in) => {
                if !logged_in {
                    self.navigator.navigate(Route::Login);
                }
                logged_in
            }
            Err(err) => {
                tracing::warn!("Error getting login status: {}", err);
                false
            }
        }
    }

    pub async fn logout_user(&self) -> Result<(), SessionError> {
        match self.api.logout().await {
            Ok(_) => {
                self.toast(ToastKind::Success, "User logged out successfully");
                self.update(SessionState::clear_user);
                self.navigator.navigate(Route::Login);
                Ok(())
            }
            Err(err) => Err(self.fail("Error logging out", err, "Logout failed")),
        }
    }

    pub async fn get_user(&self) -> Result<(), SessionError> {
        match self.with_loading(self.api.get_user()).await {
            Ok(profile) => {
                self.update(|state| state.user.merge(profile));
                Ok(())
            }
            Err(err) => Err(self.fail("Error getting user details", err, "Failed to get user")),
        }
    }

    pub async fn update_user(&self, changes: UpdateUserRequest) -> Result<(), SessionError> {
        match self.with_loading(self.api.update_user(&changes)).await {
            Ok(profile) => {
                self.update(|state| state.user.merge(profile));
                self.toast(ToastKind::Success, "User updated successfully");
                Ok(())
            }
            Err(err) => Err(self.fail("Error updating user", err, "Update failed")),
        }
    }

    pub async fn email_verification(&self) -> Result<(), SessionError> {
        match self.with_loading(self.api.send_verification_email()).await {
            Ok(_) => {
                self.toast(ToastKind::Success, "Email verification sent successfully");
                Ok(())
            }
            Err(err) => Err(self.fail(
                "Error sending verification email",
                err,
                "Verification failed",
            )),
        }
    }

    pub async fn verify_user(&self, token: &str) -> Result<(), SessionError> {
        match self.with_loading(self.api.verify_user(token)).await {
            Ok(_) => {
                self.toast(ToastKind::Success, "User verified successfully");
                let _ = self.get_user().await;
                self.navigator.navigate(Route::Home);
                Ok(())
            }
            Err(err) => Err(self.fail("Error verifying user", err, "Verification failed")),
        }
    }

    pub async fn forgot_password_email(&self, email: &str) -> Result<(), SessionError> {
        let request = ForgotPasswordRequest {
            email: email.to_string(),
        };
        match self.with_loading(self.api.forgot_password(&request)).await {
            Ok(_) => {
                self.toast(
                    ToastKind::Success,
                    "Forgot password email sent successfully",
                );
                Ok(())
            }
            Err(err) => Err(self.fail(
                "Error sending forgot password email",
                err,
                "Request failed",
            )),
        }
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), SessionError> {
        let request = ResetPasswordRequest {
            password: password.to_string(),
        };
        match self.with_loading(self.api.reset_password(token, &request)).await {
            Ok(_) => {
                self.toast(ToastKind::Success, "Password reset successfully");
                self.navigator.navigate(Route::Login);
                Ok(())
            }
            Err(err) => Err(self.fail("Error resetting password", err, "Reset failed")),
        }
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), SessionError> {
        let request = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        match self.with_loading(self.api.change_password(&request)).await {
            Ok(_) => {
                self.toast(ToastKind::Success, "Password changed successfully");
                Ok(())
            }
            Err(err) => Err(self.fail("Error changing password", err, "Change failed")),
        }
    }

    pub async fn get_all_users(&self) -> Result<(), SessionError> {
        match self.with_loading(self.api.list_users()).await {
            Ok(users) => {
                self.update(|state| state.all_users = users);
                Ok(())
            }
            Err(err) => Err(self.fail("Error getting all users", err, "Failed to get users")),
        }
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), SessionError> {
        match self.with_loading(self.api.delete_user(id)).await {
            Ok(_) => {
                self.toast(ToastKind::Success, "User deleted successfully");
                let _ = self.get_all_users().await;
                Ok(())
            }
            Err(err) => Err(self.fail("Error deleting user", err, "Delete failed")),
        }
    }

    /// Startup: check the session and load the user when it is live.
    pub async fn hydrate(&self) {
        if self.user_login_status().await {
            let _ = self.get_user().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::UserProfile;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use shared_types::{MessageResponse, Role};

    fn ok_message() -> Result<MessageResponse, SessionError> {
        Ok(MessageResponse::new("ok"))
    }

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo: None,
            bio: shared_types::DEFAULT_BIO.to_string(),
            role,
            is_verified: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    /// Scripted API that records which endpoints were hit.
    struct FakeApi {
        calls: RefCell<Vec<String>>,
        registered: RefCell<Vec<RegisterRequest>>,
        status: Result<bool, SessionError>,
        user: Result<UserProfile, SessionError>,
        update: Result<UserProfile, SessionError>,
        users: Result<Vec<User>, SessionError>,
        failure: Option<SessionError>,
    }

    impl FakeApi {
        fn new(profile: UserProfile) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                registered: RefCell::new(Vec::new()),
                status: Ok(true),
                user: Ok(profile),
                update: Ok(UserProfile::default()),
                users: Ok(Vec::new()),
                failure: None,
            }
        }

        fn hit(&self, name: &str) -> Result<(), SessionError> {
            self.calls.borrow_mut().push(name.to_string());
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        fn called(&self, name: &str) -> bool {
            self.calls.borrow().iter().any(|c| c == name)
        }
    }

    #[async_trait(?Send)]
    impl SessionApi for FakeApi {
        async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
            self.hit("register")?;
            self.registered.borrow_mut().push(request.clone());
            Ok(sample_user(Role::Standard))
        }

        async fn login(&self, _request: &LoginRequest) -> Result<User, SessionError> {
            self.hit("login")?;
            Ok(sample_user(Role::Standard))
        }

        async fn login_status(&self) -> Result<bool, SessionError> {
            self.hit("login_status")?;
            self.status.clone()
        }

        async fn logout(&self) -> Result<MessageResponse, SessionError> {
            self.hit("logout")?;
            ok_message()
        }

        async fn get_user(&self) -> Result<UserProfile, SessionError> {
            self.hit("get_user")?;
            self.user.clone()
        }

        async fn update_user(
            &self,
            _changes: &UpdateUserRequest,
        ) -> Result<UserProfile, SessionError> {
            self.hit("update_user")?;
            self.update.clone()
        }

        async fn send_verification_email(&self) -> Result<MessageResponse, SessionError> {
            self.hit("send_verification_email")?;
            ok_message()
        }

        async fn verify_user(&self, _token: &str) -> Result<MessageResponse, SessionError> {
            self.hit("verify_user")?;
            ok_message()
        }

        async fn forgot_password(
            &self,
            _request: &ForgotPasswordRequest,
        ) -> Result<MessageResponse, SessionError> {
            self.hit("forgot_password")?;
            ok_message()
        }

        async fn reset_password(
            &self,
            _token: &str,
            _request: &ResetPasswordRequest,
        ) -> Result<MessageResponse, SessionError> {
            self.hit("reset_password")?;
            ok_message()
        }

        async fn change_password(
            &self,
            _request: &ChangePasswordRequest,
        ) -> Result<MessageResponse, SessionError> {
            self.hit("change_password")?;
            ok_message()
        }

        async fn list_users(&self) -> Result<Vec<User>, SessionError> {
            self.hit("list_users")?;
            self.users.clone()
        }

        async fn delete_user(&self, _id: Uuid) -> Result<MessageResponse, SessionError> {
            self.hit("delete_user")?;
            ok_message()
        }
    }

    #[derive(Default)]
    struct RecordingNavigator(RefCell<Vec<Route>>);

    impl Navigate for RecordingNavigator {
        fn navigate(&self, route: Route) {
            self.0.borrow_mut().push(route);
        }
    }

    #[derive(Default)]
    struct RecordingNotifier(RefCell<Vec<Toast>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, toast: &Toast) {
            self.0.borrow_mut().push(toast.clone());
        }
    }

    struct Harness {
        session: Session,
        api: Rc<FakeApi>,
        navigator: Rc<RecordingNavigator>,
        notifier: Rc<RecordingNotifier>,
        renders: Rc<Cell<u32>>,
    }

    impl Harness {
        fn new(api: FakeApi) -> Self {
            let api = Rc::new(api);
            let navigator = Rc::new(RecordingNavigator::default());
            let notifier = Rc::new(RecordingNotifier::default());
            let renders = Rc::new(Cell::new(0));
            let counter = renders.clone();
            let session = Session::new(
                api.clone(),
                navigator.clone(),
                notifier.clone(),
                Rc::new(move || counter.set(counter.get() + 1)),
            );
            Self {
                session,
                api,
                navigator,
                notifier,
                renders,
            }
        }

        fn last_route(&self) -> Option<Route> {
            self.navigator.0.borrow().last().cloned()
        }

        fn last_toast(&self) -> Option<Toast> {
            self.notifier.0.borrow().last().cloned()
        }
    }

    fn admin_profile() -> UserProfile {
        UserProfile::from(sample_user(Role::Admin))
    }

    fn fill_form(session: &Session, email: &str, password: &str) {
        session.handle_input(FormField::Name, "Ada".to_string());
        session.handle_input(FormField::Email, email.to_string());
        session.handle_input(FormField::Password, password.to_string());
    }

    #[test]
    fn test_short_password_rejected_before_any_request() {
        let h = Harness::new(FakeApi::new(UserProfile::default()));
        fill_form(&h.session, "ada@example.com", "12345");

        let err = block_on(h.session.register_user()).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
        assert!(h.api.calls.borrow().is_empty());
        assert_eq!(h.last_toast().unwrap().kind, ToastKind::Error);
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_six_character_password_is_sent() {
        let h = Harness::new(FakeApi::new(UserProfile::default()));
        fill_form(&h.session, "ada@example.com", "123456");

        block_on(h.session.register_user()).unwrap();
        let sent = h.api.registered.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].password, "123456");
        assert_eq!(h.session.state().form, UserForm::default());
        assert_eq!(h.last_route(), Some(Route::Login));
    }

    #[test]
    fn test_email_without_at_sign_is_rejected() {
        let h = Harness::new(FakeApi::new(UserProfile::default()));
        fill_form(&h.session, "ada.example.com", "123456");

        assert!(block_on(h.session.register_user()).is_err());
        assert!(!h.api.called("register"));
    }

    #[test]
    fn test_update_merges_into_existing_user() {
        let mut api = FakeApi::new(admin_profile());
        api.update = Ok(UserProfile {
            bio: Some("Analytical engines".to_string()),
            ..Default::default()
        });
        let h = Harness::new(api);

        block_on(h.session.get_user()).unwrap();
        block_on(h.session.update_user(UpdateUserRequest {
            bio: Some("Analytical engines".to_string()),
            ..Default::default()
        }))
        .unwrap();

        let user = h.session.state().user;
        assert_eq!(user.name.as_deref(), Some("Ada"));
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.bio.as_deref(), Some("Analytical engines"));
        assert_eq!(user.role, Some(Role::Admin));
    }

    #[test]
    fn test_logout_hides_admin_ui() {
        let mut api = FakeApi::new(admin_profile());
        api.users = Ok(vec![sample_user(Role::Standard)]);
        let h = Harness::new(api);

        block_on(h.session.hydrate());
        block_on(h.session.get_all_users()).unwrap();
        assert!(h.session.state().is_admin());
        assert_eq!(h.session.state().all_users.len(), 1);

        block_on(h.session.logout_user()).unwrap();
        let state = h.session.state();
        assert!(!state.is_admin());
        assert!(!state.is_logged_in());
        assert!(state.all_users.is_empty());
        assert_eq!(h.last_route(), Some(Route::Login));
    }

    #[test]
    fn test_loading_is_cleared_on_failure() {
        let mut api = FakeApi::new(UserProfile::default());
        api.failure = Some(SessionError::Forbidden(
            "Please verify your email address!".to_string(),
        ));
        let h = Harness::new(api);

        let err = block_on(h.session.change_password("old-pass", "new-pass")).unwrap_err();
        assert!(matches!(err, SessionError::Forbidden(_)));
        assert!(!h.session.state().loading);
        assert_eq!(
            h.last_toast().unwrap().message,
            "Please verify your email address!"
        );

        assert!(block_on(h.session.get_user()).is_err());
        assert!(block_on(h.session.delete_user(Uuid::new_v4())).is_err());
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_empty_server_message_uses_fallback() {
        let mut api = FakeApi::new(UserProfile::default());
        api.failure = Some(SessionError::RequestFailed(String::new()));
        let h = Harness::new(api);
        fill_form(&h.session, "ada@example.com", "123456");

        assert!(block_on(h.session.login_user()).is_err());
        assert_eq!(h.last_toast().unwrap().message, "Login failed");
        assert_eq!(h.last_route(), None);
    }

    #[test]
    fn test_hydrate_skips_user_fetch_when_logged_out() {
        let mut api = FakeApi::new(admin_profile());
        api.status = Ok(false);
        let h = Harness::new(api);

        block_on(h.session.hydrate());
        assert!(h.api.called("login_status"));
        assert!(!h.api.called("get_user"));
        assert_eq!(h.last_route(), Some(Route::Login));
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_failed_status_check_stays_put() {
        let mut api = FakeApi::new(admin_profile());
        api.status = Err(SessionError::Unauthenticated(
            "Not authorized, please login!".to_string(),
        ));
        let h = Harness::new(api);

        assert!(!block_on(h.session.user_login_status()));
        assert_eq!(h.last_route(), None);
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_login_fetches_user_and_goes_home() {
        let h = Harness::new(FakeApi::new(admin_profile()));
        fill_form(&h.session, "ada@example.com", "123456");

        block_on(h.session.login_user()).unwrap();
        assert!(h.api.called("get_user"));
        assert!(h.session.state().is_logged_in());
        assert_eq!(h.session.state().form, UserForm::default());
        assert_eq!(h.last_route(), Some(Route::Home));
    }

    #[test]
    fn test_delete_refreshes_user_list() {
        let h = Harness::new(FakeApi::new(admin_profile()));

        block_on(h.session.delete_user(Uuid::new_v4())).unwrap();
        let calls = h.api.calls.borrow();
        assert_eq!(calls.as_slice(), ["delete_user", "list_users"]);
    }

    #[test]
    fn test_changes_are_published() {
        let h = Harness::new(FakeApi::new(UserProfile::default()));
        let before = h.session.revision();

        h.session.handle_input(FormField::Email, "a@b.c".to_string());
        assert_eq!(h.session.state().form.email, "a@b.c");
        assert!(h.session.revision() > before);
        assert!(h.renders.get() > 0);
    }

    #[test]
    fn test_email_verification_toasts_without_navigating() {
        let h = Harness::new(FakeApi::new(admin_profile()));

        block_on(h.session.email_verification()).unwrap();
        assert!(h.api.called("send_verification_email"));
        let toast = h.last_toast().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "Email verification sent successfully");
        assert_eq!(h.last_route(), None);
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_verify_user_refreshes_user_and_goes_home() {
        let mut verified = admin_profile();
        verified.is_verified = Some(true);
        let h = Harness::new(FakeApi::new(verified));

        block_on(h.session.verify_user("mailed-token")).unwrap();
        assert_eq!(h.api.calls.borrow().as_slice(), ["verify_user", "get_user"]);
        assert!(h.session.state().is_verified());
        assert_eq!(h.last_route(), Some(Route::Home));
        assert!(h
            .notifier
            .0
            .borrow()
            .iter()
            .any(|t| t.kind == ToastKind::Success && t.message == "User verified successfully"));
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_forgot_password_email_toasts() {
        let h = Harness::new(FakeApi::new(UserProfile::default()));

        block_on(h.session.forgot_password_email("ada@example.com")).unwrap();
        assert!(h.api.called("forgot_password"));
        let toast = h.last_toast().unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.message, "Forgot password email sent successfully");
        assert_eq!(h.last_route(), None);
    }

    #[test]
    fn test_reset_password_goes_to_login() {
        let h = Harness::new(FakeApi::new(UserProfile::default()));

        block_on(h.session.reset_password("mailed-token", "fresh-secret")).unwrap();
        assert!(h.api.called("reset_password"));
        assert_eq!(h.last_toast().unwrap().message, "Password reset successfully");
        assert_eq!(h.last_route(), Some(Route::Login));
        assert!(!h.session.state().loading);
    }

    #[test]
    fn test_recovery_failures_clear_loading_and_stay_put() {
        let mut api = FakeApi::new(UserProfile::default());
        api.failure = Some(SessionError::RequestFailed(String::new()));
        let h = Harness::new(api);

        assert!(block_on(h.session.email_verification()).is_err());
        assert_eq!(h.last_toast().unwrap().message, "Verification failed");

        assert!(block_on(h.session.verify_user("stale-token")).is_err());
        assert!(!h.api.called("get_user"));

        assert!(block_on(h.session.forgot_password_email("ada@example.com")).is_err());
        assert_eq!(h.last_toast().unwrap().message, "Request failed");

        let err = block_on(h.session.reset_password("stale-token", "fresh-secret")).unwrap_err();
        assert!(matches!(err, SessionError::RequestFailed(_)));
        let toast = h.last_toast().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Reset failed");

        assert_eq!(h.last_route(), None);
        assert!(!h.session.state().loading);
    }
}
