//! HTTP handlers for the account API.
//!
//! Routes behind the session gate take the resolved user through the
//! [`CurrentUser`](crate::auth::CurrentUser) extractor; the gate has already
//! applied the route group's policy by the time a handler runs.

pub mod account;
pub mod admin;
pub mod verification;

use shared_types::MIN_PASSWORD_LEN;

use crate::error::{ApiError, ApiResult};

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters!";
pub const USER_NOT_FOUND: &str = "User not found";

/// Emails are stored lowercase and compared that way.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn check_password_length(password: &str) -> ApiResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(PASSWORD_TOO_SHORT));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drives the full router in-process.

    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use shared_types::{Role, User};
    use tower::ServiceExt;

    use crate::auth::{create_token, hash_password, AuthConfig};
    use crate::mailer::testing::RecordingMailer;
    use crate::memory::MemoryStore;
    use crate::repository::NewUser;
    use crate::{create_app, AppState};

    pub const PASSWORD: &str = "correct-horse";

    pub struct TestApp {
        pub state: AppState,
        pub mailer: Arc<RecordingMailer>,
        router: Router,
    }

    pub struct TestResponse {
        pub status: StatusCode,
        pub headers: HeaderMap,
        pub body: Value,
    }

    impl TestResponse {
        pub fn message(&self) -> &str {
            self.body["message"].as_str().unwrap_or_default()
        }

        /// `name=value` part of the `Set-Cookie` header, as a browser would
        /// send it back.
        pub fn session_cookie(&self) -> Option<String> {
            let set_cookie = self.headers.get(header::SET_COOKIE)?.to_str().ok()?;
            set_cookie.split(';').next().map(str::to_string)
        }
    }

    impl TestApp {
        pub fn new() -> Self {
            let mut auth_config = AuthConfig::new("test-secret");
            auth_config.bcrypt_cost = 4;
            let mailer = Arc::new(RecordingMailer::default());
            let state = AppState::new(
                auth_config,
                Arc::new(MemoryStore::new()),
                mailer.clone(),
                "http://localhost:3000/",
            );
            let router = create_app(state.clone());
            Self {
                state,
                mailer,
                router,
            }
        }

        pub async fn request(
            &self,
            method: Method,
            uri: &str,
            cookie: Option<&str>,
            body: Option<Value>,
        ) -> TestResponse {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header(header::COOKIE, cookie);
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&json).unwrap()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            self.send(request).await
        }

        /// Send a request exactly as built, for bodies `request` cannot express.
        pub async fn send(&self, request: Request<Body>) -> TestResponse {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };

            TestResponse {
                status,
                headers,
                body,
            }
        }

        /// Create a user directly in the store and return it with a session
        /// cookie for it.
        pub async fn seed_user(&self, email: &str, role: Role, verified: bool) -> (User, String) {
            let password_hash = hash_password(PASSWORD, 4).await.unwrap();
            let mut user = self
                .state
                .users
                .create(NewUser {
                    name: "Seeded".to_string(),
                    email: email.to_string(),
                    password_hash,
                    role,
                })
                .await
                .unwrap()
                .expect("email already seeded");
            if verified {
                user = self.state.users.mark_verified(user.id).await.unwrap().unwrap();
            }
            let token = create_token(&self.state.auth_config, user.id).unwrap();
            (user, format!("token={}", token))
        }

        /// Plain token from the most recently mailed link.
        pub fn last_mailed_token(&self) -> String {
            let link = self.mailer.last_link().expect("no email was sent");
            link.rsplit('/').next().unwrap().to_string()
        }
    }
}
