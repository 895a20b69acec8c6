use serde::{Deserialize, Serialize};
use shared_types::{Role, User};
use uuid::Uuid;

/// Client copy of the signed-in user.
///
/// Every field is optional so a response can be merged over what the client
/// already holds without erasing fields the response left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub bio: Option<String>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
}

impl UserProfile {
    /// Overlay the fields present in `other`.
    pub fn merge(&mut self, other: UserProfile) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.id, other.id);
        take(&mut self.name, other.name);
        take(&mut self.email, other.email);
        take(&mut self.photo, other.photo);
        take(&mut self.bio, other.bio);
        take(&mut self.role, other.role);
        take(&mut self.is_verified, other.is_verified);
    }

    pub fn is_signed_in(&self) -> bool {
        self.id.is_some()
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: Some(user.id),
            name: Some(user.name),
            email: Some(user.email),
            photo: user.photo,
            bio: Some(user.bio),
            role: Some(user.role),
            is_verified: Some(user.is_verified),
        }
    }
}

/// Fields bound to the register and login forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl UserForm {
    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Name => self.name = value,
            FormField::Email => self.email = value,
            FormField::Password => self.password = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: UserProfile,
    pub form: UserForm,
    pub loading: bool,
    /// Filled for admins only.
    pub all_users: Vec<User>,
    pub toast: Option<Toast>,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.user.is_signed_in()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role(), Some(Role::Admin))
    }

    pub fn is_creator_or_admin(&self) -> bool {
        match self.role() {
            Some(Role::Creator) | Some(Role::Admin) => true,
            Some(Role::Standard) | None => false,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.user.is_verified.unwrap_or(false)
    }

    /// Forget everything tied to the signed-in user.
    pub fn clear_user(&mut self) {
        self.user = UserProfile::default();
        self.all_users.clear();
    }
}
