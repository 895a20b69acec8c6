//! Storage traits for user accounts and one-time tokens.
//!
//! Handlers and the session gate only see these traits through `AppState`,
//! so the Postgres store (`crate::db::PgStore`) and the in-memory store
//! (`crate::memory::MemoryStore`) are interchangeable.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{Role, UpdateUserRequest, User};
use uuid::Uuid;

use crate::auth::TokenKind;

/// A user together with the credential the projection leaves out.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Input for creating a new user. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Input for storing a one-time token digest.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Password-stripped projection of a user.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_credentials_by_id(&self, id: Uuid) -> Result<Option<UserCredentials>>;

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    /// `None` when the email is already registered. The check and the insert
    /// are one step, so concurrent registrations cannot both succeed.
    async fn create(&self, input: NewUser) -> Result<Option<User>>;

    /// Apply the fields present in `changes`; `None` when the user is gone.
    async fn update_profile(&self, id: Uuid, changes: &UpdateUserRequest) -> Result<Option<User>>;

    /// Returns false when the user is gone.
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool>;

    async fn mark_verified(&self, id: Uuid) -> Result<Option<User>>;

    /// All users, newest first.
    async fn list(&self) -> Result<Vec<User>>;

    /// Returns false when there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a token, replacing any earlier token of the same kind for the user.
    async fn issue(&self, token: NewToken) -> Result<()>;

    /// Remove an unexpired token with this digest and return its owner.
    /// A token can be taken at most once, even by concurrent callers.
    async fn take_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>>;

    /// Drop every token owned by a user.
    async fn purge_user(&self, user_id: Uuid) -> Result<()>;
}
