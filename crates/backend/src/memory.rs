//! In-memory store used by tests and by local development when no
//! `DATABASE_URL` is configured. Contents are lost on restart.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_types::{UpdateUserRequest, User, DEFAULT_BIO};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::TokenKind;
use crate::repository::{NewToken, NewUser, TokenStore, UserCredentials, UserStore};

#[derive(Debug, Clone)]
struct TokenEntry {
    user_id: Uuid,
    kind: TokenKind,
    token_hash: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserCredentials>>,
    tokens: RwLock<Vec<TokenEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).map(|c| c.user.clone()))
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> Result<Option<UserCredentials>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn create(&self, input: NewUser) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        if users.values().any(|c| c.user.email == input.email) {
            return Ok(None);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            photo: None,
            bio: DEFAULT_BIO.to_string(),
            role: input.role,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: input.password_hash,
            },
        );

        Ok(Some(user))
    }

    async fn update_profile(&self, id: Uuid, changes: &UpdateUserRequest) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(entry) = users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            entry.user.name = name.clone();
        }
        if let Some(photo) = &changes.photo {
            entry.user.photo = Some(photo.clone());
        }
        if let Some(bio) = &changes.bio {
            entry.user.bio = bio.clone();
        }
        entry.user.updated_at = Utc::now();

        Ok(Some(entry.user.clone()))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(entry) => {
                entry.password_hash = password_hash.to_string();
                entry.user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_verified(&self, id: Uuid) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|entry| {
            entry.user.is_verified = true;
            entry.user.updated_at = Utc::now();
            entry.user.clone()
        }))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut all: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .map(|c| c.user.clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn issue(&self, token: NewToken) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        tokens.retain(|t| !(t.user_id == token.user_id && t.kind == token.kind));
        tokens.push(TokenEntry {
            user_id: token.user_id,
            kind: token.kind,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
        });
        Ok(())
    }

    async fn take_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>> {
        let mut tokens = self.tokens.write().await;
        let position = tokens
            .iter()
            .position(|t| t.kind == kind && t.token_hash == token_hash && t.expires_at > now);
        Ok(position.map(|index| tokens.remove(index).user_id))
    }

    async fn purge_user(&self, user_id: Uuid) -> Result<()> {
        self.tokens.write().await.retain(|t| t.user_id != user_id);
        Ok(())
    }
}
