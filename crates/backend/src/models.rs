// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared_types::{Role, User};
use uuid::Uuid;

use crate::repository::UserCredentials;

/// Database representation of users
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub photo: Option<String>,
    pub bio: String,
    pub role: String, // "user", "creator" or "admin"
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_credentials(self) -> UserCredentials {
        let role = self.role.parse::<Role>().unwrap_or_else(|_| {
            tracing::warn!(
                "User {} has unknown role {:?}, treating as standard",
                self.id,
                self.role
            );
            Role::Standard
        });

        UserCredentials {
            user: User {
                id: self.id,
                name: self.name,
                email: self.email,
                photo: self.photo,
                bio: self.bio,
                role,
                is_verified: self.is_verified,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.password_hash,
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        row.into_credentials().user
    }
}

/// Insertable struct for new users
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUserRow<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub bio: &'a str,
    pub role: &'a str,
}

/// Profile changes; `None` fields are left untouched
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub photo: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for one-time token digests
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::user_tokens)]
pub struct NewTokenRow<'a> {
    pub user_id: Uuid,
    pub kind: &'a str,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}
