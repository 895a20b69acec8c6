use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};
use shared_types::{UpdateUserRequest, User, DEFAULT_BIO};
use uuid::Uuid;

use crate::auth::TokenKind;
use crate::repository::{NewToken, NewUser, TokenStore, UserCredentials, UserStore};

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    // Parse the connection string and connect with TLS
    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // Spawn the connection task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    // Build the async connection from the tokio-postgres client
    AsyncPgConnection::try_from(client).await
}

pub fn establish_connection_pool(database_url: &str, tls: bool) -> anyhow::Result<DbPool> {
    let config = if tls {
        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup =
            Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
            database_url,
            manager_config,
        )
    } else {
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url)
    };
    let pool = Pool::builder(config)
        .build()
        .context("failed to build database pool")?;

    Ok(pool)
}

// User database operations
pub mod users {
    use super::*;
    use crate::models::{NewUserRow, UserChanges, UserRow};

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> anyhow::Result<Option<UserRow>> {
        use crate::schema::users::dsl::*;

        let row = users
            .filter(id.eq(user_id))
            .select(UserRow::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(row)
    }

    pub async fn get_by_email(
        conn: &mut AsyncPgConnection,
        address: &str,
    ) -> anyhow::Result<Option<UserRow>> {
        use crate::schema::users::dsl::*;

        let row = users
            .filter(email.eq(address))
            .select(UserRow::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(row)
    }

    pub async fn list_all(conn: &mut AsyncPgConnection) -> anyhow::Result<Vec<UserRow>> {
        use crate::schema::users::dsl::*;

        let rows = users
            .order_by(created_at.desc())
            .select(UserRow::as_select())
            .load(conn)
            .await?;

        Ok(rows)
    }

    /// `None` when the unique email constraint rejects the insert.
    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_user: NewUserRow<'_>,
    ) -> anyhow::Result<Option<UserRow>> {
        use crate::schema::users::dsl::*;

        let result = diesel::insert_into(users)
            .values(&new_user)
            .returning(UserRow::as_returning())
            .get_result(conn)
            .await;

        match result {
            Ok(row) => Ok(Some(row)),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        changes: UserChanges<'_>,
    ) -> anyhow::Result<Option<UserRow>> {
        use crate::schema::users::dsl::*;

        let row = diesel::update(users.filter(id.eq(user_id)))
            .set(&changes)
            .returning(UserRow::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        Ok(row)
    }

    pub async fn set_password_hash(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        new_hash: &str,
    ) -> anyhow::Result<usize> {
        use crate::schema::users::dsl::*;

        let count = diesel::update(users.filter(id.eq(user_id)))
            .set((password_hash.eq(new_hash), updated_at.eq(Utc::now())))
            .execute(conn)
            .await?;

        Ok(count)
    }

    pub async fn mark_verified(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
    ) -> anyhow::Result<Option<UserRow>> {
        use crate::schema::users::dsl::*;

        let row = diesel::update(users.filter(id.eq(user_id)))
            .set((is_verified.eq(true), updated_at.eq(Utc::now())))
            .returning(UserRow::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        Ok(row)
    }

    pub async fn delete(conn: &mut AsyncPgConnection, user_id: Uuid) -> anyhow::Result<usize> {
        use crate::schema::users::dsl::*;

        let count = diesel::delete(users.filter(id.eq(user_id)))
            .execute(conn)
            .await?;

        Ok(count)
    }
}

// One-time token database operations
pub mod user_tokens {
    use super::*;
    use crate::models::NewTokenRow;

    pub async fn delete_for_user(
        conn: &mut AsyncPgConnection,
        owner: Uuid,
        token_kind: Option<&str>,
    ) -> anyhow::Result<()> {
        use crate::schema::user_tokens::dsl::*;

        match token_kind {
            Some(k) => {
                diesel::delete(user_tokens.filter(user_id.eq(owner)).filter(kind.eq(k)))
                    .execute(conn)
                    .await?;
            }
            None => {
                diesel::delete(user_tokens.filter(user_id.eq(owner)))
                    .execute(conn)
                    .await?;
            }
        }

        Ok(())
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        new_token: NewTokenRow<'_>,
    ) -> anyhow::Result<()> {
        use crate::schema::user_tokens::dsl::*;

        diesel::insert_into(user_tokens)
            .values(&new_token)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Delete an unexpired token and return its owner in one statement.
    pub async fn take_owner(
        conn: &mut AsyncPgConnection,
        token_kind: &str,
        digest: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Uuid>> {
        use crate::schema::user_tokens::dsl::*;

        let owner = diesel::delete(
            user_tokens
                .filter(kind.eq(token_kind))
                .filter(token_hash.eq(digest))
                .filter(expires_at.gt(now)),
        )
        .returning(user_id)
        .get_result::<Uuid>(conn)
        .await
        .optional()?;

        Ok(owner)
    }
}

/// Postgres-backed implementation of the storage traits.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let mut conn = self.pool.get().await?;
        Ok(users::get_by_id(&mut conn, id).await?.map(User::from))
    }

    async fn find_credentials_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserCredentials>> {
        let mut conn = self.pool.get().await?;
        Ok(users::get_by_id(&mut conn, id)
            .await?
            .map(|row| row.into_credentials()))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> anyhow::Result<Option<UserCredentials>> {
        let mut conn = self.pool.get().await?;
        Ok(users::get_by_email(&mut conn, email)
            .await?
            .map(|row| row.into_credentials()))
    }

    async fn create(&self, input: NewUser) -> anyhow::Result<Option<User>> {
        let mut conn = self.pool.get().await?;
        let row = users::create(
            &mut conn,
            crate::models::NewUserRow {
                name: &input.name,
                email: &input.email,
                password_hash: &input.password_hash,
                bio: DEFAULT_BIO,
                role: input.role.as_str(),
            },
        )
        .await?;

        Ok(row.map(User::from))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &UpdateUserRequest,
    ) -> anyhow::Result<Option<User>> {
        let mut conn = self.pool.get().await?;
        let row = users::update(
            &mut conn,
            id,
            crate::models::UserChanges {
                name: changes.name.as_deref(),
                photo: changes.photo.as_deref(),
                bio: changes.bio.as_deref(),
                updated_at: Utc::now(),
            },
        )
        .await?;

        Ok(row.map(User::from))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let mut conn = self.pool.get().await?;
        Ok(users::set_password_hash(&mut conn, id, password_hash).await? > 0)
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let mut conn = self.pool.get().await?;
        Ok(users::mark_verified(&mut conn, id).await?.map(User::from))
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let mut conn = self.pool.get().await?;
        Ok(users::list_all(&mut conn)
            .await?
            .into_iter()
            .map(User::from)
            .collect())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut conn = self.pool.get().await?;
        Ok(users::delete(&mut conn, id).await? > 0)
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn issue(&self, token: NewToken) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await?;
        user_tokens::delete_for_user(&mut conn, token.user_id, Some(token.kind.as_str())).await?;
        user_tokens::create(
            &mut conn,
            crate::models::NewTokenRow {
                user_id: token.user_id,
                kind: token.kind.as_str(),
                token_hash: &token.token_hash,
                expires_at: token.expires_at,
            },
        )
        .await
    }

    async fn take_valid(
        &self,
        kind: TokenKind,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Uuid>> {
        let mut conn = self.pool.get().await?;
        user_tokens::take_owner(&mut conn, kind.as_str(), token_hash, now).await
    }

    async fn purge_user(&self, user_id: Uuid) -> anyhow::Result<()> {
        let mut conn = self.pool.get().await?;
        user_tokens::delete_for_user(&mut conn, user_id, None).await
    }
}
