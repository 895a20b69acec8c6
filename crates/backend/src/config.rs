use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::auth::AuthConfig;
use crate::db::{establish_connection_pool, PgStore};
use crate::mailer::LogMailer;
use crate::memory::MemoryStore;
use crate::AppState;

/// Server configuration, read from flags or the environment (`.env` is
/// loaded first by `main`).
#[derive(Debug, Clone, Parser)]
#[command(name = "taskfyer-backend")]
#[command(about = "Taskfyer account API server")]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Secret used to sign session tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Session lifetime in days; also the cookie's Max-Age.
    #[arg(long, env = "JWT_EXPIRES_DAYS", default_value_t = 30)]
    pub jwt_expires_days: i64,

    /// Public URL of the web client, used in emailed links.
    #[arg(long, env = "CLIENT_URL", default_value = "http://localhost:3000")]
    pub client_url: String,

    /// Send the session cookie as `Secure; SameSite=None` (HTTPS deployments
    /// where client and API live on different sites).
    #[arg(long, env = "COOKIE_SECURE")]
    pub cookie_secure: bool,

    /// Postgres connection string. Without it accounts live in memory.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Connect to Postgres over TLS.
    #[arg(long, env = "DATABASE_TLS")]
    pub database_tls: bool,

    /// bcrypt work factor for password hashes.
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Comma-separated origins allowed to make credentialed requests.
    /// Defaults to the client URL.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET cannot be empty");
        }
        if self.jwt_expires_days <= 0 {
            anyhow::bail!("JWT_EXPIRES_DAYS must be positive");
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between 4 and 31");
        }
        Ok(())
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_duration_days: self.jwt_expires_days,
            cookie_name: shared_types::SESSION_COOKIE.to_string(),
            secure_cookies: self.cookie_secure,
            bcrypt_cost: self.bcrypt_cost,
        }
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.is_empty() {
            vec![self.client_url.trim_end_matches('/').to_string()]
        } else {
            origins
        }
    }

    /// Build the shared application state, choosing the store from
    /// `database_url`.
    pub fn build_state(&self) -> anyhow::Result<AppState> {
        self.validate()?;
        let auth_config = self.auth_config();
        let mailer = Arc::new(LogMailer);

        let state = match &self.database_url {
            Some(url) => {
                let pool = establish_connection_pool(url, self.database_tls)
                    .context("failed to set up database pool")?;
                tracing::info!("Using Postgres account store");
                AppState::new(
                    auth_config,
                    Arc::new(PgStore::new(pool)),
                    mailer,
                    &self.client_url,
                )
            }
            None => {
                tracing::warn!(
                    "DATABASE_URL not set, accounts are kept in memory and lost on restart"
                );
                AppState::new(
                    auth_config,
                    Arc::new(MemoryStore::new()),
                    mailer,
                    &self.client_url,
                )
            }
        };

        Ok(state)
    }
}
