//! Taskfyer account API: registration, login, email verification, password
//! recovery and user administration behind a cookie-based session gate.

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod memory;
mod models;
pub mod repository;
pub mod routes;
mod schema;

pub use routes::create_app;

use auth::AuthConfig;
use mailer::{LogMailer, Mailer};
use memory::MemoryStore;
use repository::{TokenStore, UserStore};

/// Shared state handed to every handler and to the session gate.
#[derive(Clone)]
pub struct AppState {
    pub auth_config: AuthConfig,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub mailer: Arc<dyn Mailer>,
    /// Base URL of the web client, without a trailing slash.
    pub client_url: String,
}

impl AppState {
    pub fn new<S>(
        auth_config: AuthConfig,
        store: Arc<S>,
        mailer: Arc<dyn Mailer>,
        client_url: &str,
    ) -> Self
    where
        S: UserStore + TokenStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let tokens: Arc<dyn TokenStore> = store;
        Self {
            auth_config,
            users,
            tokens,
            mailer,
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    /// State backed by a fresh in-memory store and the logging mailer.
    pub fn in_memory(auth_config: AuthConfig, client_url: &str) -> Self {
        Self::new(
            auth_config,
            Arc::new(MemoryStore::new()),
            Arc::new(LogMailer),
            client_url,
        )
    }
}
