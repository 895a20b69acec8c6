//! HTTP access to the account API.

use async_trait::async_trait;
use gloo_net::http::{Method, Request, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared_types::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
    ResetPasswordRequest, UpdateUserRequest, User,
};
use thiserror::Error;
use uuid::Uuid;
use web_sys::RequestCredentials;

use super::state::UserProfile;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Failure of a session operation. Each variant carries the message shown to
/// the user; an empty message means the caller's fallback text is used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Rejected on the client before any request was made.
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Network failure, unreadable response or any other server error.
    #[error("request failed: {0}")]
    RequestFailed(String),
}

impl SessionError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => SessionError::Unauthenticated(message),
            403 => SessionError::Forbidden(message),
            404 => SessionError::NotFound(message),
            _ => SessionError::RequestFailed(message),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SessionError::Invalid(msg)
            | SessionError::Unauthenticated(msg)
            | SessionError::Forbidden(msg)
            | SessionError::NotFound(msg)
            | SessionError::RequestFailed(msg) => msg,
        }
    }

    /// The message to show, or `fallback` when there is none.
    pub fn user_message(&self, fallback: &str) -> String {
        match self.message() {
            "" => fallback.to_string(),
            msg => msg.to_string(),
        }
    }
}

/// One method per account endpoint.
#[async_trait(?Send)]
pub trait SessionApi {
    async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError>;
    async fn login(&self, request: &LoginRequest) -> Result<User, SessionError>;
    async fn login_status(&self) -> Result<bool, SessionError>;
    async fn logout(&self) -> Result<MessageResponse, SessionError>;
    async fn get_user(&self) -> Result<UserProfile, SessionError>;
    async fn update_user(&self, changes: &UpdateUserRequest) -> Result<UserProfile, SessionError>;
    async fn send_verification_email(&self) -> Result<MessageResponse, SessionError>;
    async fn verify_user(&self, token: &str) -> Result<MessageResponse, SessionError>;
    async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, SessionError>;
    async fn reset_password(
        &self,
        token: &str,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, SessionError>;
    async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<MessageResponse, SessionError>;
    async fn list_users(&self) -> Result<Vec<User>, SessionError>;
    async fn delete_user(&self, id: Uuid) -> Result<MessageResponse, SessionError>;
}

/// `SessionApi` over `fetch`. Every request includes credentials so the
/// session cookie set by the server travels with it.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL baked in at build time through `TASKFYER_API_URL`.
    pub fn from_env() -> Self {
        Self::new(option_env!("TASKFYER_API_URL").unwrap_or(DEFAULT_API_URL))
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        RequestBuilder::new(&format!("{}{}", self.base_url, path))
            .method(method)
            .credentials(RequestCredentials::Include)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, SessionError> {
        execute(self.builder(method, path).build()).await
    }

    async fn call_with<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, SessionError> {
        execute(self.builder(method, path).json(body)).await
    }
}

async fn execute<T: DeserializeOwned>(
    request: Result<Request, gloo_net::Error>,
) -> Result<T, SessionError> {
    let request = request.map_err(|e| {
        tracing::warn!("Failed to build request: {}", e);
        SessionError::RequestFailed(String::new())
    })?;

    let response = request.send().await.map_err(|e| {
        tracing::warn!("Request failed: {}", e);
        SessionError::RequestFailed(String::new())
    })?;

    if !response.ok() {
        let status = response.status();
        let message = match response.json::<MessageResponse>().await {
            Ok(body) => body.message,
            Err(_) => String::new(),
        };
        return Err(SessionError::from_status(status, message));
    }

    response.json::<T>().await.map_err(|e| {
        tracing::warn!("Failed to parse response: {}", e);
        SessionError::RequestFailed(String::new())
    })
}

#[async_trait(?Send)]
impl SessionApi for HttpSessionApi {
    async fn register(&self, request: &RegisterRequest) -> Result<User, SessionError> {
        self.call_with(Method::POST, "/register", request).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<User, SessionError> {
        self.call_with(Method::POST, "/login", request).await
    }

    async fn login_status(&self) -> Result<bool, SessionError> {
        self.call(Method::GET, "/login-status").await
    }

    async fn logout(&self) -> Result<MessageResponse, SessionError> {
        self.call(Method::GET, "/logout").await
    }

    async fn get_user(&self) -> Result<UserProfile, SessionError> {
        self.call(Method::GET, "/user").await
    }

    async fn update_user(&self, changes: &UpdateUserRequest) -> Result<UserProfile, SessionError> {
        self.call_with(Method::PATCH, "/user", changes).await
    }

    async fn send_verification_email(&self) -> Result<MessageResponse, SessionError> {
        self.call(Method::POST, "/verify-email").await
    }

    async fn verify_user(&self, token: &str) -> Result<MessageResponse, SessionError> {
        self.call(Method::POST, &format!("/verify-user/{}", token))
            .await
    }

    async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<MessageResponse, SessionError> {
        self.call_with(Method::POST, "/forgot-password", request)
            .await
    }

    async fn reset_password(
        &self,
        token: &str,
        request: &ResetPasswordRequest,
    ) -> Result<MessageResponse, SessionError> {
        self.call_with(Method::POST, &format!("/reset-password/{}", token), request)
            .await
    }

    async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<MessageResponse, SessionError> {
        self.call_with(Method::PATCH, "/change-password", request)
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>, SessionError> {
        self.call(Method::GET, "/admin/users").await
    }

    async fn delete_user(&self, id: Uuid) -> Result<MessageResponse, SessionError> {
        self.call(Method::DELETE, &format!("/admin/users/{}", id))
            .await
    }
}
