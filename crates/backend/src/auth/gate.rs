//! Session gate for protected routes.
//!
//! Every protected route group is layered with exactly one [`Policy`]. The
//! gate first resolves the caller from the session cookie (credential check,
//! then identity lookup) and then runs the policy's checks in the order they
//! are declared; the first failing check decides the response.
//!
//! ```ignore
//! Router::new()
//!     .route("/admin/users/:id", delete(handlers::admin::delete_user))
//!     .route_layer(middleware::from_fn_with_state(
//!         Guard::new(state.clone(), Policy::ADMIN),
//!         gate::enforce,
//!     ))
//! ```

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use shared_types::{Role, User};

use crate::error::ApiError;
use crate::AppState;

use super::{cookies::extract_token_from_cookie, jwt};

pub const PLEASE_LOGIN: &str = "Not authorized, please login!";
pub const TOKEN_FAILED: &str = "Not authorized, token failed!";
pub const USER_NOT_FOUND: &str = "User not found!";
pub const ADMINS_ONLY: &str = "Only admins can do this!";
pub const CREATORS_ONLY: &str = "Only creators can do this!";
pub const VERIFY_EMAIL: &str = "Please verify your email address!";

/// A single authorization predicate over the resolved user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Role must be admin.
    Admin,
    /// Role must be creator or admin.
    CreatorOrAdmin,
    /// Email address must be verified.
    Verified,
}

impl Check {
    pub fn evaluate(self, user: &User) -> Result<(), ApiError> {
        match self {
            Check::Admin => match user.role {
                Role::Admin => Ok(()),
                Role::Creator | Role::Standard => Err(ApiError::forbidden(ADMINS_ONLY)),
            },
            Check::CreatorOrAdmin => match user.role {
                Role::Creator | Role::Admin => Ok(()),
                Role::Standard => Err(ApiError::forbidden(CREATORS_ONLY)),
            },
            Check::Verified => {
                if user.is_verified {
                    Ok(())
                } else {
                    Err(ApiError::forbidden(VERIFY_EMAIL))
                }
            }
        }
    }
}

/// Ordered list of checks a route group requires after identity resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    checks: &'static [Check],
}

impl Policy {
    /// Any signed-in user whose record still exists.
    pub const AUTHENTICATED: Policy = Policy::new(&[]);
    pub const VERIFIED: Policy = Policy::new(&[Check::Verified]);
    pub const CREATOR: Policy = Policy::new(&[Check::CreatorOrAdmin]);
    pub const ADMIN: Policy = Policy::new(&[Check::Admin]);

    pub const fn new(checks: &'static [Check]) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &'static [Check] {
        self.checks
    }

    pub fn authorize(&self, user: &User) -> Result<(), ApiError> {
        self.checks
            .iter()
            .try_for_each(|check| check.evaluate(user))
    }
}

/// Middleware state: the application state plus the route group's policy.
#[derive(Clone)]
pub struct Guard {
    state: AppState,
    policy: Policy,
}

impl Guard {
    pub fn new(state: AppState, policy: Policy) -> Self {
        Self { state, policy }
    }
}

/// The user resolved by the gate, available to handlers behind it.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated(PLEASE_LOGIN))
    }
}

/// Credential check and identity resolution.
///
/// Verification failures are logged here and never reach the caller.
pub async fn resolve_identity(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = extract_token_from_cookie(headers, &state.auth_config.cookie_name)
        .ok_or_else(|| ApiError::unauthenticated(PLEASE_LOGIN))?;

    let claims = jwt::validate_token(&state.auth_config, &token).map_err(|e| {
        tracing::warn!("Token verification failed: {}", e);
        ApiError::unauthenticated(TOKEN_FAILED)
    })?;

    state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
}

/// Middleware function enforcing a [`Guard`].
///
/// Use with `axum::middleware::from_fn_with_state` as a route layer.
pub async fn enforce(
    State(guard): State<Guard>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_identity(&guard.state, request.headers()).await?;

    if let Err(denied) = guard.policy.authorize(&user) {
        tracing::debug!(
            user_id = %user.id,
            role = %user.role,
            path = %request.uri().path(),
            "Request denied by gate"
        );
        return Err(denied);
    }

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
