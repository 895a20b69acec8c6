//! Email verification and password recovery.
//!
//! Both flows mail a one-time link to the client app, which posts the token
//! back here.

use axum::{extract::State, Json};
use chrono::Utc;
use shared_types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, User};

use crate::auth::{hash_password, one_time, CurrentUser, TokenKind};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::mailer::{password_reset_email, verification_email};
use crate::repository::NewToken;
use crate::AppState;

use super::{check_password_length, normalize_email, USER_NOT_FOUND};

const ALREADY_VERIFIED: &str = "User is already verified";
const EMAIL_SENT: &str = "Email sent";

/// Issue a token of `kind` for the user and return the plain value.
async fn issue_token(state: &AppState, user: &User, kind: TokenKind) -> ApiResult<String> {
    let (plain, token_hash) = one_time::generate();
    state
        .tokens
        .issue(NewToken {
            user_id: user.id,
            kind,
            token_hash,
            expires_at: Utc::now() + kind.lifetime(),
        })
        .await?;

    Ok(plain)
}

pub async fn send_verification_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<MessageResponse>> {
    if user.is_verified {
        return Err(ApiError::bad_request(ALREADY_VERIFIED));
    }

    let token = issue_token(&state, &user, TokenKind::EmailVerification).await?;
    let link = format!("{}/verify-email/{}", state.client_url, token);
    state
        .mailer
        .send(verification_email(&user.email, &user.name, &link))
        .await?;

    tracing::info!(user_id = %user.id, "Verification email sent");
    Ok(Json(MessageResponse::new(EMAIL_SENT)))
}

pub async fn verify_user(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = state
        .tokens
        .take_valid(
            TokenKind::EmailVerification,
            &one_time::digest(&token),
            Utc::now(),
        )
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired verification token"))?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    if user.is_verified {
        return Err(ApiError::bad_request(ALREADY_VERIFIED));
    }

    state
        .users
        .mark_verified(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    tracing::info!(user_id = %user.id, "User verified");
    Ok(Json(MessageResponse::new("User verified")))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    let user = state
        .users
        .find_credentials_by_email(&email)
        .await?
        .map(|credentials| credentials.user)
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    let token = issue_token(&state, &user, TokenKind::PasswordReset).await?;
    let link = format!("{}/reset-password/{}", state.client_url, token);
    state
        .mailer
        .send(password_reset_email(&user.email, &user.name, &link))
        .await?;

    tracing::info!(user_id = %user.id, "Password reset email sent");
    Ok(Json(MessageResponse::new(EMAIL_SENT)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }
    check_password_length(&payload.password)?;

    let user_id = state
        .tokens
        .take_valid(
            TokenKind::PasswordReset,
            &one_time::digest(&token),
            Utc::now(),
        )
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    let password_hash = hash_password(&payload.password, state.auth_config.bcrypt_cost).await?;
    if !state.users.set_password_hash(user_id, &password_hash).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }

    tracing::info!(%user_id, "Password reset");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}
