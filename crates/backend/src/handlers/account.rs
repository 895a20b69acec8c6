use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared_types::{
    ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, Role,
    UpdateUserRequest, User,
};

use crate::auth::{
    build_auth_cookie, clear_auth_cookie, create_token, extract_token_from_cookie, gate,
    hash_password, validate_token, verify_password, CurrentUser,
};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::repository::NewUser;
use crate::AppState;

use super::{check_password_length, normalize_email, ALL_FIELDS_REQUIRED, USER_NOT_FOUND};

const USER_EXISTS: &str = "User already exists";

/// Respond with the user and a fresh session cookie.
fn session_response(state: &AppState, status: StatusCode, user: User) -> ApiResult<Response> {
    let token =
        create_token(&state.auth_config, user.id).context("failed to sign session token")?;
    let cookie = build_auth_cookie(&state.auth_config, &token);

    Ok((status, [(header::SET_COOKIE, cookie)], Json(user)).into_response())
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<Response> {
    let name = payload.name.trim();
    let email = normalize_email(&payload.email);

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(ALL_FIELDS_REQUIRED));
    }
    if !validator::validate_email(email.as_str()) {
        return Err(ApiError::bad_request("Please enter a valid email"));
    }
    check_password_length(&payload.password)?;

    if state.users.find_credentials_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request(USER_EXISTS));
    }

    let password_hash = hash_password(&payload.password, state.auth_config.bcrypt_cost).await?;
    let user = state
        .users
        .create(NewUser {
            name: name.to_string(),
            email,
            password_hash,
            role: Role::Standard,
        })
        .await?
        .ok_or_else(|| ApiError::bad_request(USER_EXISTS))?;

    tracing::info!(user_id = %user.id, "User registered");
    session_response(&state, StatusCode::CREATED, user)
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(ALL_FIELDS_REQUIRED));
    }

    let credentials = state
        .users
        .find_credentials_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found, sign up!"))?;

    if !verify_password(&payload.password, &credentials.password_hash).await? {
        tracing::debug!(user_id = %credentials.user.id, "Login rejected: wrong password");
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    tracing::info!(user_id = %credentials.user.id, "User logged in");
    session_response(&state, StatusCode::OK, credentials.user)
}

/// Whether the session cookie carries a valid token. Does not look the user up.
pub async fn login_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<bool>> {
    let token = extract_token_from_cookie(&headers, &state.auth_config.cookie_name)
        .ok_or_else(|| ApiError::unauthenticated(gate::PLEASE_LOGIN))?;

    Ok(Json(validate_token(&state.auth_config, &token).is_ok()))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_auth_cookie(&state.auth_config))],
        Json(MessageResponse::new("User logged out")),
    )
}

pub async fn get_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Partial profile update. Absent or empty fields keep their current value.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let keep_if_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let changes = UpdateUserRequest {
        name: keep_if_blank(payload.name),
        photo: keep_if_blank(payload.photo),
        bio: keep_if_blank(payload.bio),
    };

    if changes.is_empty() {
        return Ok(Json(user));
    }

    let updated = state
        .users
        .update_profile(user.id, &changes)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    Ok(Json(updated))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::bad_request(ALL_FIELDS_REQUIRED));
    }
    check_password_length(&payload.new_password)?;

    let credentials = state
        .users
        .find_credentials_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    if !verify_password(&payload.current_password, &credentials.password_hash).await? {
        return Err(ApiError::bad_request("Invalid password!"));
    }

    let password_hash =
        hash_password(&payload.new_password, state.auth_config.bcrypt_cost).await?;
    if !state.users.set_password_hash(user.id, &password_hash).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{TestApp, PASSWORD};
    use super::*;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_sets_cookie_and_returns_user() {
        let app = TestApp::new();
        let res = app
            .request(
                Method::POST,
                "/api/v1/register",
                None,
                Some(json!({"name": "Ada", "email": "Ada@Example.com", "password": "123456"})),
            )
            .await;

        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["role"], "user");
        assert_eq!(res.body["isVerified"], false);
        assert!(res.body.get("password").is_none());
        assert!(res.session_cookie().unwrap().starts_with("token="));

        let res = app
            .request(
                Method::POST,
                "/api/v1/register",
                None,
                Some(json!({"name": "Ada", "email": "ada@example.com", "password": "123456"})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.message(), "User already exists");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let app = TestApp::new();
        let cases = [
            (json!({"email": "a@example.com", "password": "123456"}), ALL_FIELDS_REQUIRED),
            (
                json!({"name": "A", "email": "not-an-email", "password": "123456"}),
                "Please enter a valid email",
            ),
            (
                json!({"name": "A", "email": "a@example.com", "password": "12345"}),
                super::super::PASSWORD_TOO_SHORT,
            ),
        ];

        for (body, expected) in cases {
            let res = app
                .request(Method::POST, "/api/v1/register", None, Some(body))
                .await;
            assert_eq!(res.status, StatusCode::BAD_REQUEST);
            assert_eq!(res.message(), expected);
        }
        assert!(app.state.users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let app = TestApp::new();
        app.seed_user("grace@example.com", Role::Standard, false).await;

        let res = app
            .request(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({"email": "grace@example.com", "password": PASSWORD})),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["email"], "grace@example.com");
        let cookie = res.session_cookie().unwrap();
        assert!(cookie.starts_with("token="));

        // The issued cookie opens protected routes.
        let res = app
            .request(Method::GET, "/api/v1/user", Some(&cookie), None)
            .await;
        assert_eq!(res.status, StatusCode::OK);

        let res = app
            .request(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({"email": "grace@example.com", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.message(), "Invalid credentials");
        assert!(res.session_cookie().is_none());

        let res = app
            .request(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({"email": "nobody@example.com", "password": PASSWORD})),
            )
            .await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.message(), "User not found, sign up!");
    }

    #[tokio::test]
    async fn test_login_status() {
        let app = TestApp::new();
        let (_, cookie) = app.seed_user("grace@example.com", Role::Standard, false).await;

        let res = app
            .request(Method::GET, "/api/v1/login-status", None, None)
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.message(), gate::PLEASE_LOGIN);

        let res = app
            .request(Method::GET, "/api/v1/login-status", Some(&cookie), None)
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, json!(true));

        let res = app
            .request(Method::GET, "/api/v1/login-status", Some("token=garbage"), None)
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, json!(false));
    }

    #[tokio::test]
    async fn test_logout_expires_cookie() {
        let app = TestApp::new();
        let res = app.request(Method::GET, "/api/v1/logout", None, None).await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.message(), "User logged out");
        let set_cookie = res.headers[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
        assert!(set_cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_protected_route_rejections() {
        let app = TestApp::new();

        let res = app.request(Method::GET, "/api/v1/user", None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.message(), gate::PLEASE_LOGIN);

        let res = app
            .request(Method::GET, "/api/v1/user", Some("token=not.a.jwt"), None)
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.message(), gate::TOKEN_FAILED);

        let (user, cookie) = app.seed_user("gone@example.com", Role::Admin, true).await;
        app.state.users.delete(user.id).await.unwrap();
        let res = app
            .request(Method::GET, "/api/v1/user", Some(&cookie), None)
            .await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.message(), gate::USER_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_user_is_partial() {
        let app = TestApp::new();
        let (user, cookie) = app.seed_user("grace@example.com", Role::Standard, false).await;

        let res = app
            .request(
                Method::PATCH,
                "/api/v1/user",
                Some(&cookie),
                Some(json!({"bio": "Wrote the first compiler", "name": ""})),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["bio"], "Wrote the first compiler");
        assert_eq!(res.body["name"], user.name);
        assert_eq!(res.body["email"], user.email);
    }

    #[tokio::test]
    async fn test_change_password_requires_verified_email() {
        let app = TestApp::new();
        let (user, cookie) = app.seed_user("grace@example.com", Role::Standard, false).await;
        let body = json!({"currentPassword": PASSWORD, "newPassword": "brand-new-pass"});

        let res = app
            .request(
                Method::PATCH,
                "/api/v1/change-password",
                Some(&cookie),
                Some(body.clone()),
            )
            .await;
        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert_eq!(res.message(), gate::VERIFY_EMAIL);

        app.state.users.mark_verified(user.id).await.unwrap();
        let res = app
            .request(
                Method::PATCH,
                "/api/v1/change-password",
                Some(&cookie),
                Some(body),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.message(), "Password changed successfully");

        let res = app
            .request(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({"email": "grace@example.com", "password": "brand-new-pass"})),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_change_password_rejects_wrong_current() {
        let app = TestApp::new();
        let (_, cookie) = app.seed_user("grace@example.com", Role::Standard, true).await;

        let res = app
            .request(
                Method::PATCH,
                "/api/v1/change-password",
                Some(&cookie),
                Some(json!({"currentPassword": "nope-nope", "newPassword": "brand-new-pass"})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.message(), "Invalid password!");

        let res = app
            .request(
                Method::PATCH,
                "/api/v1/change-password",
                Some(&cookie),
                Some(json!({"currentPassword": PASSWORD})),
            )
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.message(), ALL_FIELDS_REQUIRED);
    }

    #[tokio::test]
    async fn test_unreadable_bodies_answer_with_a_message() {
        let app = TestApp::new();
        let post = |content_type: Option<&'static str>, body: &'static str| {
            let mut builder = axum::http::Request::builder()
                .method(Method::POST)
                .uri("/api/v1/login");
            if let Some(content_type) = content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            builder.body(axum::body::Body::from(body)).unwrap()
        };

        let res = app
            .send(post(Some("application/json"), r#"{"email": "ada@"#))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.message(), "Request body is not valid JSON");

        let res = app
            .send(post(None, r#"{"email":"ada@example.com","password":"123456"}"#))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            res.message(),
            "Request body must be JSON (Content-Type: application/json)"
        );

        let res = app
            .send(post(Some("application/json"), r#"{"email": 42}"#))
            .await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.message(), "Request body has the wrong shape");
    }

    #[tokio::test]
    async fn test_concurrent_registrations_with_one_email() {
        let app = TestApp::new();
        let register = || {
            app.request(
                Method::POST,
                "/api/v1/register",
                None,
                Some(json!({"name": "Ada", "email": "ada@example.com", "password": "123456"})),
            )
        };

        let (a, b) = tokio::join!(register(), register());
        let mut statuses = [a.status, b.status];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

        let loser = if a.status == StatusCode::BAD_REQUEST { a } else { b };
        assert_eq!(loser.message(), USER_EXISTS);
        assert_eq!(app.state.users.list().await.unwrap().len(), 1);
    }
}
