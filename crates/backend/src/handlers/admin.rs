use axum::{extract::State, Json};
use shared_types::{MessageResponse, User};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiPath;
use crate::AppState;

use super::USER_NOT_FOUND;

/// All users, newest first.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = state.users.list().await?;
    if users.is_empty() {
        return Err(ApiError::not_found("No users found"));
    }

    Ok(Json(users))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.users.delete(user_id).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    state.tokens.purge_user(user_id).await?;

    tracing::info!(%user_id, admin_id = %admin.id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
