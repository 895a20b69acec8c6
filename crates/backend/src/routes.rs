use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::{enforce, Guard, Policy};
use crate::handlers::{account, admin, verification};
use crate::AppState;

/// Build the application router with all account routes under `/api/v1`.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Account routes, grouped by the policy guarding them.
fn api_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/login-status", get(account::login_status))
        .route("/logout", get(account::logout))
        .route("/verify-user/:token", post(verification::verify_user))
        .route("/forgot-password", post(verification::forgot_password))
        .route("/reset-password/:token", post(verification::reset_password));

    let authenticated = Router::new()
        .route("/user", get(account::get_user).patch(account::update_user))
        .route("/verify-email", post(verification::send_verification_email))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), Policy::AUTHENTICATED),
            enforce,
        ));

    let verified = Router::new()
        .route("/change-password", patch(account::change_password))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), Policy::VERIFIED),
            enforce,
        ));

    let creators = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), Policy::CREATOR),
            enforce,
        ));

    let admins = Router::new()
        .route("/admin/users/:id", delete(admin::delete_user))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(state.clone(), Policy::ADMIN),
            enforce,
        ));

    public
        .merge(authenticated)
        .merge(verified)
        .merge(creators)
        .merge(admins)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
