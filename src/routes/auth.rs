use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::auth::{
        callback, credentials_login, implicit, login, logout, me, server_logout, session,
    },
    utils::state::AppState,
};

/// Browser-facing hosted UI flow.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/implicit", post(implicit))
        .route("/session", get(session))
        .route("/logout", get(logout))
}

/// JSON session endpoints used by the dashboard itself.
pub fn api_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(credentials_login))
        .route("/me", get(me))
        .route("/logout", post(server_logout))
}
