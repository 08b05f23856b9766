pub mod api;
pub mod auth;

use axum::{
    middleware::from_fn_with_state, response::IntoResponse, routing::get, Json, Router,
};
use http::StatusCode;
use serde_json::json;
use std::{error::Error, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

pub use api::api_routes;
pub use auth::auth_routes;

use crate::{
    handlers::{dashboard::get_dashboard, middleware::auth_middleware},
    utils::{config::Config, session_store::spawn_sweeper, state::AppState},
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let level = match log_level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let filter = filter::Targets::new()
        .with_target("tower_http::trace::on_response", Level::TRACE)
        .with_target("tower_http::trace::on_request", Level::TRACE)
        .with_target("tower_http::trace::make_span", Level::DEBUG)
        .with_target("axum::rejection", Level::TRACE)
        .with_target(env!("CARGO_CRATE_NAME"), level)
        .with_default(Level::INFO);

    let tracing_layer = tracing_subscriber::fmt::layer();

    Registry::default().with(tracing_layer).with(filter).init();
}

pub async fn make_app(config: Config) -> Result<Router, Box<dyn Error>> {
    info!("Initializing application...");
    if config.api_base_url.is_none() {
        tracing::warn!("API_BASE_URL not set, proxy routes will answer 500");
    }
    if config.idp_endpoint().is_none() {
        tracing::warn!("COGNITO_REGION not set, server-side sign-in is disabled");
    }

    let state = AppState::new(config);
    spawn_sweeper(&state.sessions, SESSION_SWEEP_INTERVAL);
    info!("External clients initialized successfully");

    let app = build_router(state);
    info!("Application initialized successfully");

    Ok(app)
}

pub fn build_router(state: AppState) -> Router {
    let dashboard = Router::new()
        .route("/", get(get_dashboard))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
        .nest("/dashboard", dashboard)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"message": "ok"}))).into_response()
}
