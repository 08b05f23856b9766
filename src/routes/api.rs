use axum::{routing::get, Router};

use crate::{
    handlers::{
        agents::{get_agent, get_agent_by_name, get_agent_history},
        big_movers::get_big_movers,
        districts::get_districts,
        leaderboard::get_leaderboard,
    },
    routes::auth::api_auth_routes,
    utils::state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(get_leaderboard))
        .route("/districts", get(get_districts))
        .route("/big-movers", get(get_big_movers))
        .route("/me/by-name", get(get_agent_by_name))
        .route("/me/{agent_id}", get(get_agent))
        .route("/history/agent/{agent_id}", get(get_agent_history))
        .nest("/auth", api_auth_routes())
}
