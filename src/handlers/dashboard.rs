use axum::{extract::State, response::IntoResponse, Extension, Json};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use http::StatusCode;
use serde_json::{json, Value};

use crate::{
    handlers::{districts::normalize_districts, leaderboard::normalize_leaderboard},
    models::{error::Error, session::SessionKey, user::User},
    utils::{cookies::session_token, state::AppState},
};

/// Everything the signed-in dashboard needs in one call: the leaderboard,
/// districts, and the viewer's own agent stats when they can be found.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, Error> {
    let access_token = session_token(&state, &jar, SessionKey::AccessToken);

    let (leaderboard, districts) = tokio::join!(
        state
            .upstream
            .get_json("/leaderboard", &[], None, "Failed to fetch leaderboard"),
        state
            .upstream
            .get_json("/districts", &[], None, "Failed to fetch districts"),
    );
    let leaderboard = normalize_leaderboard(leaderboard?);
    let districts = match districts {
        Ok(raw) => normalize_districts(&raw, Utc::now()),
        Err(e) => {
            tracing::warn!(error = %e, "districts unavailable for dashboard");
            Value::Null
        }
    };

    let mut agent_stats = Value::Null;
    if let (Some(agent_id), Some(token)) = (find_agent_id(&leaderboard, &user.name), access_token) {
        let path = format!("/me/{}", urlencoding::encode(&agent_id));
        match state
            .upstream
            .get_json(&path, &[], Some(&token), "Failed to fetch agent stats")
            .await
        {
            Ok(stats) => agent_stats = stats,
            Err(e) => tracing::debug!(error = %e, "own agent stats unavailable"),
        }
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "user": user,
            "leaderboard": leaderboard,
            "districts": districts,
            "agent_stats": agent_stats,
        })),
    ))
}

/// The leader whose `name` (or, when that is blank, `agent_name`) matches
/// case-insensitively. Numeric agent ids are returned as strings.
pub fn find_agent_id(leaderboard: &Value, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let name = name.to_lowercase();
    let display_name = |agent: &Value, key: &str| {
        agent
            .get(key)
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_lowercase)
    };

    let agent = leaderboard
        .get("leaders")?
        .as_array()?
        .iter()
        .find(|agent| {
            display_name(*agent, "name")
                .or_else(|| display_name(*agent, "agent_name"))
                .is_some_and(|n| n == name)
        })?;

    match agent.get("agent_id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}
