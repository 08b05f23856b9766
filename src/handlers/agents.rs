use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::{extract::PrivateCookieJar, TypedHeader};
use headers::{authorization::Bearer, Authorization};
use http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    models::{error::Error, session::SessionKey},
    utils::{cookies::forwarded_bearer, state::AppState},
};

/// Upper bound on synthetic ids tried by the by-name lookup.
pub const MAX_NAME_PROBES: usize = 10;

pub async fn get_agent(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(agent_id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let bearer = forwarded_bearer(&state, &jar, auth.as_ref().map(|h| &h.0), SessionKey::AccessToken);
    let body = state
        .upstream
        .get_json(&agent_path(&agent_id), &[], bearer.as_deref(), "Failed to fetch agent stats")
        .await?;
    Ok((StatusCode::OK, Json(body)))
}

#[derive(Deserialize)]
pub struct ByNameQuery {
    name: Option<String>,
}

/// Finds an agent by display name by trying `{slug}_001` .. `{slug}_010`
/// in order and returning the first one upstream answers with a 200.
pub async fn get_agent_by_name(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Query(params): Query<ByNameQuery>,
) -> Result<impl IntoResponse, Error> {
    let candidates = agent_id_candidates(params.name.as_deref().unwrap_or_default());
    if candidates.is_empty() {
        return Err(Error::new(StatusCode::BAD_REQUEST, "name is required"));
    }

    let bearer = forwarded_bearer(&state, &jar, auth.as_ref().map(|h| &h.0), SessionKey::AccessToken);
    for agent_id in &candidates {
        if let Some(body) = state
            .upstream
            .probe(&agent_path(agent_id), bearer.as_deref())
            .await
        {
            tracing::debug!(agent_id, "agent found by name");
            return Ok((StatusCode::OK, Json(body)));
        }
    }

    Err(Error::new(StatusCode::NOT_FOUND, "Agent not found"))
}

/// `"Jane Doe"` → `jane_doe_001` .. `jane_doe_010`. Blank names yield nothing.
pub fn agent_id_candidates(name: &str) -> Vec<String> {
    let slug = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    if slug.is_empty() {
        return Vec::new();
    }
    (1..=MAX_NAME_PROBES)
        .map(|n| format!("{slug}_{n:03}"))
        .collect()
}

fn agent_path(agent_id: &str) -> String {
    format!("/me/{}", urlencoding::encode(agent_id))
}

/// Reporting window for agent history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Yesterday,
    SevenDays,
    ThirtyDays,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Yesterday => "yesterday",
            Period::SevenDays => "7d",
            Period::ThirtyDays => "30d",
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yesterday" => Ok(Period::Yesterday),
            "7d" => Ok(Period::SevenDays),
            "30d" => Ok(Period::ThirtyDays),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    period: Option<String>,
}

pub async fn get_agent_history(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(agent_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<impl IntoResponse, Error> {
    let period = match params.period.as_deref() {
        None | Some("") => Period::SevenDays,
        Some(raw) => raw
            .parse::<Period>()
            .map_err(|e| Error::new(StatusCode::BAD_REQUEST, &e))?,
    };

    let bearer = forwarded_bearer(&state, &jar, auth.as_ref().map(|h| &h.0), SessionKey::AccessToken);
    let path = format!("/history/agent/{}", urlencoding::encode(&agent_id));
    let raw = state
        .upstream
        .get_json(
            &path,
            &[("period", period.as_str())],
            bearer.as_deref(),
            "Failed to fetch agent history",
        )
        .await?;
    Ok((StatusCode::OK, Json(normalize_history(raw))))
}

pub fn normalize_history(mut raw: Value) -> Value {
    if !raw.is_object() {
        raw = json!({});
    }
    if let Value::Object(body) = &mut raw {
        if !body.get("summary").is_some_and(Value::is_object) {
            body.insert("summary".into(), json!({}));
        }
        if !body.get("deltas").is_some_and(Value::is_object) {
            body.insert("deltas".into(), json!({}));
        }
        if !body.get("series").is_some_and(Value::is_array) {
            body.insert("series".into(), json!([]));
        }
    }
    raw
}
