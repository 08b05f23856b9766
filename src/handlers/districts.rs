use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::{extract::PrivateCookieJar, TypedHeader};
use chrono::{DateTime, SecondsFormat, Utc};
use headers::{authorization::Bearer, Authorization};
use http::StatusCode;
use serde_json::{json, Value};

use crate::{
    models::{error::Error, session::SessionKey},
    utils::{cookies::forwarded_bearer, state::AppState},
};

pub async fn get_districts(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, Error> {
    let bearer = forwarded_bearer(&state, &jar, auth.as_ref().map(|h| &h.0), SessionKey::AccessToken);
    let raw = state
        .upstream
        .get_json("/districts", &[], bearer.as_deref(), "Failed to fetch districts")
        .await?;
    Ok((StatusCode::OK, Json(normalize_districts(&raw, Utc::now()))))
}

/// Districts come either as `districts` or nested under `data.districts`.
pub fn normalize_districts(raw: &Value, now: DateTime<Utc>) -> Value {
    let districts = raw
        .get("districts")
        .filter(|v| v.is_array())
        .or_else(|| raw.pointer("/data/districts").filter(|v| v.is_array()))
        .cloned()
        .unwrap_or_else(|| json!([]));
    let total = districts.as_array().map_or(0, Vec::len);

    let as_of = raw
        .get("as_of")
        .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
        .cloned()
        .unwrap_or_else(|| json!(now.to_rfc3339_opts(SecondsFormat::Millis, true)));

    json!({
        "as_of": as_of,
        "include_historical": false,
        "historical_days": 0,
        "districts": districts,
        "total_districts": total,
    })
}
