use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::{extract::PrivateCookieJar, TypedHeader};
use headers::{authorization::Bearer, Authorization};
use http::StatusCode;
use serde_json::{json, Map, Value};

use crate::{
    models::{error::Error, session::SessionKey},
    utils::{cookies::forwarded_bearer, state::AppState},
};

pub async fn get_leaderboard(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, Error> {
    let bearer = forwarded_bearer(&state, &jar, auth.as_ref().map(|h| &h.0), SessionKey::AccessToken);
    let raw = state
        .upstream
        .get_json("/leaderboard", &[], bearer.as_deref(), "Failed to fetch leaderboard")
        .await?;
    Ok((StatusCode::OK, Json(normalize_leaderboard(raw))))
}

/// Shapes the upstream leaderboard for the dashboard.
///
/// `agents` becomes `leaders` (each carrying `weekly_sales`) unless
/// `leaders` is already present, `total_agents` falls back to the number of
/// leaders, and a summary is derived from the leaders when upstream sends none.
pub fn normalize_leaderboard(raw: Value) -> Value {
    let mut body = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let leaders: Vec<Value> = match (body.get("leaders"), body.get("agents")) {
        (Some(Value::Array(leaders)), _) => leaders.clone(),
        (_, Some(Value::Array(agents))) => agents.iter().map(with_weekly_sales).collect(),
        _ => Vec::new(),
    };

    if !body.get("total_agents").is_some_and(Value::is_number) {
        body.insert("total_agents".into(), json!(leaders.len()));
    }
    if !body.get("summary").is_some_and(Value::is_object) {
        body.insert("summary".into(), derive_summary(&leaders));
    }
    body.insert("leaders".into(), Value::Array(leaders));
    Value::Object(body)
}

fn with_weekly_sales(agent: &Value) -> Value {
    let mut agent = agent.clone();
    if let Value::Object(fields) = &mut agent {
        let sales = fields
            .get("sales")
            .filter(|v| v.as_f64().is_some_and(|n| n != 0.0))
            .cloned()
            .unwrap_or(json!(0));
        fields.insert("weekly_sales".into(), sales);
    }
    agent
}

fn number(agent: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| agent.get(*key).and_then(Value::as_f64))
}

/// Totals across the leaders. Conversion rate is sales per call as a
/// percentage, rounded to one decimal; change fields are zero since no
/// previous period is available.
fn derive_summary(leaders: &[Value]) -> Value {
    let mut total_calls = 0.0;
    let mut total_sales = 0.0;
    let mut active_agents = 0u64;
    let mut talk_time_sum = 0.0;
    let mut talk_time_count = 0u64;

    for agent in leaders {
        let calls = number(agent, &["calls", "calls_answered"]).unwrap_or(0.0);
        let sales = number(agent, &["sales", "total_sales"]).unwrap_or(0.0);
        total_calls += calls;
        total_sales += sales;
        if calls > 0.0 || sales > 0.0 {
            active_agents += 1;
        }
        if let Some(talk_time) = number(agent, &["talk_time", "avg_talk_time"]) {
            talk_time_sum += talk_time;
            talk_time_count += 1;
        }
    }

    let conversion_rate = if total_calls > 0.0 {
        (total_sales / total_calls * 1000.0).round() / 10.0
    } else {
        0.0
    };
    let avg_talk_time = if talk_time_count > 0 {
        talk_time_sum / talk_time_count as f64
    } else {
        0.0
    };

    json!({
        "total_calls": total_calls as u64,
        "total_calls_change": 0,
        "active_agents": active_agents,
        "active_agents_change": 0,
        "avg_talk_time": avg_talk_time,
        "avg_talk_time_change": 0,
        "conversion_rate": conversion_rate,
        "conversion_rate_change": 0,
    })
}
