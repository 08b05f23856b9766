use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::{extract::PrivateCookieJar, TypedHeader};
use headers::{authorization::Bearer, Authorization};
use http::StatusCode;
use serde_json::{json, Value};

use crate::{
    models::{error::Error, session::SessionKey},
    utils::{cookies::forwarded_bearer, state::AppState},
};

/// Big movers are authorised with the id token rather than the access token.
pub async fn get_big_movers(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, Error> {
    let bearer = forwarded_bearer(&state, &jar, auth.as_ref().map(|h| &h.0), SessionKey::IdToken);
    let raw = state
        .upstream
        .get_json("/big-movers", &[], bearer.as_deref(), "Failed to fetch big movers")
        .await?;
    Ok((StatusCode::OK, Json(normalize_big_movers(raw))))
}

pub fn normalize_big_movers(mut raw: Value) -> Value {
    if !raw.is_object() {
        raw = json!({});
    }
    if let Value::Object(body) = &mut raw {
        for key in ["positive_movers", "negative_movers"] {
            if !body.get(key).is_some_and(Value::is_array) {
                body.insert(key.into(), json!([]));
            }
        }
    }
    raw
}
