use std::time::Duration;

use crate::{
    models::{
        claims::Claims,
        session::{SessionId, SessionKey},
        user::User,
    },
    utils::state::AppState,
};

/// Seconds before expiry at which the refresh fires.
const REFRESH_LEAD_SECS: i64 = 60;
/// Lower bound on the refresh delay.
const MIN_REFRESH_SECS: i64 = 5;

/// Delay until the proactive refresh: `max(exp - now - 60, 5)` seconds.
pub fn refresh_delay(exp: i64, now: i64) -> Duration {
    let secs = exp
        .saturating_sub(now)
        .saturating_sub(REFRESH_LEAD_SECS)
        .max(MIN_REFRESH_SECS);
    Duration::from_secs(secs as u64)
}

/// Reads the session's tokens and derives the signed-in user.
///
/// Prefers the id token and falls back to the access token. A malformed
/// token means "no user". When the claims carry an expiry the silent
/// refresh is armed for it.
pub fn bootstrap(state: &AppState, session_id: &SessionId) -> Option<User> {
    let session = state.sessions.get(session_id)?;
    let token = session
        .get(SessionKey::IdToken)
        .or_else(|| session.get(SessionKey::AccessToken))?;

    let Some(claims) = Claims::decode(token) else {
        tracing::debug!("stored token could not be decoded");
        return None;
    };

    if let Some(exp) = claims.exp() {
        schedule_refresh(state, session_id, exp);
    }
    Some(User::from_claims(&claims))
}

/// Arms a one-shot refresh for `exp`, replacing any timer armed for a
/// different expiry.
pub fn schedule_refresh(state: &AppState, session_id: &SessionId, exp: i64) {
    if state.sessions.is_refresh_armed_for(session_id, exp) {
        return;
    }

    let delay = refresh_delay(exp, chrono::Utc::now().timestamp());
    tracing::debug!(delay_secs = delay.as_secs(), "scheduling silent refresh");

    let task = tokio::spawn(run_refresh(state.clone(), session_id.clone(), delay));
    state
        .sessions
        .arm_refresh(session_id, exp, task.abort_handle());
}

async fn run_refresh(state: AppState, session_id: SessionId, delay: Duration) {
    tokio::time::sleep(delay).await;
    state.sessions.release_refresh(&session_id);
    refresh_session(&state, &session_id).await;
}

/// Exchanges the stored refresh token for new tokens and re-runs
/// [`bootstrap`]. Failures are logged and otherwise ignored; the session
/// then simply expires.
pub async fn refresh_session(state: &AppState, session_id: &SessionId) -> Option<User> {
    let refresh_token = state
        .sessions
        .get(session_id)?
        .get(SessionKey::RefreshToken)?
        .to_string();

    match state.cognito.refresh(&refresh_token).await {
        Ok(tokens) => {
            state
                .sessions
                .update(session_id, |session| session.store_tokens(&tokens))?;
            tracing::info!("session tokens refreshed");
            bootstrap(state, session_id)
        }
        Err(e) => {
            tracing::warn!(error = %e, "silent refresh failed");
            None
        }
    }
}
