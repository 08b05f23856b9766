use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    PrivateCookieJar,
};
use headers::{authorization::Bearer, Authorization};
use time::Duration;

use crate::{
    models::session::{SessionId, SessionKey},
    utils::state::AppState,
};

pub const SESSION_COOKIE_NAME: &str = "dashboard_session";

pub fn session_cookie(session_id: &SessionId, secure: bool, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::days(ttl_days))
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Session id from the cookie, if it still names a live session. Using a
/// session keeps it alive.
pub fn current_session(state: &AppState, jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|c| SessionId::from(c.value().to_string()))
        .filter(|id| state.sessions.touch(id))
}

/// Returns the live session for this browser, creating one (and its
/// cookie) when there is none.
pub fn ensure_session(state: &AppState, jar: PrivateCookieJar) -> (PrivateCookieJar, SessionId) {
    if let Some(id) = current_session(state, &jar) {
        return (jar, id);
    }
    let id = state.sessions.create();
    let jar = jar.add(session_cookie(
        &id,
        state.config.secure_cookies,
        state.config.session_ttl_days,
    ));
    (jar, id)
}

/// A token stored in the caller's session.
pub fn session_token(state: &AppState, jar: &PrivateCookieJar, key: SessionKey) -> Option<String> {
    current_session(state, jar)
        .and_then(|id| state.sessions.get(&id))
        .and_then(|session| session.get(key).map(str::to_string))
}

/// Bearer token to forward upstream: an inbound `Authorization` header wins,
/// otherwise the session's `key` token.
pub fn forwarded_bearer(
    state: &AppState,
    jar: &PrivateCookieJar,
    header: Option<&Authorization<Bearer>>,
    key: SessionKey,
) -> Option<String> {
    header
        .map(|auth| auth.token().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| session_token(state, jar, key))
}
