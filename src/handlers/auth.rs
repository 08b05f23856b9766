use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::PrivateCookieJar;
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::{
        error::Error,
        session::{SessionId, SessionKey, TokenSet},
        user::Credentials,
    },
    utils::{
        cognito::AuthError,
        cookies::{clear_session_cookie, current_session, ensure_session, session_token},
        session::bootstrap,
        state::AppState,
    },
};

/// Starts the hosted UI login: stores a fresh PKCE verifier in the session
/// and redirects to the authorize endpoint.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), Error> {
    let auth_req = state.cognito.authorization_url().map_err(|e| {
        tracing::error!(error = %e, "invalid authorize URL");
        Error::new(StatusCode::INTERNAL_SERVER_ERROR, "Invalid identity provider URL")
    })?;

    let (jar, session_id) = ensure_session(&state, jar);
    state.sessions.update(&session_id, |session| {
        session.set(SessionKey::PkceVerifier, auth_req.code_verifier.as_str())
    });

    Ok((jar, Redirect::to(&auth_req.url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    access_token: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
}

/// OAuth callback. A `code` is exchanged with the stored verifier;
/// otherwise implicit-flow tokens are taken from the query. Every outcome
/// ends on the post-login redirect; exchange failures are only logged.
pub async fn callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> (PrivateCookieJar, Redirect) {
    let (jar, session_id) = ensure_session(&state, jar);

    let tokens = match params.code.filter(|c| !c.is_empty()) {
        Some(code) => {
            let verifier = state
                .sessions
                .get(&session_id)
                .and_then(|s| s.get(SessionKey::PkceVerifier).map(str::to_string))
                .unwrap_or_default();

            match state.cognito.exchange_code(&code, &verifier).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    tracing::warn!(error = %e, "authorization code exchange failed");
                    TokenSet::default()
                }
            }
        }
        None => TokenSet {
            access_token: params.access_token.filter(|t| !t.is_empty()),
            id_token: params.id_token.filter(|t| !t.is_empty()),
            refresh_token: params.refresh_token.filter(|t| !t.is_empty()),
        },
    };

    persist_tokens(&state, &session_id, &tokens);
    (jar, Redirect::to(&state.config.post_login_redirect))
}

#[derive(Deserialize)]
pub struct ImplicitPayload {
    #[serde(default)]
    fragment: String,
}

/// Implicit flow: the page posts its URL fragment here since browsers
/// never send fragments to the server.
pub async fn implicit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(payload): Json<ImplicitPayload>,
) -> (PrivateCookieJar, Json<serde_json::Value>) {
    let (jar, session_id) = ensure_session(&state, jar);
    let tokens = TokenSet::from_fragment(&payload.fragment);
    persist_tokens(&state, &session_id, &tokens);
    (
        jar,
        Json(json!({ "redirect": state.config.post_login_redirect })),
    )
}

fn persist_tokens(state: &AppState, session_id: &SessionId, tokens: &TokenSet) {
    if tokens.is_empty() {
        return;
    }
    state
        .sessions
        .update(session_id, |session| session.store_tokens(tokens));
    tracing::info!(
        access = tokens.access_token.is_some(),
        id = tokens.id_token.is_some(),
        refresh = tokens.refresh_token.is_some(),
        "tokens stored"
    );
}

/// Session check for the browser: `{"user": User | null}`.
pub async fn session(State(state): State<AppState>, jar: PrivateCookieJar) -> impl IntoResponse {
    let user = current_session(&state, &jar).and_then(|id| bootstrap(&state, &id));
    (StatusCode::OK, Json(json!({ "user": user })))
}

/// Clears the session and hands the browser to the IdP logout endpoint.
pub async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), Error> {
    let logout_url = state.cognito.logout_url().map_err(|e| {
        tracing::error!(error = %e, "invalid logout URL");
        Error::new(StatusCode::INTERNAL_SERVER_ERROR, "Invalid identity provider URL")
    })?;

    if let Some(session_id) = current_session(&state, &jar) {
        state.sessions.invalidate(&session_id);
    }

    Ok((jar.remove(clear_session_cookie()), Redirect::to(&logout_url)))
}

/// Server-side logout. Revokes the access token upstream on a best-effort
/// basis before clearing the session.
pub async fn server_logout(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    if let Some(session_id) = current_session(&state, &jar) {
        let access_token = state
            .sessions
            .get(&session_id)
            .and_then(|s| s.get(SessionKey::AccessToken).map(str::to_string));

        if let Some(token) = access_token {
            if let Err(e) = state.cognito.global_sign_out(&token).await {
                tracing::debug!(error = %e, "global sign-out failed, continuing logout");
            }
        }
        state.sessions.invalidate(&session_id);
    }

    (
        jar.remove(clear_session_cookie()),
        Json(json!({ "success": true })),
    )
        .into_response()
}

/// Email/password sign-in against the user pool.
pub async fn credentials_login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(payload): Json<Credentials>,
) -> Result<(PrivateCookieJar, Json<serde_json::Value>), Error> {
    let email = payload.email.trim();

    let tokens = state
        .cognito
        .initiate_auth(email, &payload.password)
        .await
        .map_err(login_error)?;

    let access_token = tokens.access_token.clone().unwrap_or_default();
    let user = state
        .cognito
        .get_user(&access_token)
        .await
        .map_err(login_error)?;

    let (jar, session_id) = ensure_session(&state, jar);
    persist_tokens(&state, &session_id, &tokens);

    Ok((jar, Json(json!({ "user": user }))))
}

fn login_error(error: AuthError) -> Error {
    match error {
        AuthError::NotConfigured => {
            Error::new(StatusCode::INTERNAL_SERVER_ERROR, "Cognito is not configured")
        }
        AuthError::Rejected { detail, .. } => Error::new(StatusCode::UNAUTHORIZED, &detail),
        other => {
            tracing::warn!(error = %other, "credential login failed");
            Error::new(StatusCode::UNAUTHORIZED, "Login failed")
        }
    }
}

/// Current user as reported by Cognito for the session's access token.
pub async fn me(State(state): State<AppState>, jar: PrivateCookieJar) -> Result<impl IntoResponse, Error> {
    let access_token =
        session_token(&state, &jar, SessionKey::AccessToken).ok_or_else(Error::unauthorized)?;

    let user = state.cognito.get_user(&access_token).await.map_err(|e| {
        tracing::debug!(error = %e, "GetUser failed");
        Error::unauthorized()
    })?;

    Ok((StatusCode::OK, Json(json!({ "user": user }))))
}
