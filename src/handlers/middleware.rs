use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    models::user::User,
    utils::{cookies::current_session, session::bootstrap, state::AppState},
};

/// Protected-route gate.
///
/// Starts in `Loading` while the session is checked and settles in
/// either `Authenticated` or `Unauthenticated`. Only `Loading` can
/// transition; a settled gate stays settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Authenticated(User),
    Unauthenticated,
}

impl GateState {
    pub fn resolve(self, user: Option<User>) -> Self {
        match self {
            GateState::Loading => match user {
                Some(user) => GateState::Authenticated(user),
                None => GateState::Unauthenticated,
            },
            settled => settled,
        }
    }

    /// Where to send the viewer, if anywhere.
    pub fn redirect_to<'a>(&self, login_path: &'a str) -> Option<&'a str> {
        matches!(self, GateState::Unauthenticated).then_some(login_path)
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let user = current_session(&state, &jar).and_then(|id| bootstrap(&state, &id));

    match GateState::Loading.resolve(user) {
        GateState::Authenticated(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        gate => {
            let target = gate
                .redirect_to(&state.config.login_path)
                .unwrap_or(&state.config.login_path);
            tracing::debug!(path = %req.uri().path(), "unauthenticated, redirecting to login");
            Redirect::to(target).into_response()
        }
    }
}
