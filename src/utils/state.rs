use std::{sync::Arc, time::Duration};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use reqwest::Client;

use crate::utils::{
    cognito::CognitoClient, config::Config, session_store::SessionStore, upstream::UpstreamClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cognito: CognitoClient,
    pub upstream: UpstreamClient,
    pub sessions: Arc<SessionStore>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http_client = Client::new();
        let session_ttl = Duration::from_secs(config.session_ttl_days.max(1) as u64 * 24 * 60 * 60);
        let cookie_key = match config.cookie_secret.as_deref().map(Key::try_from) {
            Some(Ok(key)) => key,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "COOKIE_SECRET unusable, generating a key");
                Key::generate()
            }
            None => Key::generate(),
        };

        AppState {
            cognito: CognitoClient::new(&config, http_client.clone()),
            upstream: UpstreamClient::new(config.api_base_url.clone(), http_client),
            sessions: Arc::new(SessionStore::new(session_ttl)),
            cookie_key,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
