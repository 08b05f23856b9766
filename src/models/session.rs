use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Names under which session credentials are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    IdToken,
    RefreshToken,
    PkceVerifier,
}

impl SessionKey {
    pub const ALL: [SessionKey; 4] = [
        SessionKey::AccessToken,
        SessionKey::IdToken,
        SessionKey::RefreshToken,
        SessionKey::PkceVerifier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AccessToken => "access_token",
            SessionKey::IdToken => "id_token",
            SessionKey::RefreshToken => "refresh_token",
            SessionKey::PkceVerifier => "pkce_verifier",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier carried in the session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::rng().random();
        SessionId(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        SessionId(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bearer credentials held for one browser session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub pkce_verifier: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.is_some())
            .field("id_token", &self.id_token.is_some())
            .field("refresh_token", &self.refresh_token.is_some())
            .field("pkce_verifier", &self.pkce_verifier.is_some())
            .finish()
    }
}

impl Session {
    pub fn get(&self, key: SessionKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Stores a value. Empty strings are ignored.
    pub fn set(&mut self, key: SessionKey, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            *self.slot_mut(key) = Some(value);
        }
    }

    pub fn remove(&mut self, key: SessionKey) -> Option<String> {
        self.slot_mut(key).take()
    }

    pub fn clear(&mut self) {
        for key in SessionKey::ALL {
            self.remove(key);
        }
    }

    pub fn is_empty(&self) -> bool {
        SessionKey::ALL.iter().all(|key| self.get(*key).is_none())
    }

    /// Whether any access, id or refresh token is held.
    pub fn has_tokens(&self) -> bool {
        self.access_token.is_some() || self.id_token.is_some() || self.refresh_token.is_some()
    }

    /// Persists whichever tokens the set carries.
    pub fn store_tokens(&mut self, tokens: &TokenSet) {
        if let Some(token) = &tokens.access_token {
            self.set(SessionKey::AccessToken, token.as_str());
        }
        if let Some(token) = &tokens.id_token {
            self.set(SessionKey::IdToken, token.as_str());
        }
        if let Some(token) = &tokens.refresh_token {
            self.set(SessionKey::RefreshToken, token.as_str());
        }
    }

    fn slot(&self, key: SessionKey) -> &Option<String> {
        match key {
            SessionKey::AccessToken => &self.access_token,
            SessionKey::IdToken => &self.id_token,
            SessionKey::RefreshToken => &self.refresh_token,
            SessionKey::PkceVerifier => &self.pkce_verifier,
        }
    }

    fn slot_mut(&mut self, key: SessionKey) -> &mut Option<String> {
        match key {
            SessionKey::AccessToken => &mut self.access_token,
            SessionKey::IdToken => &mut self.id_token,
            SessionKey::RefreshToken => &mut self.refresh_token,
            SessionKey::PkceVerifier => &mut self.pkce_verifier,
        }
    }
}

/// Tokens handed back by the identity provider.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenSet {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &self.access_token.is_some())
            .field("id_token", &self.id_token.is_some())
            .field("refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

impl TokenSet {
    /// Parses implicit-flow tokens out of a URL fragment such as
    /// `#access_token=..&id_token=..`.
    pub fn from_fragment(fragment: &str) -> Self {
        let fragment = fragment.trim_start_matches('#');
        let mut tokens = TokenSet::default();
        for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "access_token" => tokens.access_token = value,
                "id_token" => tokens.id_token = value,
                "refresh_token" => tokens.refresh_token = value,
                _ => {}
            }
        }
        tokens
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.id_token.is_none() && self.refresh_token.is_none()
    }
}
