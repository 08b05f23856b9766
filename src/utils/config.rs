use std::net::SocketAddr;

use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cognito_domain: Url,
    pub cognito_client_id: String,
    pub cognito_redirect_uri: String,
    pub cognito_logout_uri: String,
    pub cognito_scope: String,
    pub cognito_region: Option<String>,
    pub cognito_idp_endpoint: Option<Url>,
    pub api_base_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub cookie_secret: Option<Vec<u8>>,
    pub secure_cookies: bool,
    pub login_path: String,
    pub post_login_redirect: String,
    /// Lifetime of a signed-in session and of its cookie.
    pub session_ttl_days: i64,
}

impl Config {
    pub fn init() -> Result<Self, ConfigError> {
        let cognito_domain = required("COGNITO_DOMAIN")?;
        let cognito_domain = parse_url("COGNITO_DOMAIN", &cognito_domain)?;

        let cognito_idp_endpoint = optional("COGNITO_IDP_ENDPOINT")
            .map(|raw| parse_url("COGNITO_IDP_ENDPOINT", &raw))
            .transpose()?;

        let bind_addr = optional("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let cookie_secret = match optional("COOKIE_SECRET") {
            Some(secret) if secret.len() < 64 => {
                return Err(ConfigError::Invalid {
                    name: "COOKIE_SECRET",
                    reason: "must be at least 64 bytes".to_string(),
                })
            }
            other => other.map(String::into_bytes),
        };

        let session_ttl_days = match optional("SESSION_TTL_DAYS") {
            None => 30,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=365).contains(days))
                .ok_or_else(|| ConfigError::Invalid {
                    name: "SESSION_TTL_DAYS",
                    reason: format!("expected a number of days between 1 and 365, got {raw}"),
                })?,
        };

        let secure_cookies = match optional("SECURE_COOKIES").as_deref() {
            None => true,
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "SECURE_COOKIES",
                    reason: format!("expected true or false, got {other}"),
                })
            }
        };

        Ok(Config {
            cognito_domain,
            cognito_client_id: required("COGNITO_CLIENT_ID")?,
            cognito_redirect_uri: required("COGNITO_REDIRECT_URI")?,
            cognito_logout_uri: required("COGNITO_LOGOUT_URI")?,
            cognito_scope: optional("COGNITO_SCOPE")
                .unwrap_or_else(|| "openid email profile".to_string()),
            cognito_region: optional("COGNITO_REGION"),
            cognito_idp_endpoint,
            api_base_url: optional("API_BASE_URL"),
            bind_addr,
            cookie_secret,
            secure_cookies,
            login_path: optional("LOGIN_PATH").unwrap_or_else(|| "/auth/login".to_string()),
            post_login_redirect: optional("POST_LOGIN_REDIRECT")
                .unwrap_or_else(|| "/".to_string()),
            session_ttl_days,
        })
    }

    /// Identity provider base URL with any trailing slash removed.
    pub fn cognito_base(&self) -> &str {
        self.cognito_domain.as_str().trim_end_matches('/')
    }

    /// Cognito IdP JSON API endpoint, either overridden or derived from the region.
    pub fn idp_endpoint(&self) -> Option<Url> {
        if let Some(endpoint) = &self.cognito_idp_endpoint {
            return Some(endpoint.clone());
        }
        let region = self.cognito_region.as_deref()?;
        Url::parse(&format!("https://cognito-idp.{region}.amazonaws.com/")).ok()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        cognito_domain: Url::parse("https://auth.example.com/").unwrap(),
        cognito_client_id: "client-123".to_string(),
        cognito_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
        cognito_logout_uri: "http://localhost:3000/".to_string(),
        cognito_scope: "openid email profile".to_string(),
        cognito_region: None,
        cognito_idp_endpoint: None,
        api_base_url: None,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cookie_secret: None,
        secure_cookies: false,
        login_path: "/auth/login".to_string(),
        post_login_redirect: "/".to_string(),
        session_ttl_days: 30,
    }
}
