use http::StatusCode;
use serde_json::Value;

use crate::models::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("API_BASE_URL is not set")]
    NotConfigured,
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Status { status, .. } => *status,
            ProxyError::NotConfigured | ProxyError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProxyError> for Error {
    fn from(error: ProxyError) -> Self {
        Error::new(error.status(), &error.to_string())
    }
}

/// Thin client for the sales-performance API.
#[derive(Clone)]
pub struct UpstreamClient {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(base_url: Option<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.map(|b| b.trim_end_matches('/').to_string()),
            http,
        }
    }

    fn url(&self, path: &str) -> Result<String, ProxyError> {
        let base = self.base_url.as_deref().ok_or(ProxyError::NotConfigured)?;
        Ok(format!("{base}{path}"))
    }

    async fn send(
        &self,
        path: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut request = self
            .http
            .get(self.url(path)?)
            .header(http::header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// GETs `path` and parses the JSON body. Non-2xx answers become
    /// [`ProxyError::Status`] carrying the upstream status and `context`.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        context: &str,
    ) -> Result<Value, ProxyError> {
        let response = self.send(path, query, bearer).await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, path, "upstream request failed");
            return Err(ProxyError::Status {
                status,
                message: context.to_string(),
            });
        }
        Ok(response.json::<Value>().await?)
    }

    /// Like [`get_json`](Self::get_json) but only an HTTP 200 counts as a hit.
    /// Any other outcome, including transport errors, is `None`.
    pub async fn probe(&self, path: &str, bearer: Option<&str>) -> Option<Value> {
        match self.send(path, &[], bearer).await {
            Ok(response) if response.status() == StatusCode::OK => {
                response.json::<Value>().await.ok()
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), path, "probe missed");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, path, "probe failed");
                None
            }
        }
    }
}
