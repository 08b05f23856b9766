use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{
    models::{session::TokenSet, user::User},
    utils::{config::Config, pkce},
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {detail}")]
    Rejected {
        operation: &'static str,
        status: u16,
        detail: String,
    },
    #[error("Cognito is not configured")]
    NotConfigured,
    #[error("{0}")]
    Incomplete(&'static str),
}

/// Redirect target plus the verifier that must be kept for the callback.
pub struct AuthorizationRequest {
    pub url: String,
    pub code_verifier: String,
}

/// Client for the hosted UI OAuth endpoints and the Cognito IdP JSON API.
#[derive(Clone)]
pub struct CognitoClient {
    base: String,
    client_id: String,
    redirect_uri: String,
    logout_uri: String,
    scope: String,
    idp_endpoint: Option<Url>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct InitiateAuthResponse {
    #[serde(rename = "AuthenticationResult")]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Deserialize)]
struct AuthenticationResult {
    #[serde(rename = "AccessToken")]
    access_token: Option<String>,
    #[serde(rename = "IdToken")]
    id_token: Option<String>,
    #[serde(rename = "RefreshToken")]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct GetUserResponse {
    #[serde(rename = "UserAttributes", default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Deserialize)]
struct UserAttribute {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value", default)]
    value: String,
}

impl CognitoClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            base: config.cognito_base().to_string(),
            client_id: config.cognito_client_id.clone(),
            redirect_uri: config.cognito_redirect_uri.clone(),
            logout_uri: config.cognito_logout_uri.clone(),
            scope: config.cognito_scope.clone(),
            idp_endpoint: config.idp_endpoint(),
            http,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.base)
    }

    /// Builds the hosted UI authorize URL with a fresh PKCE verifier.
    pub fn authorization_url(&self) -> Result<AuthorizationRequest, url::ParseError> {
        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::code_challenge(&code_verifier);

        let mut url = Url::parse(&format!("{}/oauth2/authorize", self.base))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", &code_challenge);

        Ok(AuthorizationRequest {
            url: url.into(),
            code_verifier,
        })
    }

    pub fn logout_url(&self) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!("{}/logout", self.base))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("logout_uri", &self.logout_uri);
        Ok(url.into())
    }

    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenSet, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ];
        self.token_request(&params, "token exchange").await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.token_request(&params, "token refresh").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        operation: &'static str,
    ) -> Result<TokenSet, AuthError> {
        let response = self
            .http
            .post(self.token_url())
            .form(params)
            .send()
            .await?;

        let response = ensure_success(response, operation).await?;
        Ok(response.json::<TokenSet>().await?)
    }

    /// `USER_PASSWORD_AUTH` sign-in. Both access and id tokens are required.
    pub async fn initiate_auth(&self, email: &str, password: &str) -> Result<TokenSet, AuthError> {
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.client_id,
            "AuthParameters": {
                "USERNAME": email,
                "PASSWORD": password,
            },
        });
        let response: InitiateAuthResponse = self.idp_call("InitiateAuth", &body).await?;

        let result = response
            .authentication_result
            .ok_or(AuthError::Incomplete("Login failed"))?;
        let tokens = TokenSet {
            access_token: result.access_token.filter(|t| !t.is_empty()),
            id_token: result.id_token.filter(|t| !t.is_empty()),
            refresh_token: result.refresh_token.filter(|t| !t.is_empty()),
        };
        if tokens.access_token.is_none() || tokens.id_token.is_none() {
            return Err(AuthError::Incomplete("Login failed"));
        }
        Ok(tokens)
    }

    pub async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        let body = json!({ "AccessToken": access_token });
        let response: GetUserResponse = self.idp_call("GetUser", &body).await?;

        let attrs: HashMap<String, String> = response
            .user_attributes
            .into_iter()
            .map(|attr| (attr.name, attr.value))
            .collect();
        Ok(User::from_attributes(&attrs))
    }

    /// Revokes every token issued for the access token's user.
    pub async fn global_sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let body = json!({ "AccessToken": access_token });
        let _: Value = self.idp_call("GlobalSignOut", &body).await?;
        Ok(())
    }

    async fn idp_call<T: serde::de::DeserializeOwned>(
        &self,
        target: &'static str,
        body: &Value,
    ) -> Result<T, AuthError> {
        let endpoint = self.idp_endpoint.clone().ok_or(AuthError::NotConfigured)?;
        let response = self
            .http
            .post(endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header(
                "X-Amz-Target",
                format!("AWSCognitoIdentityProviderService.{target}"),
            )
            .body(body.to_string())
            .send()
            .await?;

        let response = ensure_success(response, target).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, AuthError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error_description"))
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(AuthError::Rejected {
        operation,
        status,
        detail,
    })
}
