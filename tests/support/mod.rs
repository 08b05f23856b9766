#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use leaderboard_backend::{build_router, AppState, Config};
use serde_json::{json, Value};
use url::Url;

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    format!("http://{addr}")
}

/// A base URL nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn config(idp_base: &str, api_base: Option<String>) -> Config {
    Config {
        cognito_domain: Url::parse(idp_base).expect("idp url"),
        cognito_client_id: "client-123".to_string(),
        cognito_redirect_uri: "http://localhost:3000/auth/callback".to_string(),
        cognito_logout_uri: "http://localhost:3000/".to_string(),
        cognito_scope: "openid email profile".to_string(),
        cognito_region: None,
        cognito_idp_endpoint: Some(Url::parse(&format!("{idp_base}/")).expect("idp endpoint")),
        api_base_url: api_base,
        bind_addr: "127.0.0.1:0".parse().expect("bind addr"),
        cookie_secret: Some(vec![7u8; 64]),
        secure_cookies: false,
        login_path: "/auth/login".to_string(),
        post_login_redirect: "/".to_string(),
        session_ttl_days: 30,
    }
}

/// Starts the app and returns its base URL plus the shared state.
pub async fn spawn_app(config: Config) -> (String, AppState) {
    let state = AppState::new(config);
    let base = serve(build_router(state.clone())).await;
    (base, state)
}

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs() as i64
}

pub fn signed_token(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"test-signing-key"),
    )
    .expect("mint token")
}

pub fn id_token_expiring(sub: &str, name: &str, email: &str, exp: i64) -> String {
    signed_token(&json!({"sub": sub, "name": name, "email": email, "exp": exp}))
}

pub fn id_token(sub: &str, name: &str, email: &str) -> String {
    id_token_expiring(sub, name, email, now_secs() + 3600)
}

/// Minimal browser: no redirects followed, one session cookie carried by hand.
pub struct Browser {
    pub base: String,
    client: reqwest::Client,
    cookie: Option<String>,
}

impl Browser {
    pub fn new(base: &str) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("client");
        Self {
            base: base.to_string(),
            client,
            cookie: None,
        }
    }

    pub fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, path: &str) -> reqwest::Response {
        let request = self.client.get(format!("{}{path}", self.base));
        self.send(request).await
    }

    pub async fn get_with_bearer(&mut self, path: &str, token: &str) -> reqwest::Response {
        let request = self
            .client
            .get(format!("{}{path}", self.base))
            .bearer_auth(token);
        self.send(request).await
    }

    pub async fn post_json(&mut self, path: &str, body: &Value) -> reqwest::Response {
        let request = self.client.post(format!("{}{path}", self.base)).json(body);
        self.send(request).await
    }

    async fn send(&mut self, mut request: reqwest::RequestBuilder) -> reqwest::Response {
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        let response = request.send().await.expect("send request");
        for header in response.headers().get_all(reqwest::header::SET_COOKIE) {
            let raw = header.to_str().expect("ascii cookie");
            let pair = raw.split(';').next().unwrap_or_default().trim();
            let value = pair.split_once('=').map(|(_, v)| v).unwrap_or_default();
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_string());
            }
        }
        response
    }
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}

/// Stand-in for the Cognito hosted UI token endpoint and the IdP JSON API.
#[derive(Clone, Default)]
pub struct FakeIdp {
    pub token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub sign_outs: Arc<Mutex<Vec<String>>>,
    pub fail_sign_out: bool,
}

impl FakeIdp {
    pub async fn start(self) -> String {
        let app = Router::new()
            .route("/oauth2/token", post(fake_token))
            .route("/", post(fake_idp_call))
            .with_state(self);
        serve(app).await
    }
}

async fn fake_token(
    State(idp): State<FakeIdp>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let code = form.get("code").cloned().unwrap_or_default();
    let grant = form.get("grant_type").cloned().unwrap_or_default();
    idp.token_requests.lock().expect("lock").push(form);

    if grant == "authorization_code" && code == "bad-code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant"})),
        )
            .into_response();
    }
    Json(json!({
        "access_token": "access-1",
        "id_token": id_token("user-1", "Jane Doe", "jane@example.com"),
        "refresh_token": "refresh-1",
        "token_type": "Bearer",
        "expires_in": 3600,
    }))
    .into_response()
}

async fn fake_idp_call(State(idp): State<FakeIdp>, headers: HeaderMap, body: String) -> Response {
    let target = headers
        .get("X-Amz-Target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body: Value = serde_json::from_str(&body).unwrap_or_default();

    match target.as_str() {
        "AWSCognitoIdentityProviderService.InitiateAuth" => {
            if body["AuthParameters"]["PASSWORD"] != json!("hunter2") {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "__type": "NotAuthorizedException",
                        "message": "Incorrect username or password."
                    })),
                )
                    .into_response();
            }
            Json(json!({
                "AuthenticationResult": {
                    "AccessToken": "access-pw",
                    "IdToken": id_token("user-1", "Jane Doe", "jane@example.com"),
                    "RefreshToken": "refresh-pw",
                }
            }))
            .into_response()
        }
        "AWSCognitoIdentityProviderService.GetUser" => {
            let token = body["AccessToken"].as_str().unwrap_or_default();
            if idp.sign_outs.lock().expect("lock").iter().any(|t| t == token) {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": "Access Token has been revoked"})),
                )
                    .into_response();
            }
            Json(json!({
                "Username": "user-1",
                "UserAttributes": [
                    {"Name": "sub", "Value": "user-1"},
                    {"Name": "name", "Value": "Jane Doe"},
                    {"Name": "email", "Value": "jane@example.com"}
                ]
            }))
            .into_response()
        }
        "AWSCognitoIdentityProviderService.GlobalSignOut" => {
            let token = body["AccessToken"].as_str().unwrap_or_default().to_string();
            idp.sign_outs.lock().expect("lock").push(token);
            if idp.fail_sign_out {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "service unavailable"})),
                )
                    .into_response();
            }
            Json(json!({})).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, Json(json!({"message": "unknown target"}))).into_response(),
    }
}

/// Stand-in for the sales-performance API. Only `jane_doe_003` exists.
#[derive(Clone, Default)]
pub struct FakeUpstream {
    pub agent_requests: Arc<Mutex<Vec<String>>>,
    pub authorizations: Arc<Mutex<Vec<Option<String>>>>,
}

impl FakeUpstream {
    pub async fn start(self) -> String {
        let app = Router::new()
            .route("/leaderboard", get(fake_leaderboard))
            .route("/districts", get(fake_districts))
            .route("/big-movers", get(fake_big_movers))
            .route("/me/{agent_id}", get(fake_agent))
            .route("/history/agent/{agent_id}", get(fake_history))
            .with_state(self);
        serve(app).await
    }

    pub fn agent_requests(&self) -> Vec<String> {
        self.agent_requests.lock().expect("lock").clone()
    }

    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().expect("lock").clone()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorizations.lock().expect("lock").push(auth);
    }
}

async fn fake_leaderboard(State(up): State<FakeUpstream>, headers: HeaderMap) -> Json<Value> {
    up.record_auth(&headers);
    Json(json!({
        "as_of": "2025-01-01T00:00:00Z",
        "agents": [
            {"agent_id": "jane_doe_003", "name": "Jane Doe", "sales": 4, "calls": 20, "talk_time": 100.0},
            {"agent_id": "ann_lee_001", "name": "Ann Lee", "calls": 10, "talk_time": 200.0}
        ]
    }))
}

async fn fake_districts() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"message": "maintenance"})),
    )
        .into_response()
}

async fn fake_big_movers(State(up): State<FakeUpstream>, headers: HeaderMap) -> Json<Value> {
    up.record_auth(&headers);
    Json(json!({"period_days": 7, "positive_movers": [{"agent_id": "ann_lee_001"}]}))
}

async fn fake_agent(
    State(up): State<FakeUpstream>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    up.record_auth(&headers);
    up.agent_requests.lock().expect("lock").push(agent_id.clone());
    if agent_id == "jane_doe_003" {
        Json(json!({"agent_id": agent_id, "calls": 20})).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"message": "no such agent"}))).into_response()
    }
}

async fn fake_history(
    Path(agent_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(json!({
        "agent_id": agent_id,
        "period": query.get("period"),
        "series": [{"day": "2025-01-01", "calls": 4}]
    }))
}
