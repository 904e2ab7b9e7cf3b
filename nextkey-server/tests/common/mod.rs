#![allow(dead_code)]

use nextkey_envelope::{ApiResponse, ClientCipher, EnvelopeRequest, EnvelopeResponse};
use nextkey_server::{AppState, ServerConfig, build_router, serve};
use nextkey_store::SqliteStore;
use nextkey_types::{Card, ManualClock, Project};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;

pub const ADMIN: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse";

pub struct TestServer {
    pub base: String,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub http: reqwest::Client,
}

pub async fn spawn() -> TestServer {
    spawn_with(|_| {}).await
}

/// Spin up the server on an OS-assigned port with an in-memory database.
pub async fn spawn_with(configure: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let mut config = ServerConfig::default();
    config.security.jwt_secret = "test-secret".to_string();
    config.admin.username = ADMIN.to_string();
    config.admin.password = ADMIN_PASSWORD.to_string();
    configure(&mut config);

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let clock = Arc::new(ManualClock::starting_now());
    let state = AppState::new(config, store, clock.clone());
    state.bootstrap_admin().unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = build_router(state.clone());
    tokio::spawn(async move {
        serve(listener, app, std::future::pending()).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        state,
        clock,
        http: reqwest::Client::new(),
    }
}

pub fn nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    // ── Admin ────────────────────────────────────────────────────

    pub async fn admin_login(&self, password: &str) -> (StatusCode, ApiResponse) {
        let resp = self
            .http
            .post(self.url("/admin/login"))
            .json(&json!({ "username": ADMIN, "password": password }))
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    /// Logs in and returns `{access_token, refresh_token, expires_in}`.
    pub async fn admin_tokens(&self) -> Value {
        let (status, body) = self.admin_login(ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body:?}");
        body.data
    }

    pub async fn admin_token(&self) -> String {
        self.admin_tokens().await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn admin(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, ApiResponse) {
        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await.unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    pub async fn create_project(&self, token: &str, body: Value) -> Project {
        let (status, resp) = self
            .admin(reqwest::Method::POST, "/admin/projects", token, Some(body))
            .await;
        assert_eq!(status, StatusCode::OK, "{resp:?}");
        serde_json::from_value(resp.data).unwrap()
    }

    pub async fn create_card(&self, token: &str, project: &Project, key: &str, max_hwid: i64) -> Card {
        let body = json!({
            "project_id": project.id,
            "card_key": key,
            "count": 1,
            "duration": 3600,
            "max_hwid": max_hwid,
        });
        let (status, resp) = self
            .admin(reqwest::Method::POST, "/admin/cards", token, Some(body))
            .await;
        assert_eq!(status, StatusCode::OK, "{resp:?}");
        let mut cards: Vec<Card> = serde_json::from_value(resp.data).unwrap();
        cards.remove(0)
    }

    // ── Client ───────────────────────────────────────────────────

    pub fn client<'a>(&'a self, project: &'a Project) -> ClientCipher<'a> {
        ClientCipher {
            registry: &self.state.registry,
            scheme: &project.cipher_scheme,
            key: &project.cipher_key,
        }
    }

    pub fn envelope(&self, project: &Project, nonce: &str, data: Value) -> EnvelopeRequest {
        self.client(project)
            .request(nonce, self.clock_now(), data)
            .unwrap()
    }

    pub fn clock_now(&self) -> i64 {
        use nextkey_types::Clock;
        self.clock.now()
    }

    /// Posts a raw envelope. Returns the status and either the decrypted
    /// inner response (HTTP 200) or the plain error body.
    pub async fn send_envelope(
        &self,
        path: &str,
        project: &Project,
        request: &EnvelopeRequest,
        bearer: Option<&str>,
    ) -> (StatusCode, ApiResponse) {
        let mut builder = self.http.post(self.url(path)).json(request);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        let resp = builder.send().await.unwrap();
        let status = resp.status();
        if status != StatusCode::OK {
            return (status, resp.json().await.unwrap());
        }
        let sealed: EnvelopeResponse = resp.json().await.unwrap();
        let body = self
            .client(project)
            .read_response(&sealed, &request.nonce)
            .unwrap();
        (status, body)
    }

    pub async fn call(
        &self,
        path: &str,
        project: &Project,
        data: Value,
        bearer: Option<&str>,
    ) -> (StatusCode, ApiResponse) {
        let request = self.envelope(project, &nonce(), data);
        self.send_envelope(path, project, &request, bearer).await
    }

    /// Client login; returns the session token on success.
    pub async fn card_login(&self, project: &Project, key: &str, hwid: &str) -> ApiResponse {
        let data = json!({ "project_uuid": project.uuid, "card_key": key, "hwid": hwid });
        let (status, body) = self.call("/api/auth/login", project, data, None).await;
        assert_eq!(status, StatusCode::OK, "{body:?}");
        body
    }
}
