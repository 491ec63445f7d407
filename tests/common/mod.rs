#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use std::sync::Arc;
use todos::adapters::sqlite_adapter::SqliteAdapter;
use todos::adapters::web::{AppState, build_router};
use todos::domain::credentials::CredentialStore;
use todos::domain::token::TokenService;
use todos::domain::user::User;
use todos::ports::config_port::ConfigPort;
use tower::ServiceExt;

pub const TEST_USERNAME: &str = "username";
pub const TEST_PASSWORD: &str = "password";

pub const TEST_SECRET: &str = "0101010101010101010101010101010101010101010101010101010101010101\
                               0101010101010101010101010101010101010101010101010101010101010101";
pub const OTHER_SECRET: &str = "0202020202020202020202020202020202020202020202020202020202020202\
                                0202020202020202020202020202020202020202020202020202020202020202";

/// In-memory databases and cheap argon2 parameters.
pub struct TestConfigPort {
    secret: String,
}

impl TestConfigPort {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }
}

impl ConfigPort for TestConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("auth", "secret_key") => Some(self.secret.clone()),
            ("sqlite", "path") => Some(":memory:".to_string()),
            ("session", "sqlite_path") => Some(":memory:".to_string()),
            _ => None,
        }
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match (section, key) {
            ("auth", "argon2_memory_kib") => 1024,
            ("auth", "argon2_iterations") => 1,
            ("auth", "argon2_parallelism") => 1,
            _ => default,
        }
    }

    fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
        default
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteAdapter>,
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_secret(TEST_SECRET).await
}

pub async fn spawn_app_with_secret(secret: &str) -> TestApp {
    let store = Arc::new(SqliteAdapter::in_memory().unwrap());
    store.initialize_schema().unwrap();

    let state = AppState::new(store.clone(), &TestConfigPort::new(secret)).unwrap();
    let credentials = Arc::clone(&state.credentials);
    let tokens = Arc::clone(&state.tokens);
    let router = build_router(state).await.unwrap();

    TestApp {
        router,
        store,
        credentials,
        tokens,
    }
}

impl TestApp {
    pub fn create_user(&self, username: &str, password: &str) -> User {
        self.credentials.create_user(username, password).unwrap()
    }

    /// Creates the default user and returns it.
    pub fn default_user(&self) -> User {
        self.create_user(TEST_USERNAME, TEST_PASSWORD)
    }

    pub fn token_for(&self, user: &User) -> String {
        self.tokens.generate_auth_token(user).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

pub fn default_basic_auth() -> String {
    basic_auth(TEST_USERNAME, TEST_PASSWORD)
}

pub fn token_auth(token: &str) -> String {
    format!("Token {token}")
}

fn builder(method: &str, uri: &str, auth: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder
}

pub fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    builder(method, uri, auth).body(Body::empty()).unwrap()
}

pub fn form_request(method: &str, uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
    builder(method, uri, auth)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    builder(method, uri, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8_lossy(&body_bytes(response).await).into_owned()
}

pub fn extract_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

pub fn build_cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .map(|sc| sc.split(';').next().unwrap_or("").to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
