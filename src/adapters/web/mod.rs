//! Web server adapter.
//!
//! Serves the JSON API under `/api/v1` (Basic or token auth per request) and
//! the server-rendered pages (cookie sessions via axum-login).

pub mod api;
pub mod auth;
mod error;
pub mod extract;
pub mod handlers;
mod templates;

pub use error::{ApiError, WebError};
pub use templates::*;

use axum::{
    Router,
    routing::{get, post, put},
};
use axum_login::{AuthManagerLayerBuilder, login_required};
use chrono::Duration;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{Expiry, SessionManagerLayer, cookie::Key};
use tower_sessions_rusqlite_store::RusqliteStore;

use crate::domain::credentials::{CredentialStore, PasswordService};
use crate::domain::error::TodosError;
use crate::domain::identity::AuthGateway;
use crate::domain::settings::ServerSettings;
use crate::domain::token::TokenService;
use crate::ports::config_port::ConfigPort;
use crate::ports::todo_port::TodoPort;
use crate::ports::user_port::UserPort;

use auth::Backend;

pub struct AppState {
    pub todos: Arc<dyn TodoPort + Send + Sync>,
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub gateway: AuthGateway,
    pub settings: ServerSettings,
}

impl AppState {
    /// Wires the services over one store. The secret comes from the config,
    /// so two states built from different configs reject each other's tokens.
    pub fn new<S>(store: Arc<S>, config: &dyn ConfigPort) -> Result<Self, TodosError>
    where
        S: TodoPort + UserPort + Send + Sync + 'static,
    {
        let settings = ServerSettings::from_config(config)?;
        let passwords = PasswordService::from_config(config)?;

        let users: Arc<dyn UserPort + Send + Sync> = store.clone();
        let credentials = Arc::new(CredentialStore::new(users.clone(), passwords)?);
        let tokens = Arc::new(TokenService::new(
            &settings.secret_key,
            Duration::seconds(settings.token_expiry_secs),
            users,
        ));
        let gateway = AuthGateway::standard(Arc::clone(&credentials), Arc::clone(&tokens));

        Ok(Self {
            todos: store,
            credentials,
            tokens,
            gateway,
            settings,
        })
    }
}

pub async fn build_router(state: AppState) -> Result<Router, TodosError> {
    let session_db = &state.settings.session_db_path;
    let conn = if session_db == ":memory:" {
        tokio_rusqlite::Connection::open_in_memory().await
    } else {
        tokio_rusqlite::Connection::open(session_db).await
    }
    .map_err(|e| TodosError::Database {
        reason: format!("session store: {e}"),
    })?;

    let session_store = RusqliteStore::new(conn);
    session_store
        .migrate()
        .await
        .map_err(|e| TodosError::Database {
            reason: format!("session store migration: {e}"),
        })?;

    let key = Key::try_from(state.settings.secret_key.as_slice()).map_err(|e| {
        TodosError::ConfigInvalid {
            section: "auth".into(),
            key: "secret_key".into(),
            reason: e.to_string(),
        }
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            state.settings.session_lifetime_secs,
        )))
        .with_signed(key);

    let backend = Backend::new(Arc::clone(&state.credentials));
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let api = Router::new()
        .route("/todos", get(api::list_todos).post(api::create_todo))
        .route("/todos/{id}", put(api::update_todo).delete(api::delete_todo))
        .route("/users", post(api::create_user))
        .route("/users/token", get(api::issue_token));

    let account = Router::new()
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route_layer(login_required!(Backend, login_url = "/signup"));

    Ok(Router::new()
        .route("/", get(handlers::index))
        .route("/signup", get(handlers::signup_form).post(handlers::signup))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .merge(account)
        .nest("/api/v1", api)
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state)))
}

/// Runs store and hashing work off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, TodosError>
where
    F: FnOnce() -> Result<T, TodosError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TodosError::Io(std::io::Error::other(e)))?
}
