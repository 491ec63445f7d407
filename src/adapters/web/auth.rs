//! Session authentication backend for axum-login.
//!
//! Browser sessions are checked against the same credential store as the API,
//! but session validity is owned by tower-sessions, not the token service.

use std::sync::Arc;

use axum_login::{AuthUser, AuthnBackend, UserId};

use crate::domain::credentials::CredentialStore;
use crate::domain::error::TodosError;
use crate::domain::user::User;

use super::run_blocking;

pub type AuthSession = axum_login::AuthSession<Backend>;

/// A signed-in browser user.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    /// The password hash string as bytes, used by axum-login to validate sessions.
    pw_hash_bytes: Vec<u8>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            pw_hash_bytes: user.password_hash.into_bytes(),
        }
    }
}

impl AuthUser for SessionUser {
    type Id = i64;

    fn id(&self) -> i64 {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted via the login form.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Backend {
    credentials: Arc<CredentialStore>,
}

impl Backend {
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }
}

impl AuthnBackend for Backend {
    type User = SessionUser;
    type Credentials = Credentials;
    type Error = TodosError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let credentials = Arc::clone(&self.credentials);
        let user = run_blocking(move || {
            credentials.check_credentials(&creds.username, &creds.password)
        })
        .await?;
        Ok(user.map(SessionUser::from))
    }

    async fn get_user(
        &self,
        user_id: &UserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        Ok(self.credentials.find_user(*user_id)?.map(SessionUser::from))
    }
}
