//! Signed, time-limited auth tokens.
//!
//! A token is an HS256 JWT carrying `{id, iat, exp}`. Nothing is stored
//! server-side: a token stays valid until `exp` whatever happens to the
//! account, and changing the secret silently invalidates every token issued
//! under the old one.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::domain::error::TodosError;
use crate::domain::user::User;
use crate::ports::user_port::UserPort;

pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
    users: Arc<dyn UserPort + Send + Sync>,
}

impl TokenService {
    pub fn new(secret: &[u8], expiry: Duration, users: Arc<dyn UserPort + Send + Sync>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            expiry,
            users,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn generate_auth_token(&self, user: &User) -> Result<String, TodosError> {
        self.generate_auth_token_with_expiry(user, self.expiry)
    }

    pub fn generate_auth_token_with_expiry(
        &self,
        user: &User,
        expires_in: Duration,
    ) -> Result<String, TodosError> {
        let now = Utc::now();
        let claims = TokenClaims {
            id: user.id,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            TodosError::Token {
                reason: e.to_string(),
            }
        })
    }

    /// Checks signature and expiry. Forged, expired and malformed tokens are
    /// all `None`.
    pub fn decode_user_id(&self, token: &str) -> Option<i64> {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims.id),
            Err(e) => {
                tracing::debug!(error = %e, "rejected auth token");
                None
            }
        }
    }

    /// Resolves a token to the user it was issued for.
    pub fn verify_auth_token(&self, token: &str) -> Option<User> {
        let id = self.decode_user_id(token)?;
        match self.users.find_user_by_id(id) {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, user_id = id, "user lookup failed during token check");
                None
            }
        }
    }
}
