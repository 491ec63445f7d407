//! API identity resolution from the `Authorization` header.
//!
//! Two schemes are tried in a fixed order, Basic then Token. A request
//! resolves to exactly one user or to nothing; callers never learn which
//! scheme was tried or why it failed.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::credentials::CredentialStore;
use crate::domain::token::TokenService;
use crate::domain::user::User;

/// One way of presenting credentials in an `Authorization` header.
pub trait CredentialScheme: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` if the header is not for this scheme or the credential is bad.
    fn resolve(&self, authorization: &str) -> Option<User>;
}

/// `Basic base64(username:password)`.
pub struct BasicScheme {
    credentials: Arc<CredentialStore>,
}

impl BasicScheme {
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }
}

impl CredentialScheme for BasicScheme {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn resolve(&self, authorization: &str) -> Option<User> {
        let encoded = strip_scheme(authorization, "Basic")?;
        let (username, password) = decode_basic(encoded)?;
        match self.credentials.check_credentials(&username, &password) {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(error = %e, "credential check failed");
                None
            }
        }
    }
}

/// `Token <jwt>`, with `Bearer <jwt>` accepted as well.
pub struct TokenScheme {
    tokens: Arc<TokenService>,
}

impl TokenScheme {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl CredentialScheme for TokenScheme {
    fn name(&self) -> &'static str {
        "token"
    }

    fn resolve(&self, authorization: &str) -> Option<User> {
        let token = strip_scheme(authorization, "Token")
            .or_else(|| strip_scheme(authorization, "Bearer"))?;
        self.tokens.verify_auth_token(token)
    }
}

pub struct AuthGateway {
    schemes: Vec<Box<dyn CredentialScheme>>,
}

impl AuthGateway {
    pub fn new(schemes: Vec<Box<dyn CredentialScheme>>) -> Self {
        Self { schemes }
    }

    /// Basic first, then Token.
    pub fn standard(credentials: Arc<CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self::new(vec![
            Box::new(BasicScheme::new(credentials)),
            Box::new(TokenScheme::new(tokens)),
        ])
    }

    pub fn resolve_identity(&self, authorization: Option<&str>) -> Option<User> {
        let header = authorization?.trim();
        for scheme in &self.schemes {
            if let Some(user) = scheme.resolve(header) {
                tracing::debug!(scheme = scheme.name(), user_id = user.id, "request authenticated");
                return Some(user);
            }
        }
        tracing::debug!("request carried unusable credentials");
        None
    }
}

fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let (keyword, rest) = header.split_once(' ')?;
    if !keyword.eq_ignore_ascii_case(scheme) {
        return None;
    }
    let rest = rest.trim();
    (!rest.is_empty()).then_some(rest)
}

fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let bytes = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
