//! Server settings, validated once at startup.

use crate::domain::error::TodosError;
use crate::domain::token::DEFAULT_TOKEN_EXPIRY_SECS;
use crate::ports::config_port::ConfigPort;

/// Length of the decoded `[auth] secret_key`, as required by the cookie key.
pub const SECRET_KEY_LEN: usize = 64;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_LIFETIME_SECS: i64 = 86400;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub secret_key: Vec<u8>,
    pub token_expiry_secs: i64,
    pub session_lifetime_secs: i64,
    pub session_db_path: String,
    pub seed_file: Option<String>,
}

impl ServerSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TodosError> {
        Ok(Self {
            host: config
                .get_string("server", "host")
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: validate_port(config)?,
            debug: config.get_bool("server", "debug", false),
            secret_key: secret_key(config)?,
            token_expiry_secs: positive(
                config,
                "auth",
                "token_expiry",
                DEFAULT_TOKEN_EXPIRY_SECS,
            )?,
            session_lifetime_secs: positive(
                config,
                "auth",
                "session_lifetime",
                DEFAULT_SESSION_LIFETIME_SECS,
            )?,
            session_db_path: config
                .get_string("session", "sqlite_path")
                .unwrap_or_else(|| ":memory:".to_string()),
            seed_file: config
                .get_string("data", "seed_file")
                .filter(|s| !s.trim().is_empty()),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Decodes `[auth] secret_key` (hex). Used both to sign tokens and to sign
/// session cookies.
pub fn secret_key(config: &dyn ConfigPort) -> Result<Vec<u8>, TodosError> {
    let hex_key = config
        .get_string("auth", "secret_key")
        .ok_or_else(|| TodosError::ConfigMissing {
            section: "auth".to_string(),
            key: "secret_key".to_string(),
        })?;

    let bytes = hex::decode(hex_key.trim()).map_err(|e| TodosError::ConfigInvalid {
        section: "auth".to_string(),
        key: "secret_key".to_string(),
        reason: format!("secret_key must be hex: {e}"),
    })?;

    if bytes.len() != SECRET_KEY_LEN {
        return Err(TodosError::ConfigInvalid {
            section: "auth".to_string(),
            key: "secret_key".to_string(),
            reason: format!(
                "secret_key must decode to {SECRET_KEY_LEN} bytes, got {}",
                bytes.len()
            ),
        });
    }
    Ok(bytes)
}

fn validate_port(config: &dyn ConfigPort) -> Result<u16, TodosError> {
    let value = config.get_int("server", "port", DEFAULT_PORT as i64);
    u16::try_from(value)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| TodosError::ConfigInvalid {
            section: "server".to_string(),
            key: "port".to_string(),
            reason: "port must be between 1 and 65535".to_string(),
        })
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, TodosError> {
    let value = config.get_int(section, key, default);
    if value <= 0 {
        return Err(TodosError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be positive"),
        });
    }
    Ok(value)
}
