//! Domain error types.

/// Top-level error type for the todos service.
#[derive(Debug, thiserror::Error)]
pub enum TodosError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("user with username {username:?} already exists")]
    AlreadyExists { username: String },

    #[error("todo {id} not found")]
    NotFound { id: i64 },

    #[error("password does not match")]
    PasswordMismatch,

    #[error("password hashing error: {reason}")]
    PasswordHash { reason: String },

    #[error("token error: {reason}")]
    Token { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for TodosError {
    fn from(err: rusqlite::Error) -> Self {
        TodosError::DatabaseQuery {
            reason: err.to_string(),
        }
    }
}

impl From<r2d2::Error> for TodosError {
    fn from(err: r2d2::Error) -> Self {
        TodosError::Database {
            reason: err.to_string(),
        }
    }
}

impl From<argon2::password_hash::Error> for TodosError {
    fn from(err: argon2::password_hash::Error) -> Self {
        match err {
            argon2::password_hash::Error::Password => TodosError::PasswordMismatch,
            other => TodosError::PasswordHash {
                reason: other.to_string(),
            },
        }
    }
}

impl From<&TodosError> for std::process::ExitCode {
    fn from(err: &TodosError) -> Self {
        let code: u8 = match err {
            TodosError::Io(_) => 1,
            TodosError::ConfigParse { .. }
            | TodosError::ConfigMissing { .. }
            | TodosError::ConfigInvalid { .. } => 2,
            TodosError::Database { .. } | TodosError::DatabaseQuery { .. } => 3,
            TodosError::PasswordMismatch
            | TodosError::PasswordHash { .. }
            | TodosError::Token { .. } => 4,
            TodosError::AlreadyExists { .. } | TodosError::NotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
