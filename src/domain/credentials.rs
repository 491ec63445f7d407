//! Credential store: argon2 password hashing over the user port.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::domain::error::TodosError;
use crate::domain::user::User;
use crate::ports::config_port::ConfigPort;
use crate::ports::user_port::UserPort;

/// Argon2id hasher with configurable cost parameters.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Reads `[auth] argon2_memory_kib`, `argon2_iterations` and
    /// `argon2_parallelism`, falling back to argon2's defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TodosError> {
        let m_cost = config.get_int("auth", "argon2_memory_kib", Params::DEFAULT_M_COST as i64);
        let t_cost = config.get_int("auth", "argon2_iterations", Params::DEFAULT_T_COST as i64);
        let p_cost = config.get_int("auth", "argon2_parallelism", Params::DEFAULT_P_COST as i64);

        let params = Params::new(
            positive_u32(m_cost, "argon2_memory_kib")?,
            positive_u32(t_cost, "argon2_iterations")?,
            positive_u32(p_cost, "argon2_parallelism")?,
            None,
        )
        .map_err(|e| TodosError::ConfigInvalid {
            section: "auth".into(),
            key: "argon2_memory_kib".into(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(params))
    }

    pub fn hash_password(&self, password: &str) -> Result<String, TodosError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// `Err(PasswordMismatch)` on a wrong password; other errors mean the
    /// stored hash itself is unusable.
    pub fn verify_password(&self, password: &str, encoded: &str) -> Result<(), TodosError> {
        let parsed = PasswordHash::new(encoded)?;
        self.argon2.verify_password(password.as_bytes(), &parsed)?;
        Ok(())
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

fn positive_u32(value: i64, key: &str) -> Result<u32, TodosError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| TodosError::ConfigInvalid {
            section: "auth".into(),
            key: key.into(),
            reason: format!("{key} must be a positive integer"),
        })
}

/// Persists users with hashed passwords and checks credentials against them.
pub struct CredentialStore {
    users: Arc<dyn UserPort + Send + Sync>,
    passwords: PasswordService,
    /// Verified against for unknown usernames. Hashed up front so the first
    /// miss costs the same as every later one.
    dummy_hash: String,
}

impl CredentialStore {
    pub fn new(
        users: Arc<dyn UserPort + Send + Sync>,
        passwords: PasswordService,
    ) -> Result<Self, TodosError> {
        let dummy_hash = passwords.hash_password("not-a-real-password")?;
        Ok(Self {
            users,
            passwords,
            dummy_hash,
        })
    }

    /// Creates a user with a freshly hashed password.
    ///
    /// The lookup is only a shortcut; a concurrent insert of the same name is
    /// caught by the store's unique constraint and reported the same way.
    pub fn create_user(&self, username: &str, password: &str) -> Result<User, TodosError> {
        if self.users.find_user_by_username(username)?.is_some() {
            return Err(TodosError::AlreadyExists {
                username: username.to_string(),
            });
        }
        let hash = self.passwords.hash_password(password)?;
        let user = self.users.insert_user(username, &hash)?;
        tracing::info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub fn verify_password(&self, user: &User, password: &str) -> Result<(), TodosError> {
        self.passwords.verify_password(password, &user.password_hash)
    }

    /// Resolves a username/password pair to a user.
    ///
    /// Unknown usernames and wrong passwords both give `Ok(None)`, and an
    /// unknown username still pays for one hash verification.
    pub fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, TodosError> {
        let Some(user) = self.users.find_user_by_username(username)? else {
            let _ = self.passwords.verify_password(password, &self.dummy_hash);
            return Ok(None);
        };

        match self.verify_password(&user, password) {
            Ok(()) => Ok(Some(user)),
            Err(TodosError::PasswordMismatch) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn find_user(&self, id: i64) -> Result<Option<User>, TodosError> {
        self.users.find_user_by_id(id)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, TodosError> {
        self.users.find_user_by_username(username)
    }
}
