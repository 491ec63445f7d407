//! User persistence port trait.

use crate::domain::error::TodosError;
use crate::domain::user::User;

pub trait UserPort {
    fn find_user_by_id(&self, id: i64) -> Result<Option<User>, TodosError>;

    /// Exact, case-sensitive match.
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, TodosError>;

    /// Fails with [`TodosError::AlreadyExists`] when the username is taken.
    /// Implementations must enforce this with a store-level unique constraint.
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User, TodosError>;

    fn count_users(&self) -> Result<usize, TodosError>;
}
