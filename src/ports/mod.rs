//! Port traits implemented by the adapters.

pub mod config_port;
pub mod todo_port;
pub mod user_port;
