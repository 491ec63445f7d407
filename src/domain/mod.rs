//! Core domain types and logic.

pub mod credentials;
pub mod error;
pub mod identity;
pub mod settings;
pub mod todo;
pub mod token;
pub mod user;
