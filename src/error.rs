//! Error types for role mutation and storage

use serde::{Deserialize, Serialize};

/// Errors surfaced by the role authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleError {
    /// Another role already holds this name.
    NameTaken(String),
    /// No role exists with this id.
    NotFound(String),
    /// Storage or transport failure.
    Storage(String),
}

impl std::fmt::Display for RoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleError::NameTaken(name) => write!(f, "A role named '{}' already exists", name),
            RoleError::NotFound(id) => write!(f, "Role '{}' does not exist", id),
            RoleError::Storage(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RoleError {}

/// Result type alias for role operations
pub type Result<T> = std::result::Result<T, RoleError>;

/// Convert any foreign error to a storage error
pub fn err<E: std::error::Error>(e: E) -> RoleError {
    RoleError::Storage(e.to_string())
}
