//! Typed errors surfaced by the policy engine.

use thiserror::Error;

/// Failure to look up or build a policy profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unknown policy profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("invalid capability group '{0}'")]
    InvalidGroup(String),

    #[error("profile name '{0}' is reserved for a built-in profile")]
    ReservedProfileName(String),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
