//! Registry error types.

use crate::core::StateId;
use thiserror::Error;

/// Broken internal guarantees. These indicate an allocator bug or a
/// long-running process that exhausted its id space.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("State id space exhausted (ceiling: {ceiling})")]
    IdSpaceExhausted { ceiling: u64 },

    #[error("State id {0} is already active")]
    DuplicateId(StateId),
}

/// Errors returned by registry operations.
///
/// Removing a state that is not active is not an error; removal methods
/// report it through their `bool` or count result.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The factory could not produce the requested variant
    #[error("Failed to construct state {kind}: {reason}")]
    ConstructionFailure { kind: &'static str, reason: String },

    #[error(transparent)]
    InvariantViolation(#[from] InvariantViolation),

    /// `update_states` was called from inside a state hook
    #[error("update_states called while a tick is already running")]
    ReentrantTick,

    /// A state was added from an exit hook while all states were being removed
    #[error("Cannot add {kind} while all states are being removed")]
    TeardownInProgress { kind: &'static str },
}

/// Errors loading a [`RegistryConfig`](crate::registry::RegistryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid registry config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn construction(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::ConstructionFailure {
            kind,
            reason: reason.into(),
        }
    }
}
