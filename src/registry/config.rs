//! Registry configuration.

use crate::core::StateKind;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How `remove_states_of_type` decides that an entry matches a kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Only the exact variant matches
    #[default]
    Exact,

    /// The exact variant and every variant declared to be in that family
    IsA,
}

impl MatchPolicy {
    /// Whether an entry of `kind` with `families` matches `target`.
    pub fn matches(self, kind: StateKind, families: &[StateKind], target: StateKind) -> bool {
        match self {
            Self::Exact => kind == target,
            Self::IsA => kind == target || families.contains(&target),
        }
    }
}

/// Tunables for a [`Registry`](super::Registry).
///
/// Every field is optional when loading from JSON:
///
/// ```rust
/// use statesoup::registry::{MatchPolicy, RegistryConfig};
///
/// let config = RegistryConfig::from_json(r#"{ "match_policy": "is_a" }"#).unwrap();
/// assert_eq!(config.match_policy, MatchPolicy::IsA);
/// assert!(!config.exit_on_reset);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Matching rule for removal by type
    pub match_policy: MatchPolicy,

    /// Whether `reset_machine` runs `exit` on the states it clears
    pub exit_on_reset: bool,

    /// Number of lifecycle records kept; 0 disables the history
    pub history_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::Exact,
            exit_on_reset: false,
            history_capacity: 64,
        }
    }
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    pub fn exit_on_reset(mut self, exit: bool) -> Self {
        self.exit_on_reset = exit;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}
