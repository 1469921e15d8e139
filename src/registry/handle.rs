//! Caller-side references to registries and their states.

use crate::core::{StateId, StateKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a registry, used in handles and log fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryId(Uuid);

impl RegistryId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Reference to a state that was added to a registry.
///
/// Handles are plain values: holding one does not keep the state alive, and
/// removing a state through a stale handle simply reports "not found".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateHandle {
    pub(crate) id: StateId,
    pub(crate) kind: StateKind,
    pub(crate) display_name: Option<String>,
    pub(crate) registry: RegistryId,
}

impl StateHandle {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// The state's own display name, if it reports one.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Display name, falling back to the variant name.
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or(self.kind.name())
    }

    /// Registry the state was added to.
    pub fn registry(&self) -> RegistryId {
        self.registry
    }

    /// Whether the state is of variant `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.kind.is::<T>()
    }
}

impl fmt::Display for StateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.label(), self.id)
    }
}
