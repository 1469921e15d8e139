//! Process-wide identifier allocation for states.
//!
//! Every state ever constructed receives an id from an [`IdAllocator`].
//! Registries share [`IdAllocator::global()`] unless a private allocator is
//! injected, so ids can be compared across registries.

use crate::error::InvariantViolation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Unique identifier of a state instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(u64);

impl StateId {
    /// Raw numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues strictly increasing [`StateId`]s.
///
/// Allocation never wraps: once the ceiling is reached every further call
/// fails with [`InvariantViolation::IdSpaceExhausted`].
///
/// # Example
///
/// ```rust
/// use statesoup::core::IdAllocator;
///
/// let ids = IdAllocator::new();
/// let first = ids.allocate().unwrap();
/// let second = ids.allocate().unwrap();
/// assert!(second > first);
/// ```
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
    ceiling: u64,
}

static GLOBAL: OnceLock<Arc<IdAllocator>> = OnceLock::new();

impl IdAllocator {
    /// Allocator starting at zero with the full `u64` range.
    pub fn new() -> Self {
        Self::with_ceiling(u64::MAX)
    }

    /// Allocator that refuses to issue ids at or above `ceiling`.
    pub fn with_ceiling(ceiling: u64) -> Self {
        Self {
            next: AtomicU64::new(0),
            ceiling,
        }
    }

    /// The allocator shared by every registry in the process.
    ///
    /// Created on first use and never reset.
    pub fn global() -> Arc<IdAllocator> {
        GLOBAL.get_or_init(|| Arc::new(IdAllocator::new())).clone()
    }

    /// Issue the next id.
    pub fn allocate(&self) -> Result<StateId, InvariantViolation> {
        let ceiling = self.ceiling;
        self.next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < ceiling).then_some(current + 1)
            })
            .map(StateId)
            .map_err(|_| InvariantViolation::IdSpaceExhausted { ceiling })
    }

    /// Id that the next successful [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }

    /// Number of ids still available.
    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.peek())
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
