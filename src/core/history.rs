//! Lifecycle history tracking.
//!
//! A registry records when states enter, exit and leave the active set.
//! The history is bounded: once full, the oldest record is dropped.

use super::id::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// What happened to a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The `enter` hook completed.
    Entered,
    /// The `exit` hook completed.
    Exited,
    /// The state left the active set.
    Removed { exit_called: bool },
}

/// Record of a single lifecycle event.
///
/// # Example
///
/// ```rust
/// use statesoup::core::{IdAllocator, LifecycleEvent, LifecycleHistory, LifecycleRecord};
/// use chrono::Utc;
///
/// let ids = IdAllocator::new();
/// let mut history = LifecycleHistory::with_capacity(8);
/// history.record(LifecycleRecord {
///     state: ids.allocate().unwrap(),
///     kind: "Idle".to_string(),
///     event: LifecycleEvent::Entered,
///     tick: 0,
///     timestamp: Utc::now(),
/// });
/// assert_eq!(history.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRecord {
    /// The state the event belongs to
    pub state: StateId,
    /// Short name of the state's variant
    pub kind: String,
    /// What happened
    pub event: LifecycleEvent,
    /// Registry tick count when it happened
    pub tick: u64,
    /// Wall-clock time of the event
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of lifecycle events.
///
/// A capacity of zero disables recording entirely.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleHistory {
    capacity: usize,
    records: VecDeque<LifecycleRecord>,
}

impl LifecycleHistory {
    /// Create an empty history keeping at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Append a record, evicting the oldest one if the history is full.
    pub fn record(&mut self, record: LifecycleRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records from oldest to newest.
    pub fn records(&self) -> impl Iterator<Item = &LifecycleRecord> {
        self.records.iter()
    }

    /// Records belonging to one state, oldest first.
    pub fn for_state(&self, state: StateId) -> Vec<&LifecycleRecord> {
        self.records.iter().filter(|r| r.state == state).collect()
    }

    pub fn last(&self) -> Option<&LifecycleRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Time between the oldest and newest retained records.
    ///
    /// Returns `None` when the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}
