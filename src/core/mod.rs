//! Core types shared by every registry.
//!
//! This module contains the building blocks the registry is made from:
//! - State behavior via the `State` trait and `StateKind` tags
//! - Process-wide id allocation
//! - Bounded lifecycle history

mod history;
mod id;
mod state;

pub use history::{LifecycleEvent, LifecycleHistory, LifecycleRecord};
pub use id::{IdAllocator, StateId};
pub use state::{AsAny, State, StateKind};
