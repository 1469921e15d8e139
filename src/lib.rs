//! Statesoup: a registry of concurrently active states
//!
//! Classic state machines have one current state. Statesoup keeps an ordered
//! set of active states for a single context instead, and drives each of
//! them through `enter`, `execute` (once per tick) and `exit`. States decide
//! among themselves which ones may coexist, usually by removing competitors
//! when they enter.
//!
//! # Core Concepts
//!
//! - **State**: behavior unit implementing the `State` trait, tagged by a `StateKind`
//! - **Factory**: explicit constructors keyed by `StateKind`
//! - **Registry**: owns the context and its active states, runs the hooks
//! - **Scope**: what a hook sees: its own id, the context and the registry
//!
//! # Example
//!
//! ```rust
//! use statesoup::core::{IdAllocator, State};
//! use statesoup::factory::StateFactory;
//! use statesoup::registry::{Registry, Scope};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Fighter {
//!     hits: u32,
//! }
//!
//! #[derive(Default)]
//! struct Idle;
//! impl State<Fighter> for Idle {}
//!
//! #[derive(Default)]
//! struct Attack;
//! impl State<Fighter> for Attack {
//!     fn enter(&mut self, scope: &mut Scope<'_, Fighter>) {
//!         // Only one attack at a time.
//!         scope.remove_others_of::<Attack>(true);
//!     }
//!
//!     fn execute(&mut self, scope: &mut Scope<'_, Fighter>) {
//!         scope.context_mut().hits += 1;
//!     }
//! }
//!
//! let mut registry = Registry::builder()
//!     .context(Fighter::default())
//!     .factory(StateFactory::new().with::<Idle>().with::<Attack>())
//!     .start::<Idle>()
//!     .allocator(Arc::new(IdAllocator::new()))
//!     .build()
//!     .unwrap();
//!
//! registry.start_machine().unwrap();
//! registry.add::<Attack>().unwrap();
//! registry.add::<Attack>().unwrap();
//! assert_eq!(registry.len(), 2);
//!
//! registry.remove_all_of::<Idle>(false);
//! registry.update_states().unwrap();
//! assert_eq!(registry.context().hits, 1);
//! ```

pub mod builder;
pub mod core;
pub mod error;
pub mod factory;
pub mod registry;

// Re-export commonly used types
pub use builder::{BuildError, RegistryBuilder};
pub use core::{IdAllocator, State, StateId, StateKind};
pub use error::{ConfigError, InvariantViolation, RegistryError};
pub use factory::StateFactory;
pub use registry::{MatchPolicy, Registry, RegistryConfig, Scope, StateHandle};
