//! The registry and everything a state sees of it.
//!
//! A [`Registry`] owns the active states of exactly one context. The host
//! calls [`Registry::start_machine`] once, then [`Registry::update_states`]
//! once per tick. States reach back into the registry through the
//! [`Scope`] passed to their hooks.

mod config;
mod handle;
mod handler;
mod scope;

pub use config::{MatchPolicy, RegistryConfig};
pub use handle::{RegistryId, StateHandle};
pub use handler::Registry;
pub use scope::Scope;
