//! Builder API for registry construction.
//!
//! The builder gathers the context, the state factory, the start variant and
//! the configuration, and checks that they fit together before a
//! [`Registry`](crate::registry::Registry) is created.

pub mod error;
pub mod registry;

pub use error::BuildError;
pub use registry::RegistryBuilder;
