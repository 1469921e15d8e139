//! Build errors for the registry builder.

use thiserror::Error;

/// Errors that can occur when building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Context not specified. Call .context(value) before .build()")]
    MissingContext,

    #[error("Start state not specified. Call .start::<State>() before .build()")]
    MissingStartState,

    #[error("Start state {0} has no constructor in the factory")]
    UnregisteredStartState(&'static str),
}
