//! Builder for constructing registries.

use crate::builder::error::BuildError;
use crate::core::{IdAllocator, State, StateKind};
use crate::factory::StateFactory;
use crate::registry::{Registry, RegistryConfig};
use std::sync::Arc;

/// Builder for constructing registries with a fluent API.
pub struct RegistryBuilder<C> {
    context: Option<C>,
    factory: StateFactory<C>,
    start: Option<StateKind>,
    config: RegistryConfig,
    allocator: Option<Arc<IdAllocator>>,
}

impl<C: 'static> RegistryBuilder<C> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            context: None,
            factory: StateFactory::new(),
            start: None,
            config: RegistryConfig::default(),
            allocator: None,
        }
    }

    /// Set the owning context (required).
    pub fn context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Replace the state factory.
    pub fn factory(mut self, factory: StateFactory<C>) -> Self {
        self.factory = factory;
        self
    }

    /// Register `T` in the factory using its `Default` implementation.
    pub fn register<T>(mut self) -> Self
    where
        T: State<C> + Default,
    {
        self.factory = self.factory.with::<T>();
        self
    }

    /// Set the start variant (required).
    pub fn start<T: 'static>(self) -> Self {
        self.start_kind(StateKind::of::<T>())
    }

    pub fn start_kind(mut self, kind: StateKind) -> Self {
        self.start = Some(kind);
        self
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a private id allocator instead of the process-wide one.
    ///
    /// Ids are then only unique among registries sharing this allocator.
    pub fn allocator(mut self, allocator: Arc<IdAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Build the registry.
    /// Returns an error if required fields are missing or the start variant
    /// cannot be constructed by the factory.
    pub fn build(self) -> Result<Registry<C>, BuildError> {
        let context = self.context.ok_or(BuildError::MissingContext)?;
        let start = self.start.ok_or(BuildError::MissingStartState)?;

        if !self.factory.contains(start) {
            return Err(BuildError::UnregisteredStartState(start.name()));
        }

        let allocator = self.allocator.unwrap_or_else(IdAllocator::global);
        Ok(Registry::from_parts(
            context,
            self.factory,
            start,
            self.config,
            allocator,
        ))
    }
}

impl<C: 'static> Default for RegistryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MatchPolicy;

    #[derive(Debug, Default)]
    struct Robot {
        booted: bool,
    }

    #[derive(Default)]
    struct Boot;
    impl State<Robot> for Boot {
        fn enter(&mut self, scope: &mut crate::registry::Scope<'_, Robot>) {
            scope.context_mut().booted = true;
        }
    }

    #[derive(Default)]
    struct Patrol;
    impl State<Robot> for Patrol {}

    #[test]
    fn builder_validates_required_fields() {
        let result = RegistryBuilder::<Robot>::new().build();
        assert!(matches!(result, Err(BuildError::MissingContext)));

        let result = RegistryBuilder::new().context(Robot::default()).build();
        assert!(matches!(result, Err(BuildError::MissingStartState)));
    }

    #[test]
    fn builder_requires_registered_start_state() {
        let result = RegistryBuilder::new()
            .context(Robot::default())
            .register::<Patrol>()
            .start::<Boot>()
            .build();

        assert!(matches!(
            result,
            Err(BuildError::UnregisteredStartState("Boot"))
        ));
    }

    #[test]
    fn fluent_api_builds_registry() {
        let registry = RegistryBuilder::new()
            .context(Robot::default())
            .register::<Boot>()
            .register::<Patrol>()
            .start::<Boot>()
            .config(RegistryConfig::default().match_policy(MatchPolicy::IsA))
            .allocator(Arc::new(IdAllocator::new()))
            .build()
            .unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.start_kind(), StateKind::of::<Boot>());
        assert_eq!(registry.config().match_policy, MatchPolicy::IsA);
        assert!(!registry.context().booted);
    }

    #[test]
    fn factory_replaces_registrations() {
        let registry = RegistryBuilder::new()
            .context(Robot::default())
            .register::<Patrol>()
            .factory(StateFactory::new().with::<Boot>())
            .start::<Boot>()
            .build();

        let mut registry = registry.unwrap();
        assert!(registry.add::<Patrol>().is_err());
        registry.start_machine().unwrap();
        assert!(registry.context().booted);
    }
}
