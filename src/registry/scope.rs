//! Access handed to state hooks.

use super::handle::StateHandle;
use super::handler::Registry;
use crate::core::{StateId, StateKind};
use crate::error::RegistryError;

/// What a state can reach while one of its hooks runs.
///
/// The running state is checked out of its registry for the duration of the
/// hook, so the scope can lend out the whole registry mutably. Structural
/// changes take effect immediately; the running state itself is never
/// visible through [`Registry::get`] from inside its own hook.
pub struct Scope<'a, C> {
    id: StateId,
    registry: &'a mut Registry<C>,
}

impl<'a, C: 'static> Scope<'a, C> {
    pub(crate) fn new(id: StateId, registry: &'a mut Registry<C>) -> Self {
        Self { id, registry }
    }

    /// Id of the state whose hook is running.
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn context(&self) -> &C {
        self.registry.context()
    }

    pub fn context_mut(&mut self) -> &mut C {
        self.registry.context_mut()
    }

    /// The owning registry, for anything the shortcuts below do not cover.
    pub fn registry(&mut self) -> &mut Registry<C> {
        &mut *self.registry
    }

    /// Current tick count of the owning registry.
    pub fn tick(&self) -> u64 {
        self.registry.tick()
    }

    pub fn add<T: 'static>(&mut self) -> Result<StateHandle, RegistryError> {
        self.registry.add::<T>()
    }

    pub fn add_state(&mut self, kind: StateKind) -> Result<StateHandle, RegistryError> {
        self.registry.add_state(kind)
    }

    pub fn remove_state(&mut self, id: StateId, call_exit: bool) -> bool {
        self.registry.remove_state(id, call_exit)
    }

    pub fn remove_states_of_type(&mut self, kind: StateKind, call_exit: bool) -> usize {
        self.registry.remove_states_of_type(kind, call_exit)
    }

    /// Remove every other active state matching `T` under the registry's
    /// match policy. The running state is kept even if it matches.
    pub fn remove_others_of<T: 'static>(&mut self, call_exit: bool) -> usize {
        self.registry
            .remove_matching(StateKind::of::<T>(), call_exit, Some(self.id))
    }

    /// Remove the running state. Its `exit` runs after the current hook returns.
    pub fn remove_self(&mut self, call_exit: bool) -> bool {
        self.registry.remove_state(self.id, call_exit)
    }
}
