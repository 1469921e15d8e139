//! The registry that owns and drives the active states of one context.

use super::config::RegistryConfig;
use super::handle::{RegistryId, StateHandle};
use super::scope::Scope;
use crate::builder::RegistryBuilder;
use crate::core::{
    IdAllocator, LifecycleEvent, LifecycleHistory, LifecycleRecord, State, StateId, StateKind,
};
use crate::error::{InvariantViolation, RegistryError};
use crate::factory::{Constructed, StateFactory};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hook {
    Enter,
    Execute,
    Exit,
}

enum Slot<C> {
    Resident(Box<dyn State<C>>),
    /// The state is checked out while one of its hooks runs.
    Busy(Hook),
}

struct Entry<C> {
    id: StateId,
    kind: StateKind,
    families: Rc<[StateKind]>,
    display_name: Option<String>,
    slot: Slot<C>,
}

impl<C> Entry<C> {
    fn handle(&self, registry: RegistryId) -> StateHandle {
        StateHandle {
            id: self.id,
            kind: self.kind,
            display_name: self.display_name.clone(),
            registry,
        }
    }
}

/// A state removed while its own enter or execute hook was running.
struct Detached {
    kind: StateKind,
    call_exit: bool,
    /// Detached by `remove_all_states`; its exit still counts as teardown.
    teardown: bool,
}

/// Ordered set of active states for one context.
///
/// States run in insertion order. Any number of them may be active at once;
/// exclusivity between variants is up to the states themselves, usually by
/// removing competitors in `enter`.
///
/// # Example
///
/// ```rust
/// use statesoup::core::State;
/// use statesoup::factory::StateFactory;
/// use statesoup::registry::{Registry, Scope};
///
/// #[derive(Default)]
/// struct Counter {
///     ticks: u32,
/// }
///
/// #[derive(Default)]
/// struct Boot;
/// impl State<Counter> for Boot {
///     fn enter(&mut self, scope: &mut Scope<'_, Counter>) {
///         scope.context_mut().ticks = 0;
///     }
/// }
///
/// #[derive(Default)]
/// struct Count;
/// impl State<Counter> for Count {
///     fn execute(&mut self, scope: &mut Scope<'_, Counter>) {
///         scope.context_mut().ticks += 1;
///     }
/// }
///
/// let mut registry = Registry::builder()
///     .context(Counter::default())
///     .factory(StateFactory::new().with::<Boot>().with::<Count>())
///     .start::<Boot>()
///     .build()
///     .unwrap();
///
/// registry.start_machine().unwrap();
/// registry.add::<Count>().unwrap();
/// registry.update_states().unwrap();
/// registry.update_states().unwrap();
///
/// assert_eq!(registry.context().ticks, 2);
/// assert_eq!(registry.len(), 2);
/// ```
pub struct Registry<C> {
    id: RegistryId,
    context: C,
    factory: StateFactory<C>,
    start: StateKind,
    config: RegistryConfig,
    allocator: Arc<IdAllocator>,
    entries: Vec<Entry<C>>,
    detached: HashMap<StateId, Detached>,
    history: LifecycleHistory,
    tick: u64,
    ticking: bool,
    tearing_down: bool,
    /// Teardown-detached states whose hooks have not returned yet.
    pending_teardown: usize,
    /// A reset asked to start again once `pending_teardown` drains.
    pending_start: bool,
}

impl<C: 'static> Registry<C> {
    pub fn builder() -> RegistryBuilder<C> {
        RegistryBuilder::new()
    }

    pub(crate) fn from_parts(
        context: C,
        factory: StateFactory<C>,
        start: StateKind,
        config: RegistryConfig,
        allocator: Arc<IdAllocator>,
    ) -> Self {
        let id = RegistryId::new();
        debug!(registry = %id, start = %start, "Registry created");
        Self {
            id,
            context,
            factory,
            start,
            history: LifecycleHistory::with_capacity(config.history_capacity),
            config,
            allocator,
            entries: Vec::new(),
            detached: HashMap::new(),
            tick: 0,
            ticking: false,
            tearing_down: false,
            pending_teardown: 0,
            pending_start: false,
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consume the registry and give the context back.
    ///
    /// Remaining states are dropped without running `exit`.
    pub fn into_context(self) -> C {
        self.context
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The variant added by [`start_machine`](Self::start_machine).
    pub fn start_kind(&self) -> StateKind {
        self.start
    }

    /// Number of completed or running ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn history(&self) -> &LifecycleHistory {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.position(id).is_some()
    }

    /// Number of active states matching `kind` under the configured policy.
    pub fn count_of(&self, kind: StateKind) -> usize {
        self.entries
            .iter()
            .filter(|e| self.config.match_policy.matches(e.kind, &e.families, kind))
            .count()
    }

    /// Handles of the active states in insertion order.
    pub fn active_states(&self) -> impl Iterator<Item = StateHandle> + '_ {
        self.entries.iter().map(move |e| e.handle(self.id))
    }

    /// Handle of an active state.
    pub fn handle(&self, id: StateId) -> Option<StateHandle> {
        self.entry(id).map(|e| e.handle(self.id))
    }

    /// Borrow an active state as its concrete variant.
    ///
    /// Returns `None` if the id is not active, the variant differs, or the
    /// state is currently running one of its hooks.
    pub fn get<T: 'static>(&self, id: StateId) -> Option<&T> {
        match &self.entry(id)?.slot {
            Slot::Resident(state) => {
                let state: &dyn State<C> = &**state;
                state.as_any().downcast_ref::<T>()
            }
            Slot::Busy(_) => None,
        }
    }

    pub fn get_mut<T: 'static>(&mut self, id: StateId) -> Option<&mut T> {
        let index = self.position(id)?;
        match &mut self.entries[index].slot {
            Slot::Resident(state) => {
                let state: &mut dyn State<C> = &mut **state;
                state.as_any_mut().downcast_mut::<T>()
            }
            Slot::Busy(_) => None,
        }
    }

    /// Construct, bind and enter a new state of `kind`.
    ///
    /// The state is appended after every currently active state and its
    /// `enter` hook has completed when this returns. The hook may already
    /// have removed the state again.
    pub fn add_state(&mut self, kind: StateKind) -> Result<StateHandle, RegistryError> {
        if self.tearing_down || self.pending_teardown > 0 {
            warn!(registry = %self.id, kind = %kind, "Refusing to add state during teardown");
            return Err(RegistryError::TeardownInProgress { kind: kind.name() });
        }

        let Constructed { mut state, families } =
            self.factory.construct(kind).map_err(|err| {
                warn!(registry = %self.id, kind = %kind, error = %err, "State construction failed");
                err
            })?;

        let id = self.allocator.allocate()?;
        if self.contains(id) || self.detached.contains_key(&id) {
            return Err(InvariantViolation::DuplicateId(id).into());
        }

        let entry = Entry {
            id,
            kind,
            families,
            display_name: state.name().map(str::to_owned),
            slot: Slot::Busy(Hook::Enter),
        };
        let handle = entry.handle(self.id);
        self.entries.push(entry);

        debug!(registry = %self.id, state = %id, kind = %kind, "Entering state");
        self.call_hook(id, &mut state, Hook::Enter);
        self.record(id, kind, LifecycleEvent::Entered);
        self.check_in(id, state);

        Ok(handle)
    }

    /// Typed shorthand for [`add_state`](Self::add_state).
    pub fn add<T: 'static>(&mut self) -> Result<StateHandle, RegistryError> {
        self.add_state(StateKind::of::<T>())
    }

    /// Run `execute` on every active state once.
    ///
    /// The set of states to run is captured before the first hook. States
    /// removed during the tick are skipped if their turn has not come yet;
    /// states added during the tick first run on the next one. Returns the
    /// number of `execute` calls made.
    pub fn update_states(&mut self) -> Result<usize, RegistryError> {
        if self.ticking {
            warn!(registry = %self.id, tick = self.tick, "update_states called from a hook");
            return Err(RegistryError::ReentrantTick);
        }
        self.ticking = true;
        self.tick += 1;

        let snapshot: Vec<StateId> = self.entries.iter().map(|e| e.id).collect();
        let mut executed = 0;
        for id in snapshot {
            let Some(mut state) = self.check_out(id, Hook::Execute) else {
                continue;
            };
            trace!(registry = %self.id, state = %id, tick = self.tick, "Executing state");
            self.call_hook(id, &mut state, Hook::Execute);
            self.check_in(id, state);
            executed += 1;
        }

        self.ticking = false;
        Ok(executed)
    }

    /// Remove the state with `id`, running its `exit` first if `call_exit`.
    ///
    /// Returns `false` if no such state is active. A state whose `exit` is
    /// already running is not removed twice.
    pub fn remove_state(&mut self, id: StateId, call_exit: bool) -> bool {
        let Some(index) = self.position(id) else {
            trace!(registry = %self.id, state = %id, "Remove target not active");
            return false;
        };
        let kind = self.entries[index].kind;

        let running = match &self.entries[index].slot {
            Slot::Busy(hook) => Some(*hook),
            Slot::Resident(_) => None,
        };
        match running {
            Some(Hook::Exit) => return false,
            Some(_) => {
                // Its hook is on the stack; finish the removal once it returns.
                self.entries.remove(index);
                let teardown = self.tearing_down;
                if teardown {
                    self.pending_teardown += 1;
                }
                self.detached.insert(
                    id,
                    Detached {
                        kind,
                        call_exit,
                        teardown,
                    },
                );
                debug!(registry = %self.id, state = %id, kind = %kind, "Detached running state");
                return true;
            }
            None => {}
        }

        if call_exit {
            if let Some(mut state) = self.check_out(id, Hook::Exit) {
                debug!(registry = %self.id, state = %id, kind = %kind, "Exiting state");
                self.call_hook(id, &mut state, Hook::Exit);
                self.record(id, kind, LifecycleEvent::Exited);
            }
        }
        if let Some(index) = self.position(id) {
            self.entries.remove(index);
        }
        self.record(id, kind, LifecycleEvent::Removed { exit_called: call_exit });
        debug!(registry = %self.id, state = %id, kind = %kind, "Removed state");
        true
    }

    /// Shorthand for `remove_state(id, true)`.
    pub fn remove(&mut self, id: StateId) -> bool {
        self.remove_state(id, true)
    }

    /// Remove every active state matching `kind`, newest first.
    ///
    /// Matching follows the configured [`MatchPolicy`](super::MatchPolicy).
    /// Returns the number of states removed.
    pub fn remove_states_of_type(&mut self, kind: StateKind, call_exit: bool) -> usize {
        self.remove_matching(kind, call_exit, None)
    }

    /// Typed shorthand for [`remove_states_of_type`](Self::remove_states_of_type).
    pub fn remove_all_of<T: 'static>(&mut self, call_exit: bool) -> usize {
        self.remove_states_of_type(StateKind::of::<T>(), call_exit)
    }

    pub(crate) fn remove_matching(
        &mut self,
        kind: StateKind,
        call_exit: bool,
        except: Option<StateId>,
    ) -> usize {
        let policy = self.config.match_policy;
        let targets: Vec<StateId> = self
            .entries
            .iter()
            .rev()
            .filter(|e| Some(e.id) != except && policy.matches(e.kind, &e.families, kind))
            .map(|e| e.id)
            .collect();
        targets
            .into_iter()
            .filter(|&id| self.remove_state(id, call_exit))
            .count()
    }

    /// Remove every active state, newest first.
    ///
    /// `exit` runs on each cleared state when `call_exit` is set. States may
    /// not be added from those exit hooks, nor until every cleared state whose
    /// hook was running has finished. The count includes states removed by
    /// other states' exit hooks.
    pub fn remove_all_states(&mut self, call_exit: bool) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let before = self.entries.len();
        let was_tearing_down = std::mem::replace(&mut self.tearing_down, true);
        let targets: Vec<StateId> = self.entries.iter().rev().map(|e| e.id).collect();
        for id in targets {
            self.remove_state(id, call_exit);
        }
        self.tearing_down = was_tearing_down;
        let removed = before.saturating_sub(self.entries.len());
        debug!(registry = %self.id, removed, call_exit, "Removed all states");
        removed
    }

    /// Add one instance of the start variant.
    pub fn start_machine(&mut self) -> Result<StateHandle, RegistryError> {
        debug!(registry = %self.id, start = %self.start, "Starting machine");
        self.add_state(self.start)
    }

    /// Clear all states, then start again if `start_after_reset`.
    ///
    /// Cleared states get `exit` only when the config sets `exit_on_reset`.
    ///
    /// Called from a hook, the states whose hooks are still running finish
    /// their teardown when those hooks return. The start state is added only
    /// after the last of them, and `Ok(None)` is returned in that case.
    pub fn reset_machine(
        &mut self,
        start_after_reset: bool,
    ) -> Result<Option<StateHandle>, RegistryError> {
        let removed = self.remove_all_states(self.config.exit_on_reset);
        debug!(registry = %self.id, removed, start_after_reset, "Reset machine");
        if !start_after_reset {
            return Ok(None);
        }
        if self.pending_teardown > 0 {
            debug!(
                registry = %self.id,
                pending = self.pending_teardown,
                "Deferring start until detached states finish"
            );
            self.pending_start = true;
            return Ok(None);
        }
        self.start_machine().map(Some)
    }

    fn position(&self, id: StateId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn entry(&self, id: StateId) -> Option<&Entry<C>> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn check_out(&mut self, id: StateId, hook: Hook) -> Option<Box<dyn State<C>>> {
        let index = self.position(id)?;
        let slot = &mut self.entries[index].slot;
        match std::mem::replace(slot, Slot::Busy(hook)) {
            Slot::Resident(state) => Some(state),
            busy => {
                *slot = busy;
                None
            }
        }
    }

    /// Put a state back after its hook, or finish removing it if it was
    /// detached meanwhile.
    fn check_in(&mut self, id: StateId, mut state: Box<dyn State<C>>) {
        if let Some(index) = self.position(id) {
            self.entries[index].slot = Slot::Resident(state);
            return;
        }
        let Some(Detached {
            kind,
            call_exit,
            teardown,
        }) = self.detached.remove(&id)
        else {
            return;
        };
        if call_exit {
            debug!(registry = %self.id, state = %id, kind = %kind, "Exiting detached state");
            let was_tearing_down = self.tearing_down;
            self.tearing_down = was_tearing_down || teardown;
            self.call_hook(id, &mut state, Hook::Exit);
            self.tearing_down = was_tearing_down;
            self.record(id, kind, LifecycleEvent::Exited);
        }
        self.record(id, kind, LifecycleEvent::Removed { exit_called: call_exit });
        debug!(registry = %self.id, state = %id, kind = %kind, "Removed state");

        if !teardown {
            return;
        }
        self.pending_teardown -= 1;
        if self.pending_teardown == 0 && std::mem::take(&mut self.pending_start) {
            if let Err(err) = self.start_machine() {
                warn!(registry = %self.id, error = %err, "Deferred start failed");
            }
        }
    }

    fn call_hook(&mut self, id: StateId, state: &mut Box<dyn State<C>>, hook: Hook) {
        let mut scope = Scope::new(id, self);
        match hook {
            Hook::Enter => state.enter(&mut scope),
            Hook::Execute => state.execute(&mut scope),
            Hook::Exit => state.exit(&mut scope),
        }
    }

    fn record(&mut self, id: StateId, kind: StateKind, event: LifecycleEvent) {
        self.history.record(LifecycleRecord {
            state: id,
            kind: kind.name().to_string(),
            event,
            tick: self.tick,
            timestamp: Utc::now(),
        });
    }
}

impl<C: fmt::Debug> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let states: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{}{}", e.kind, e.id))
            .collect();
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("context", &self.context)
            .field("start", &self.start)
            .field("states", &states)
            .field("tick", &self.tick)
            .finish()
    }
}
