//! Integration tests for registry behavior when hooks reach back into it.

use statesoup::core::{IdAllocator, LifecycleEvent, State, StateId};
use statesoup::factory::StateFactory;
use statesoup::registry::{Registry, RegistryConfig, Scope};
use statesoup::RegistryError;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Arena {
    log: Vec<String>,
    errors: Vec<String>,
    target: Option<StateId>,
}

fn log(scope: &mut Scope<'_, Arena>, line: &str) {
    scope.context_mut().log.push(line.to_string());
}

#[derive(Default)]
struct Idle;
impl State<Arena> for Idle {
    fn enter(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Idle: enter");
    }

    fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Idle: execute");
    }

    fn exit(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Idle: exit");
    }
}

/// Only one attack may be active; a new one replaces the old.
#[derive(Default)]
struct Attack;
impl State<Arena> for Attack {
    fn enter(&mut self, scope: &mut Scope<'_, Arena>) {
        scope.remove_others_of::<Attack>(true);
        log(scope, "Attack: enter");
    }

    fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Attack: execute");
    }

    fn exit(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Attack: exit");
    }
}

/// Spawns an `Idle` on every tick.
#[derive(Default)]
struct Spawner;
impl State<Arena> for Spawner {
    fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Spawner: execute");
        scope.add::<Idle>().unwrap();
    }
}

/// Removes the state stored in `Arena::target` when it executes.
#[derive(Default)]
struct Sniper;
impl State<Arena> for Sniper {
    fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Sniper: execute");
        if let Some(target) = scope.context_mut().target.take() {
            let removed = scope.remove_state(target, true);
            log(scope, &format!("Sniper: removed {removed}"));
        }
    }
}

/// Leaves after its first tick.
#[derive(Default)]
struct OneShot;
impl State<Arena> for OneShot {
    fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "OneShot: execute");
        assert!(scope.remove_self(true));
        log(scope, "OneShot: still running");
    }

    fn exit(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "OneShot: exit");
    }
}

/// Refuses to stay: removes itself while entering.
#[derive(Default)]
struct Flinch;
impl State<Arena> for Flinch {
    fn enter(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Flinch: enter");
        scope.remove_self(true);
    }

    fn exit(&mut self, scope: &mut Scope<'_, Arena>) {
        log(scope, "Flinch: exit");
    }
}

/// Misbehaves by ticking its own registry.
#[derive(Default)]
struct Recurse;
impl State<Arena> for Recurse {
    fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
        if let Err(err) = scope.registry().update_states() {
            scope.context_mut().errors.push(err.to_string());
        }
    }
}

/// Tries to add a state and remove itself while exiting.
#[derive(Default)]
struct Stubborn;
impl State<Arena> for Stubborn {
    fn exit(&mut self, scope: &mut Scope<'_, Arena>) {
        if let Err(err) = scope.add::<Idle>() {
            scope.context_mut().errors.push(err.to_string());
        }
        let again = scope.remove_self(true);
        log(scope, &format!("Stubborn: removed again {again}"));
    }
}

fn factory() -> StateFactory<Arena> {
    StateFactory::new()
        .with::<Idle>()
        .with::<Attack>()
        .with::<Spawner>()
        .with::<Sniper>()
        .with::<OneShot>()
        .with::<Flinch>()
        .with::<Recurse>()
        .with::<Stubborn>()
}

fn arena() -> Registry<Arena> {
    Registry::builder()
        .context(Arena::default())
        .factory(factory())
        .start::<Idle>()
        .allocator(Arc::new(IdAllocator::new()))
        .build()
        .unwrap()
}

fn kinds(registry: &Registry<Arena>) -> Vec<&'static str> {
    registry.active_states().map(|h| h.kind().name()).collect()
}

#[test]
fn start_attack_scenario() {
    let mut registry = arena();

    let start = registry.start_machine().unwrap();
    assert_eq!(start.id().get(), 0);

    let attack = registry.add::<Attack>().unwrap();
    assert_eq!(attack.id().get(), 1);
    assert_eq!(kinds(&registry), vec!["Idle", "Attack"]);

    assert_eq!(registry.remove_all_of::<Idle>(false), 1);
    assert_eq!(kinds(&registry), vec!["Attack"]);

    registry.context_mut().log.clear();
    assert_eq!(registry.update_states().unwrap(), 1);
    assert_eq!(registry.context().log, vec!["Attack: execute"]);
}

#[test]
fn new_attack_replaces_old_one() {
    let mut registry = arena();
    registry.start_machine().unwrap();
    let first = registry.add::<Attack>().unwrap();
    let second = registry.add::<Attack>().unwrap();

    assert!(!registry.contains(first.id()));
    assert!(registry.contains(second.id()));
    assert_eq!(kinds(&registry), vec!["Idle", "Attack"]);
    assert_eq!(
        registry.context().log,
        vec!["Idle: enter", "Attack: enter", "Attack: exit", "Attack: enter"]
    );
}

#[test]
fn states_added_during_tick_run_next_tick() {
    let mut registry = arena();
    registry.add::<Spawner>().unwrap();

    assert_eq!(registry.update_states().unwrap(), 1);
    assert_eq!(kinds(&registry), vec!["Spawner", "Idle"]);
    assert_eq!(
        registry.context().log,
        vec!["Spawner: execute", "Idle: enter"]
    );

    registry.context_mut().log.clear();
    assert_eq!(registry.update_states().unwrap(), 2);
    assert_eq!(
        registry.context().log,
        vec!["Spawner: execute", "Idle: enter", "Idle: execute"]
    );
}

#[test]
fn state_removed_before_its_turn_is_skipped() {
    let mut registry = arena();
    registry.add::<Sniper>().unwrap();
    let idle = registry.add::<Idle>().unwrap();
    registry.context_mut().target = Some(idle.id());
    registry.context_mut().log.clear();

    assert_eq!(registry.update_states().unwrap(), 1);
    assert_eq!(
        registry.context().log,
        vec!["Sniper: execute", "Idle: exit", "Sniper: removed true"]
    );
    assert_eq!(kinds(&registry), vec!["Sniper"]);
}

#[test]
fn state_removed_after_its_turn_ran_once() {
    let mut registry = arena();
    let idle = registry.add::<Idle>().unwrap();
    registry.add::<Sniper>().unwrap();
    registry.context_mut().target = Some(idle.id());
    registry.context_mut().log.clear();

    assert_eq!(registry.update_states().unwrap(), 2);
    assert_eq!(
        registry.context().log,
        vec![
            "Idle: execute",
            "Sniper: execute",
            "Idle: exit",
            "Sniper: removed true",
        ]
    );
}

#[test]
fn self_removal_exits_after_hook_returns() {
    let mut registry = arena();
    let one_shot = registry.add::<OneShot>().unwrap();

    registry.update_states().unwrap();
    registry.update_states().unwrap();

    assert!(!registry.contains(one_shot.id()));
    assert_eq!(
        registry.context().log,
        vec!["OneShot: execute", "OneShot: still running", "OneShot: exit"]
    );

    let events: Vec<_> = registry
        .history()
        .for_state(one_shot.id())
        .iter()
        .map(|r| r.event)
        .collect();
    assert_eq!(
        events,
        vec![
            LifecycleEvent::Entered,
            LifecycleEvent::Exited,
            LifecycleEvent::Removed { exit_called: true },
        ]
    );
}

#[test]
fn state_removing_itself_on_enter_never_executes() {
    let mut registry = arena();
    let flinch = registry.add::<Flinch>().unwrap();

    assert!(!registry.contains(flinch.id()));
    assert!(registry.is_empty());
    assert_eq!(registry.update_states().unwrap(), 0);
    assert_eq!(registry.context().log, vec!["Flinch: enter", "Flinch: exit"]);
}

#[test]
fn nested_tick_is_rejected() {
    let mut registry = arena();
    registry.add::<Recurse>().unwrap();
    registry.add::<Idle>().unwrap();
    registry.context_mut().log.clear();

    assert_eq!(registry.update_states().unwrap(), 2);
    assert_eq!(registry.tick(), 1);
    assert_eq!(registry.context().log, vec!["Idle: execute"]);
    assert_eq!(registry.context().errors.len(), 1);
    assert!(registry.context().errors[0].contains("already running"));
}

#[test]
fn exit_hooks_cannot_add_during_remove_all() {
    let mut registry = arena();
    registry.add::<Stubborn>().unwrap();

    assert_eq!(registry.remove_all_states(true), 1);

    assert!(registry.is_empty());
    assert_eq!(registry.context().errors.len(), 1);
    assert!(registry.context().errors[0].contains("Idle"));
    assert_eq!(registry.context().log, vec!["Stubborn: removed again false"]);
}

#[test]
fn exit_hooks_may_add_during_single_removal() {
    let mut registry = arena();
    let stubborn = registry.add::<Stubborn>().unwrap();

    assert!(registry.remove_state(stubborn.id(), true));

    assert!(registry.context().errors.is_empty());
    assert_eq!(kinds(&registry), vec!["Idle"]);
}

#[test]
fn reset_from_hook_leaves_only_start_state() {
    #[derive(Default)]
    struct Respawn;
    impl State<Arena> for Respawn {
        fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
            scope.registry().reset_machine(true).unwrap();
        }
    }

    let mut registry = Registry::builder()
        .context(Arena::default())
        .factory(factory().with::<Respawn>())
        .start::<Idle>()
        .allocator(Arc::new(IdAllocator::new()))
        .build()
        .unwrap();

    registry.add::<Attack>().unwrap();
    registry.add::<Respawn>().unwrap();
    registry.add::<Spawner>().unwrap();
    registry.update_states().unwrap();

    assert_eq!(kinds(&registry), vec!["Idle"]);
}

#[test]
fn reset_from_hook_exits_running_state_before_restart() {
    #[derive(Default)]
    struct Respawn;
    impl State<Arena> for Respawn {
        fn execute(&mut self, scope: &mut Scope<'_, Arena>) {
            let started = scope.registry().reset_machine(true).unwrap();
            assert!(started.is_none());
        }

        fn exit(&mut self, scope: &mut Scope<'_, Arena>) {
            log(scope, "Respawn: exit");
            if let Err(err) = scope.add::<Spawner>() {
                scope.context_mut().errors.push(err.to_string());
            }
        }
    }

    let mut registry = Registry::builder()
        .context(Arena::default())
        .factory(factory().with::<Respawn>())
        .start::<Idle>()
        .config(RegistryConfig::default().exit_on_reset(true))
        .allocator(Arc::new(IdAllocator::new()))
        .build()
        .unwrap();
    registry.start_machine().unwrap();
    registry.add::<Respawn>().unwrap();
    registry.context_mut().log.clear();

    registry.update_states().unwrap();

    assert_eq!(
        registry.context().log,
        vec!["Idle: execute", "Idle: exit", "Respawn: exit", "Idle: enter"]
    );
    assert_eq!(registry.len(), 1);
    assert_eq!(kinds(&registry), vec!["Idle"]);
    assert_eq!(registry.context().errors.len(), 1);
    assert!(registry.context().errors[0].contains("Spawner"));
}

#[test]
fn reset_with_exit_configured_runs_exit_hooks() {
    let mut registry = Registry::builder()
        .context(Arena::default())
        .factory(factory())
        .start::<Idle>()
        .config(RegistryConfig::default().exit_on_reset(true))
        .allocator(Arc::new(IdAllocator::new()))
        .build()
        .unwrap();
    registry.start_machine().unwrap();
    registry.add::<Attack>().unwrap();
    registry.context_mut().log.clear();

    registry.reset_machine(true).unwrap();

    assert_eq!(
        registry.context().log,
        vec!["Attack: exit", "Idle: exit", "Idle: enter"]
    );
}

#[test]
fn construction_failure_is_surfaced() {
    let mut registry = Registry::builder()
        .context(Arena::default())
        .factory(
            StateFactory::new()
                .with::<Idle>()
                .with_fallible(|| Err::<Attack, _>("no weapon equipped".to_string())),
        )
        .start::<Idle>()
        .build()
        .unwrap();

    let err = registry.add::<Attack>().unwrap_err();
    assert!(matches!(err, RegistryError::ConstructionFailure { kind: "Attack", .. }));
    assert!(err.to_string().contains("no weapon equipped"));
    assert!(registry.is_empty());
}

#[test]
fn ids_are_unique_across_registries_by_default() {
    let build = || {
        Registry::builder()
            .context(Arena::default())
            .factory(factory())
            .start::<Idle>()
            .build()
            .unwrap()
    };
    let mut first = build();
    let mut second = build();

    let a = first.start_machine().unwrap();
    let b = second.start_machine().unwrap();
    let c = first.add::<Attack>().unwrap();

    assert_ne!(first.id(), second.id());
    assert!(b.id() > a.id());
    assert!(c.id() > b.id());
    // A handle from one registry never matches a state in another.
    assert!(!second.remove_state(a.id(), true));
}

#[test]
fn exhausted_allocator_fails_add() {
    let mut registry = Registry::builder()
        .context(Arena::default())
        .factory(factory())
        .start::<Idle>()
        .allocator(Arc::new(IdAllocator::with_ceiling(1)))
        .build()
        .unwrap();

    registry.start_machine().unwrap();
    let err = registry.add::<Attack>().unwrap_err();

    assert!(matches!(err, RegistryError::InvariantViolation(_)));
    assert_eq!(registry.len(), 1);
}
