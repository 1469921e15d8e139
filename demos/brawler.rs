//! Brawler
//!
//! A fighter whose behavior is a soup of concurrently active states.
//!
//! Key concepts:
//! - A start state that establishes the context's defaults
//! - Exclusive states that remove their competitors on enter
//! - States that remove themselves after a few ticks
//! - Family matching with `MatchPolicy::IsA`
//!
//! Run with: RUST_LOG=statesoup=debug cargo run --example brawler

use statesoup::core::State;
use statesoup::factory::StateFactory;
use statesoup::registry::{MatchPolicy, Registry, RegistryConfig, Scope};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Fighter {
    health: i32,
    stamina: i32,
    combo: u32,
}

/// Family tag for every attack.
struct Offense;

#[derive(Default)]
struct Spawn;
impl State<Fighter> for Spawn {
    fn name(&self) -> Option<&str> {
        Some("Spawn")
    }

    fn enter(&mut self, scope: &mut Scope<'_, Fighter>) {
        *scope.context_mut() = Fighter {
            health: 100,
            stamina: 10,
            combo: 0,
        };
    }

    fn execute(&mut self, scope: &mut Scope<'_, Fighter>) {
        let fighter = scope.context_mut();
        fighter.stamina = (fighter.stamina + 1).min(10);
    }
}

#[derive(Default)]
struct Jab {
    frames: u32,
}
impl State<Fighter> for Jab {
    fn enter(&mut self, scope: &mut Scope<'_, Fighter>) {
        scope.remove_others_of::<Offense>(true);
    }

    fn execute(&mut self, scope: &mut Scope<'_, Fighter>) {
        self.frames += 1;
        let fighter = scope.context_mut();
        fighter.stamina -= 1;
        fighter.combo += 1;
        if self.frames == 2 {
            scope.remove_self(true);
        }
    }

    fn exit(&mut self, scope: &mut Scope<'_, Fighter>) {
        println!("  jab finished, combo {}", scope.context().combo);
    }
}

#[derive(Default)]
struct Haymaker;
impl State<Fighter> for Haymaker {
    fn enter(&mut self, scope: &mut Scope<'_, Fighter>) {
        scope.remove_others_of::<Offense>(true);
    }

    fn execute(&mut self, scope: &mut Scope<'_, Fighter>) {
        let fighter = scope.context_mut();
        fighter.stamina -= 4;
        fighter.combo = 0;
        if fighter.stamina <= 0 {
            scope.remove_self(true);
        }
    }

    fn exit(&mut self, _scope: &mut Scope<'_, Fighter>) {
        println!("  haymaker exhausted");
    }
}

fn main() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    println!("=== Brawler ===\n");

    let factory = StateFactory::new()
        .with::<Spawn>()
        .with::<Jab>()
        .with::<Haymaker>()
        .is_a::<Jab, Offense>()
        .is_a::<Haymaker, Offense>();

    let mut registry = match Registry::builder()
        .context(Fighter::default())
        .factory(factory)
        .start::<Spawn>()
        .config(RegistryConfig::default().match_policy(MatchPolicy::IsA))
        .build()
    {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("failed to build registry: {err}");
            return;
        }
    };

    if let Err(err) = registry.start_machine() {
        eprintln!("failed to start: {err}");
        return;
    }

    let script: [&[&str]; 6] = [&["jab"], &[], &["haymaker"], &[], &["jab"], &[]];
    for (frame, inputs) in script.iter().enumerate() {
        for input in *inputs {
            let result = match *input {
                "jab" => registry.add::<Jab>(),
                _ => registry.add::<Haymaker>(),
            };
            if let Err(err) = result {
                eprintln!("  {input} rejected: {err}");
            }
        }

        if let Err(err) = registry.update_states() {
            eprintln!("tick failed: {err}");
            break;
        }

        let active: Vec<String> = registry.active_states().map(|h| h.to_string()).collect();
        println!("frame {frame}: {:?} active={active:?}", registry.context());
    }

    println!("\nRespawning...");
    if let Err(err) = registry.reset_machine(true) {
        eprintln!("failed to respawn: {err}");
    }
    println!("after reset: {:?}", registry.context());

    println!("\nLifecycle history:");
    for record in registry.history().records() {
        println!("  tick {:>2} {}{} {:?}", record.tick, record.kind, record.state, record.event);
    }
    if let Some(span) = registry.history().duration() {
        println!("  spanning {span:?}");
    }

    println!("\n=== Example Complete ===");
}
