//! The `State` trait and the `StateKind` variant tag.
//!
//! A state is a unit of behavior bound to one context. Many states can be
//! active for the same context at once; each receives `enter` when it is
//! added, `execute` once per tick, and `exit` when it is removed.

use crate::registry::Scope;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Upcast helper so boxed states can be downcast to their concrete type.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior unit driven by a [`Registry`](crate::registry::Registry).
///
/// All hooks default to no-ops. Every hook receives a [`Scope`] that exposes
/// the bound context and the owning registry, so a state may add or remove
/// other states (or itself) while it runs.
///
/// # Example
///
/// ```rust
/// use statesoup::core::State;
/// use statesoup::registry::Scope;
///
/// struct Player {
///     stamina: u32,
/// }
///
/// #[derive(Default)]
/// struct Sprint;
///
/// impl State<Player> for Sprint {
///     fn name(&self) -> Option<&str> {
///         Some("Sprint")
///     }
///
///     fn execute(&mut self, scope: &mut Scope<'_, Player>) {
///         let player = scope.context_mut();
///         player.stamina = player.stamina.saturating_sub(1);
///         if player.stamina == 0 {
///             scope.remove_self(true);
///         }
///     }
/// }
/// ```
pub trait State<C>: AsAny {
    /// Optional display name used in logs and handles.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Called once, right after the state is bound and appended.
    fn enter(&mut self, _scope: &mut Scope<'_, C>) {}

    /// Called once per tick while the state is active.
    fn execute(&mut self, _scope: &mut Scope<'_, C>) {}

    /// Called when the state is removed with exit requested.
    fn exit(&mut self, _scope: &mut Scope<'_, C>) {}
}

/// Lightweight tag identifying a state variant or a variant family.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct StateKind {
    type_id: TypeId,
    name: &'static str,
}

impl StateKind {
    /// Tag for the type `T`.
    ///
    /// `T` does not need to implement [`State`]: marker types work as
    /// family tags.
    pub fn of<T: 'static>() -> Self {
        let full = type_name::<T>();
        let name = full.rsplit("::").next().unwrap_or(full);
        Self {
            type_id: TypeId::of::<T>(),
            name,
        }
    }

    /// Short type name of the tagged variant.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this tag refers to `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for StateKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for StateKind {}

impl Hash for StateKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateKind").field(&self.name).finish()
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
