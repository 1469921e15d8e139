//! Explicit construction of state variants.
//!
//! A [`StateFactory`] maps each [`StateKind`] to a constructor closure. The
//! registry never builds states any other way, so asking for a kind without
//! a constructor is a [`RegistryError::ConstructionFailure`] rather than an
//! invalid handle.

use crate::core::{State, StateKind};
use crate::error::RegistryError;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Constructor<C> = Box<dyn Fn() -> Result<Box<dyn State<C>>, String>>;

/// A freshly constructed state and the families its kind belongs to.
pub struct Constructed<C> {
    pub state: Box<dyn State<C>>,
    pub families: Rc<[StateKind]>,
}

/// Constructor table keyed by variant.
///
/// # Example
///
/// ```rust
/// use statesoup::core::{State, StateKind};
/// use statesoup::factory::StateFactory;
///
/// struct Fighter;
///
/// #[derive(Default)]
/// struct Jab;
/// impl State<Fighter> for Jab {}
///
/// struct Punch;
///
/// let factory = StateFactory::<Fighter>::new()
///     .with::<Jab>()
///     .is_a::<Jab, Punch>();
///
/// assert!(factory.contains(StateKind::of::<Jab>()));
/// assert!(factory.construct(StateKind::of::<Jab>()).is_ok());
/// ```
pub struct StateFactory<C> {
    constructors: HashMap<StateKind, Constructor<C>>,
    families: HashMap<StateKind, Vec<StateKind>>,
}

impl<C: 'static> StateFactory<C> {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
            families: HashMap::new(),
        }
    }

    /// Register `T` using its `Default` implementation.
    pub fn with<T>(self) -> Self
    where
        T: State<C> + Default,
    {
        self.with_fn(T::default)
    }

    /// Register `T` with an infallible constructor.
    pub fn with_fn<T, F>(self, ctor: F) -> Self
    where
        T: State<C>,
        F: Fn() -> T + 'static,
    {
        self.with_fallible(move || Ok(ctor()))
    }

    /// Register `T` with a constructor that may refuse to build it.
    ///
    /// The error message ends up in [`RegistryError::ConstructionFailure`].
    pub fn with_fallible<T, F>(mut self, ctor: F) -> Self
    where
        T: State<C>,
        F: Fn() -> Result<T, String> + 'static,
    {
        let constructor: Constructor<C> =
            Box::new(move || ctor().map(|state| Box::new(state) as Box<dyn State<C>>));
        self.constructors.insert(StateKind::of::<T>(), constructor);
        self
    }

    /// Declare that `T` belongs to the family `Family`.
    ///
    /// `Family` can be any `'static` type, typically an empty marker struct.
    /// Families are consulted by [`MatchPolicy::IsA`](crate::registry::MatchPolicy::IsA).
    pub fn is_a<T: 'static, Family: 'static>(mut self) -> Self {
        let family = StateKind::of::<Family>();
        let entry = self.families.entry(StateKind::of::<T>()).or_default();
        if !entry.contains(&family) {
            entry.push(family);
        }
        self
    }

    /// Whether a constructor is registered for `kind`.
    pub fn contains(&self, kind: StateKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Families declared for `kind`, in declaration order.
    pub fn families_of(&self, kind: StateKind) -> &[StateKind] {
        self.families.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of registered variants.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Build a new instance of `kind`.
    pub fn construct(&self, kind: StateKind) -> Result<Constructed<C>, RegistryError> {
        let ctor = self
            .constructors
            .get(&kind)
            .ok_or_else(|| RegistryError::construction(kind.name(), "no constructor registered"))?;
        let state = ctor().map_err(|reason| RegistryError::construction(kind.name(), reason))?;
        Ok(Constructed {
            state,
            families: self.families_of(kind).into(),
        })
    }
}

impl<C: 'static> Default for StateFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for StateFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateFactory")
            .field("kinds", &self.constructors.keys().collect::<Vec<_>>())
            .field("families", &self.families)
            .finish()
    }
}
