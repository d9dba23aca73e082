//! Single-owner registry of systems and per-holder components.
//!
//! [`Registry`] is the default storage model: mutation goes through
//! `&mut self`, the borrow checker serialises callers, and the registry
//! holds no locks. Use [`SharedRegistry`](crate::SharedRegistry) when
//! several threads need to mutate the same store.

use std::any::{self, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use tracing::{debug, trace};

use crate::component::{Component, TypeToken};
use crate::filter::Filter;
use crate::holder::Holder;
use crate::slot::Slot;
use crate::system::System;

/// Registry of global systems and per-holder components.
///
/// Registrations are keyed by exact type: registering under a concrete type
/// is invisible to lookups under a trait object key and vice versa. Adding
/// under an occupied key replaces the previous instance; looking up an
/// unregistered key is an ordinary `None`, never an error; removing twice is
/// a no-op the second time.
///
/// A holder the registry has never seen behaves exactly like a holder whose
/// registrations were all removed. Read-only queries materialise nothing.
///
/// # Examples
///
/// ```rust
/// use holdfast::{Component, Registry};
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
/// impl Component for Health {}
///
/// let mut registry = Registry::new();
/// registry.add_component(7u64, Health(100));
/// assert_eq!(registry.get_component::<Health>(&7), Some(&Health(100)));
/// assert!(!registry.has_component::<Health>(&8));
/// ```
pub struct Registry<H: Holder> {
    /// Systems keyed by the `TypeId` of their registration key.
    systems: HashMap<TypeId, Slot>,
    /// Component tables keyed by holder, then by registration key.
    components: HashMap<H, HashMap<TypeId, Slot>>,
}

impl<H: Holder> Registry<H> {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: HashMap::new(),
            components: HashMap::new(),
        }
    }

    // -- Systems --

    /// Register a system under its own concrete type.
    ///
    /// Replaces (and drops) any instance previously registered under `S`.
    /// Returns a mutable borrow of the stored instance.
    pub fn add_system<S: System<H>>(&mut self, system: S) -> &mut S {
        self.add_system_as::<S>(Box::new(system))
    }

    /// Register a system under the explicit key `K`.
    ///
    /// `K` is either a concrete system type or a trait object type such as
    /// `dyn Physics`; building the `Box<K>` at the call site is what proves
    /// the instance satisfies the key. Replaces any previous registration
    /// under `K`.
    pub fn add_system_as<K: System<H> + ?Sized>(&mut self, system: Box<K>) -> &mut K {
        let slot = match self.systems.entry(TypeId::of::<K>()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(Slot::new(system));
                debug!(
                    system = any::type_name::<K>(),
                    replaced = true,
                    "system registered"
                );
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                debug!(
                    system = any::type_name::<K>(),
                    replaced = false,
                    "system registered"
                );
                vacant.insert(Slot::new(system))
            }
        };
        slot.get_mut::<K>()
    }

    /// Returns the system registered under `K`, if any.
    #[must_use]
    pub fn get_system<K: System<H> + ?Sized>(&self) -> Option<&K> {
        self.systems
            .get(&TypeId::of::<K>())
            .map(|slot| slot.get::<K>())
    }

    /// Returns the system registered under `K` mutably, if any.
    #[must_use]
    pub fn get_system_mut<K: System<H> + ?Sized>(&mut self) -> Option<&mut K> {
        self.systems
            .get_mut(&TypeId::of::<K>())
            .map(|slot| slot.get_mut::<K>())
    }

    /// Returns `true` if a system is registered under `K`.
    ///
    /// Agrees with [`get_system`](Registry::get_system) at all times; both
    /// consult the same table.
    #[must_use]
    pub fn has_system<K: System<H> + ?Sized>(&self) -> bool {
        self.systems.contains_key(&TypeId::of::<K>())
    }

    /// Remove and return the system registered under `K`.
    ///
    /// Removing an absent key returns `None`, so removal is idempotent.
    pub fn remove_system<K: System<H> + ?Sized>(&mut self) -> Option<Box<K>> {
        let slot = self.systems.remove(&TypeId::of::<K>())?;
        debug!(system = any::type_name::<K>(), "system removed");
        Some(slot.into_inner::<K>())
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    // -- Components --

    /// Attach a component to `holder` under the component's own type.
    ///
    /// Replaces (and drops) any instance previously registered for the same
    /// holder and key. Returns a mutable borrow of the stored instance.
    pub fn add_component<C: Component>(&mut self, holder: H, component: C) -> &mut C {
        self.add_component_as::<C>(holder, Box::new(component))
    }

    /// Attach a component to `holder` under the explicit key `K`.
    ///
    /// Same key rules as [`add_system_as`](Registry::add_system_as): `K` may
    /// be a trait object type the instance provably implements. Other
    /// holders are unaffected.
    pub fn add_component_as<K: Component + ?Sized>(
        &mut self,
        holder: H,
        component: Box<K>,
    ) -> &mut K {
        let slots = self.components.entry(holder).or_default();
        let slot = match slots.entry(TypeId::of::<K>()) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(Slot::new(component));
                trace!(
                    component = any::type_name::<K>(),
                    replaced = true,
                    "component registered"
                );
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                trace!(
                    component = any::type_name::<K>(),
                    replaced = false,
                    "component registered"
                );
                vacant.insert(Slot::new(component))
            }
        };
        slot.get_mut::<K>()
    }

    /// Returns the component registered for `holder` under `K`, if any.
    #[must_use]
    pub fn get_component<K: Component + ?Sized>(&self, holder: &H) -> Option<&K> {
        self.components
            .get(holder)?
            .get(&TypeId::of::<K>())
            .map(|slot| slot.get::<K>())
    }

    /// Returns the component registered for `holder` under `K` mutably.
    #[must_use]
    pub fn get_component_mut<K: Component + ?Sized>(&mut self, holder: &H) -> Option<&mut K> {
        self.components
            .get_mut(holder)?
            .get_mut(&TypeId::of::<K>())
            .map(|slot| slot.get_mut::<K>())
    }

    /// Returns `true` if `holder` has a registration under `K`.
    ///
    /// Agrees with [`get_component`](Registry::get_component) at all times;
    /// both consult the same table.
    #[must_use]
    pub fn has_component<K: Component + ?Sized>(&self, holder: &H) -> bool {
        self.components
            .get(holder)
            .map(|slots| slots.contains_key(&TypeId::of::<K>()))
            .unwrap_or(false)
    }

    /// Token-keyed variant of [`has_component`](Registry::has_component),
    /// for callers that carry a [`TypeToken`] instead of a type parameter.
    #[must_use]
    pub fn has_component_token(&self, holder: &H, token: TypeToken) -> bool {
        self.components
            .get(holder)
            .map(|slots| slots.contains_key(&token.id()))
            .unwrap_or(false)
    }

    /// Remove and return the component registered for `holder` under `K`.
    ///
    /// Idempotent. Removing the holder's last component also releases the
    /// holder's table, so an emptied holder does not linger in
    /// [`holder_count`](Registry::holder_count).
    pub fn remove_component<K: Component + ?Sized>(&mut self, holder: &H) -> Option<Box<K>> {
        let slots = self.components.get_mut(holder)?;
        let slot = slots.remove(&TypeId::of::<K>())?;
        if slots.is_empty() {
            self.components.remove(holder);
        }
        trace!(component = any::type_name::<K>(), "component removed");
        Some(slot.into_inner::<K>())
    }

    /// Remove every component attached to `holder`.
    ///
    /// Returns how many registrations were dropped. Holders unknown to the
    /// registry yield `0`.
    pub fn remove_holder(&mut self, holder: &H) -> usize {
        match self.components.remove(holder) {
            Some(slots) => {
                debug!(components = slots.len(), "holder cleared");
                slots.len()
            }
            None => 0,
        }
    }

    /// Number of components attached to `holder`.
    #[must_use]
    pub fn component_count(&self, holder: &H) -> usize {
        self.components
            .get(holder)
            .map(|slots| slots.len())
            .unwrap_or(0)
    }

    /// Number of holders with at least one component.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.components.len()
    }

    // -- Filter matching --

    /// Returns `true` if `holder` carries every component type in `filter`.
    ///
    /// The empty filter matches every holder, registered or not.
    #[must_use]
    pub fn holder_matches(&self, holder: &H, filter: &Filter) -> bool {
        match self.components.get(holder) {
            Some(slots) => filter
                .keys()
                .iter()
                .all(|token| slots.contains_key(&token.id())),
            None => filter.is_empty(),
        }
    }

    /// Iterate over the holders that satisfy `filter`.
    ///
    /// Only holders with at least one component can be enumerated; a holder
    /// the registry has never seen matches the empty filter under
    /// [`holder_matches`](Registry::holder_matches) but cannot appear here.
    pub fn holders_matching<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a H> + 'a {
        self.components
            .iter()
            .filter(move |(_, slots)| {
                filter
                    .keys()
                    .iter()
                    .all(|token| slots.contains_key(&token.id()))
            })
            .map(|(holder, _)| holder)
    }
}

impl<H: Holder> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Holder> fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("systems", &self.systems.len())
            .field("holders", &self.components.len())
            .finish()
    }
}
