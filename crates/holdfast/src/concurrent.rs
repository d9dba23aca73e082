//! Concurrent registry with shared-handle semantics.
//!
//! [`SharedRegistry`] is the thread-safe model: every operation takes
//! `&self`, registrations are stored behind [`Arc`], and lookups hand out
//! owning clones instead of borrows. Override stays atomic per key, so a
//! racing add and get observe a complete before or after value, never a torn
//! one. A check followed by an add is still two separate operations; use the
//! `*_if_absent` primitives when the check and the insert must win or lose
//! together.
//!
//! Component state mutated after registration needs its own interior
//! mutability; the registry only hands out shared handles.

use std::any::{self, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::component::{Component, TypeToken};
use crate::filter::Filter;
use crate::holder::Holder;
use crate::slot::SharedSlot;
use crate::system::System;

/// Lock-based registry of global systems and per-holder components.
///
/// Keying, override, absence, and idempotent-removal rules are identical to
/// [`Registry`](crate::Registry); only the access model differs. Lookups
/// return [`Arc`] handles that stay valid after the registration is
/// overridden or removed.
pub struct SharedRegistry<H: Holder> {
    /// Systems keyed by the `TypeId` of their registration key.
    systems: DashMap<TypeId, SharedSlot>,
    /// Component tables keyed by holder, then by registration key.
    components: DashMap<H, HashMap<TypeId, SharedSlot>>,
}

impl<H: Holder> SharedRegistry<H> {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: DashMap::new(),
            components: DashMap::new(),
        }
    }

    // -- Systems --

    /// Register a system under its own concrete type, replacing any previous
    /// registration. Returns a handle to the stored instance.
    pub fn add_system<S: System<H>>(&self, system: S) -> Arc<S> {
        self.add_system_as::<S>(Arc::new(system))
    }

    /// Register a system under the explicit key `K`, replacing any previous
    /// registration under `K`.
    pub fn add_system_as<K: System<H> + ?Sized>(&self, system: Arc<K>) -> Arc<K> {
        let handle = Arc::clone(&system);
        let replaced = self
            .systems
            .insert(TypeId::of::<K>(), SharedSlot::new(system))
            .is_some();
        debug!(system = any::type_name::<K>(), replaced, "system registered");
        handle
    }

    /// Register `system` only if nothing is registered under `S` yet.
    ///
    /// The check and the insert run under one lock, so exactly one caller
    /// wins a race. Everyone receives a handle to the instance that ended up
    /// stored; a losing instance is dropped.
    pub fn add_system_if_absent<S: System<H>>(&self, system: S) -> Arc<S> {
        let entry = self
            .systems
            .entry(TypeId::of::<S>())
            .or_insert_with(|| SharedSlot::new(Arc::new(system)));
        entry.value().get::<S>()
    }

    /// Returns a handle to the system registered under `K`, if any.
    #[must_use]
    pub fn get_system<K: System<H> + ?Sized>(&self) -> Option<Arc<K>> {
        self.systems
            .get(&TypeId::of::<K>())
            .map(|slot| slot.get::<K>())
    }

    /// Returns `true` if a system is registered under `K`.
    #[must_use]
    pub fn has_system<K: System<H> + ?Sized>(&self) -> bool {
        self.systems.contains_key(&TypeId::of::<K>())
    }

    /// Remove the system registered under `K`, returning its handle.
    ///
    /// Removing an absent key returns `None`, so removal is idempotent.
    pub fn remove_system<K: System<H> + ?Sized>(&self) -> Option<Arc<K>> {
        let (_, slot) = self.systems.remove(&TypeId::of::<K>())?;
        debug!(system = any::type_name::<K>(), "system removed");
        Some(slot.into_inner::<K>())
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    // -- Components --

    /// Attach a component to `holder` under the component's own type,
    /// replacing any previous registration for that holder and key.
    pub fn add_component<C: Component>(&self, holder: H, component: C) -> Arc<C> {
        self.add_component_as::<C>(holder, Arc::new(component))
    }

    /// Attach a component to `holder` under the explicit key `K`, replacing
    /// any previous registration for that holder and key.
    pub fn add_component_as<K: Component + ?Sized>(&self, holder: H, component: Arc<K>) -> Arc<K> {
        let handle = Arc::clone(&component);
        let mut slots = self.components.entry(holder).or_default();
        let replaced = slots
            .insert(TypeId::of::<K>(), SharedSlot::new(component))
            .is_some();
        trace!(
            component = any::type_name::<K>(),
            replaced,
            "component registered"
        );
        handle
    }

    /// Attach `component` to `holder` only if the key `C` is still free
    /// there.
    ///
    /// Same single-lock guarantee as
    /// [`add_system_if_absent`](SharedRegistry::add_system_if_absent).
    pub fn add_component_if_absent<C: Component>(&self, holder: H, component: C) -> Arc<C> {
        let mut slots = self.components.entry(holder).or_default();
        let slot = slots
            .entry(TypeId::of::<C>())
            .or_insert_with(|| SharedSlot::new(Arc::new(component)));
        slot.get::<C>()
    }

    /// Returns a handle to the component registered for `holder` under `K`.
    #[must_use]
    pub fn get_component<K: Component + ?Sized>(&self, holder: &H) -> Option<Arc<K>> {
        let slots = self.components.get(holder)?;
        let slot = slots.get(&TypeId::of::<K>())?;
        Some(slot.get::<K>())
    }

    /// Returns `true` if `holder` has a registration under `K`.
    #[must_use]
    pub fn has_component<K: Component + ?Sized>(&self, holder: &H) -> bool {
        self.components
            .get(holder)
            .map(|slots| slots.contains_key(&TypeId::of::<K>()))
            .unwrap_or(false)
    }

    /// Token-keyed variant of
    /// [`has_component`](SharedRegistry::has_component).
    #[must_use]
    pub fn has_component_token(&self, holder: &H, token: TypeToken) -> bool {
        self.components
            .get(holder)
            .map(|slots| slots.contains_key(&token.id()))
            .unwrap_or(false)
    }

    /// Remove the component registered for `holder` under `K`, returning its
    /// handle. Idempotent.
    pub fn remove_component<K: Component + ?Sized>(&self, holder: &H) -> Option<Arc<K>> {
        let slot = {
            let mut slots = self.components.get_mut(holder)?;
            slots.remove(&TypeId::of::<K>())?
        };
        // The guard above must be released first; pruning re-checks
        // emptiness under the shard lock.
        self.components.remove_if(holder, |_, slots| slots.is_empty());
        trace!(component = any::type_name::<K>(), "component removed");
        Some(slot.into_inner::<K>())
    }

    /// Remove every component attached to `holder`, returning how many there
    /// were.
    pub fn remove_holder(&self, holder: &H) -> usize {
        match self.components.remove(holder) {
            Some((_, slots)) => {
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

    /// Holders that satisfy `filter` at the moment each shard is visited.
    ///
    /// The result is weakly consistent: holders added or removed while the
    /// scan runs may or may not appear.
    #[must_use]
    pub fn holders_matching(&self, filter: &Filter) -> Vec<H>
    where
        H: Clone,
    {
        self.components
            .iter()
            .filter(|entry| {
                filter
                    .keys()
                    .iter()
                    .all(|token| entry.value().contains_key(&token.id()))
            })
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl<H: Holder> Default for SharedRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Holder> fmt::Debug for SharedRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("systems", &self.systems.len())
            .field("holders", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter {
        value: u32,
    }
    impl Component for Counter {}

    #[derive(Debug, PartialEq)]
    struct Label {
        text: &'static str,
    }
    impl Component for Label {}

    struct Heartbeat {
        filter: Filter,
    }
    impl Heartbeat {
        fn new() -> Self {
            Self {
                filter: Filter::new().with::<Counter>(),
            }
        }
    }
    impl System<u32> for Heartbeat {
        fn filter(&self) -> &Filter {
            &self.filter
        }
    }

    trait Patrol: System<u32> {
        fn pace(&self) -> f32;
    }

    struct SlowPatrol {
        filter: Filter,
    }
    impl SlowPatrol {
        fn new() -> Self {
            Self {
                filter: Filter::new().with::<Counter>(),
            }
        }
    }
    impl System<u32> for SlowPatrol {
        fn filter(&self) -> &Filter {
            &self.filter
        }
    }
    impl Patrol for SlowPatrol {
        fn pace(&self) -> f32 {
            1.0
        }
    }

    struct QuickPatrol {
        filter: Filter,
    }
    impl QuickPatrol {
        fn new() -> Self {
            Self {
                filter: Filter::new().with::<Counter>(),
            }
        }
    }
    impl System<u32> for QuickPatrol {
        fn filter(&self) -> &Filter {
            &self.filter
        }
    }
    impl Patrol for QuickPatrol {
        fn pace(&self) -> f32 {
            4.0
        }
    }

    #[test]
    fn test_add_then_get_returns_the_same_instance() {
        let registry = SharedRegistry::new();
        let stored = registry.add_component(1u32, Counter { value: 3 });
        let fetched = registry.get_component::<Counter>(&1).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
        assert!(registry.has_component::<Counter>(&1));
    }

    #[test]
    fn test_absent_is_none() {
        let registry = SharedRegistry::<u32>::new();
        assert!(registry.get_component::<Counter>(&1).is_none());
        assert!(registry.get_system::<Heartbeat>().is_none());
        assert!(!registry.has_component::<Counter>(&1));
        assert!(!registry.has_system::<Heartbeat>());
    }

    #[test]
    fn test_override_replaces_the_stored_handle() {
        let registry = SharedRegistry::new();
        let first = registry.add_component(1u32, Counter { value: 1 });
        let second = registry.add_component(1u32, Counter { value: 2 });

        let fetched = registry.get_component::<Counter>(&1).unwrap();
        assert!(Arc::ptr_eq(&second, &fetched));
        assert!(!Arc::ptr_eq(&first, &fetched));
        assert_eq!(registry.component_count(&1), 1);

        // The displaced handle stays usable.
        assert_eq!(first.value, 1);
    }

    #[test]
    fn test_system_override_under_trait_key() {
        let registry = SharedRegistry::<u32>::new();
        registry.add_system_as::<dyn Patrol>(Arc::new(SlowPatrol::new()));
        registry.add_system_as::<dyn Patrol>(Arc::new(QuickPatrol::new()));

        assert_eq!(registry.get_system::<dyn Patrol>().unwrap().pace(), 4.0);
        assert_eq!(registry.system_count(), 1);
        // The trait key says nothing about the concrete types.
        assert!(!registry.has_system::<SlowPatrol>());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SharedRegistry::new();
        registry.add_component(1u32, Counter { value: 1 });
        assert!(registry.remove_component::<Counter>(&1).is_some());
        assert!(registry.remove_component::<Counter>(&1).is_none());

        registry.add_system(Heartbeat::new());
        assert!(registry.remove_system::<Heartbeat>().is_some());
        assert!(registry.remove_system::<Heartbeat>().is_none());
    }

    #[test]
    fn test_removing_last_component_releases_the_holder() {
        let registry = SharedRegistry::new();
        registry.add_component(1u32, Counter { value: 1 });
        registry.add_component(1u32, Label { text: "scout" });
        assert_eq!(registry.holder_count(), 1);

        registry.remove_component::<Counter>(&1);
        assert_eq!(registry.holder_count(), 1);
        registry.remove_component::<Label>(&1);
        assert_eq!(registry.holder_count(), 0);
    }

    #[test]
    fn test_holders_are_independent() {
        let registry = SharedRegistry::new();
        registry.add_component(1u32, Counter { value: 1 });
        registry.add_component(2u32, Label { text: "guard" });
        assert!(!registry.has_component::<Label>(&1));
        assert!(!registry.has_component::<Counter>(&2));
        assert_eq!(registry.get_component::<Label>(&2).unwrap().text, "guard");
    }

    #[test]
    fn test_if_absent_inserts_when_the_key_is_free() {
        let registry = SharedRegistry::new();
        let stored = registry.add_component_if_absent(1u32, Counter { value: 9 });
        let fetched = registry.get_component::<Counter>(&1).unwrap();
        assert!(Arc::ptr_eq(&stored, &fetched));
    }

    #[test]
    fn test_if_absent_yields_the_incumbent() {
        let registry = SharedRegistry::new();
        let incumbent = registry.add_component(1u32, Counter { value: 1 });
        let returned = registry.add_component_if_absent(1u32, Counter { value: 2 });
        assert!(Arc::ptr_eq(&incumbent, &returned));
        assert_eq!(returned.value, 1);

        let system = registry.add_system(Heartbeat::new());
        let returned = registry.add_system_if_absent(Heartbeat::new());
        assert!(Arc::ptr_eq(&system, &returned));
    }

    #[test]
    fn test_if_absent_single_winner_under_contention() {
        let registry = SharedRegistry::<u32>::new();
        let handles: Vec<Arc<Counter>> = thread::scope(|scope| {
            let mut joins = Vec::new();
            for value in 0..8u32 {
                let registry = &registry;
                joins.push(scope.spawn(move || {
                    registry.add_component_if_absent(1, Counter { value })
                }));
            }
            joins.into_iter().map(|join| join.join().unwrap()).collect()
        });

        for handle in &handles {
            assert!(Arc::ptr_eq(&handles[0], handle));
        }
        assert_eq!(registry.component_count(&1), 1);
    }

    #[test]
    fn test_concurrent_adds_land_complete() {
        let registry = SharedRegistry::<u32>::new();
        thread::scope(|scope| {
            for holder in 0..4u32 {
                let registry = &registry;
                scope.spawn(move || {
                    for value in 0..25 {
                        registry.add_component(holder, Counter { value });
                        assert!(registry.get_component::<Counter>(&holder).is_some());
                    }
                });
            }
        });

        assert_eq!(registry.holder_count(), 4);
        for holder in 0..4u32 {
            let counter = registry.get_component::<Counter>(&holder).unwrap();
            assert_eq!(counter.value, 24);
        }
    }

    #[test]
    fn test_holder_matches_and_matching_agree() {
        let registry = SharedRegistry::new();
        registry.add_component(1u32, Counter { value: 1 });
        registry.add_component(1u32, Label { text: "scout" });
        registry.add_component(2u32, Counter { value: 2 });

        let wants_both = Filter::new().with::<Counter>().with::<Label>();
        assert!(registry.holder_matches(&1, &wants_both));
        assert!(!registry.holder_matches(&2, &wants_both));
        assert_eq!(registry.holders_matching(&wants_both), vec![1]);

        let mut all = registry.holders_matching(&Filter::new());
        all.sort_unstable();
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn test_shared_registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedRegistry<u32>>();
    }
}
