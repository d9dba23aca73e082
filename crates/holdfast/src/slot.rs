//! Type-erased storage cells for registrations.
//!
//! A slot owns exactly one registration. The outer box erases the key type
//! `K` so heterogeneous registrations can share one map; the inner `Box<K>`
//! (or `Arc<K>` for the shared variant) keeps `K` itself possibly unsized,
//! which is what lets trait object types act as registration keys.
//!
//! Slots live in maps keyed by the `TypeId` of the `K` they were built for,
//! so accessors take the matching `K` as an invariant. A mismatched downcast
//! means a bug in this crate and panics.

use std::any::{self, Any};
use std::sync::Arc;

/// An exclusively owned registration of some key type `K`.
pub(crate) struct Slot {
    cell: Box<dyn Any + Send + Sync>,
}

impl Slot {
    pub(crate) fn new<K: ?Sized + Send + Sync + 'static>(value: Box<K>) -> Self {
        Self {
            cell: Box::new(value),
        }
    }

    pub(crate) fn get<K: ?Sized + 'static>(&self) -> &K {
        match self.cell.downcast_ref::<Box<K>>() {
            Some(value) => &**value,
            None => panic!("slot does not hold {}", any::type_name::<K>()),
        }
    }

    pub(crate) fn get_mut<K: ?Sized + 'static>(&mut self) -> &mut K {
        match self.cell.downcast_mut::<Box<K>>() {
            Some(value) => &mut **value,
            None => panic!("slot does not hold {}", any::type_name::<K>()),
        }
    }

    pub(crate) fn into_inner<K: ?Sized + 'static>(self) -> Box<K> {
        match self.cell.downcast::<Box<K>>() {
            Ok(value) => *value,
            Err(_) => panic!("slot does not hold {}", any::type_name::<K>()),
        }
    }
}

/// A shared registration of some key type `K`, handed out as [`Arc`] clones.
pub(crate) struct SharedSlot {
    cell: Box<dyn Any + Send + Sync>,
}

impl SharedSlot {
    pub(crate) fn new<K: ?Sized + Send + Sync + 'static>(value: Arc<K>) -> Self {
        Self {
            cell: Box::new(value),
        }
    }

    pub(crate) fn get<K: ?Sized + 'static>(&self) -> Arc<K> {
        match self.cell.downcast_ref::<Arc<K>>() {
            Some(value) => Arc::clone(value),
            None => panic!("slot does not hold {}", any::type_name::<K>()),
        }
    }

    pub(crate) fn into_inner<K: ?Sized + 'static>(self) -> Arc<K> {
        match self.cell.downcast::<Arc<K>>() {
            Ok(value) => *value,
            Err(_) => panic!("slot does not hold {}", any::type_name::<K>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync + 'static {
        fn greet(&self) -> &'static str;
    }

    struct Terse;
    impl Greeter for Terse {
        fn greet(&self) -> &'static str {
            "hi"
        }
    }

    #[test]
    fn test_slot_roundtrip() {
        let mut slot = Slot::new(Box::new(41u32));
        assert_eq!(*slot.get::<u32>(), 41);
        *slot.get_mut::<u32>() += 1;
        assert_eq!(*slot.into_inner::<u32>(), 42);
    }

    #[test]
    fn test_slot_holds_trait_objects() {
        let boxed: Box<dyn Greeter> = Box::new(Terse);
        let slot = Slot::new(boxed);
        assert_eq!(slot.get::<dyn Greeter>().greet(), "hi");
    }

    #[test]
    fn test_shared_slot_clones_the_handle() {
        let original = Arc::new(7i64);
        let slot = SharedSlot::new(Arc::clone(&original));
        let out = slot.get::<i64>();
        assert!(Arc::ptr_eq(&original, &out));
        assert!(Arc::ptr_eq(&original, &slot.into_inner::<i64>()));
    }

    #[test]
    #[should_panic(expected = "slot does not hold")]
    fn test_mismatched_access_panics() {
        let slot = Slot::new(Box::new(1u8));
        let _ = slot.get::<u16>();
    }
}
