//! Core [`Component`] trait and the [`TypeToken`] identity value.
//!
//! Every piece of data attached to a holder must implement [`Component`]. The
//! trait requires `Send + Sync + 'static` so components can live in
//! type-erased storage and be shared across threads.
//!
//! ## Type Identity
//!
//! [`TypeToken`] wraps [`std::any::TypeId`], so identity is exact: two tokens
//! compare equal only when they name the same Rust type. A trait object type
//! such as `dyn Swimming` has its own token, distinct from the token of every
//! concrete type implementing the trait. Nothing ever walks from one to the
//! other.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The core component trait.
///
/// All data attached to holders must implement this trait. Implementations
/// are opt-in and empty:
///
/// ```rust
/// use holdfast::Component;
///
/// #[derive(Debug, Clone)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {}
/// ```
///
/// Abstraction keys are traits with `Component` as a supertrait. The trait
/// object type then satisfies the `Component` bound itself and can key a
/// registration:
///
/// ```rust
/// use holdfast::Component;
///
/// trait Swimming: Component {
///     fn speed(&self) -> f32;
/// }
/// ```
pub trait Component: Send + Sync + 'static {}

/// A token identifying a component type at runtime.
///
/// Pairs the type's [`TypeId`] with its name. Equality and hashing use only
/// the `TypeId`; the name is kept for diagnostics and log output.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Returns the token for the component type `C`.
    ///
    /// `C` may be a concrete component type or a trait object type such as
    /// `dyn Swimming`.
    #[must_use]
    pub fn of<C: Component + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// Returns the underlying [`TypeId`].
    #[must_use]
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Returns the component type's name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeToken").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health;
    impl Component for Health {}

    struct Stamina;
    impl Component for Stamina {}

    trait Swimming: Component {}

    struct Goldfish;
    impl Component for Goldfish {}
    impl Swimming for Goldfish {}

    #[test]
    fn test_token_is_stable() {
        assert_eq!(TypeToken::of::<Health>(), TypeToken::of::<Health>());
    }

    #[test]
    fn test_token_differs_between_types() {
        assert_ne!(TypeToken::of::<Health>(), TypeToken::of::<Stamina>());
    }

    #[test]
    fn test_trait_object_token_is_its_own_type() {
        // The abstraction and its implementor are distinct keys.
        assert_ne!(TypeToken::of::<dyn Swimming>(), TypeToken::of::<Goldfish>());
    }

    #[test]
    fn test_token_name_is_diagnostic_only() {
        let token = TypeToken::of::<Health>();
        assert!(token.name().contains("Health"));
        assert_eq!(token.id(), TypeId::of::<Health>());
    }
}
