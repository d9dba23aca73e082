//! Component signatures for system matching.
//!
//! A [`Filter`] is an immutable, ordered sequence of component type tokens.
//! Systems expose one to declare which components a holder must carry to be
//! worth processing. Order and duplicates are preserved exactly as given;
//! the filter imposes no set semantics of its own.

use crate::component::{Component, TypeToken};

/// An immutable, ordered list of component types a system requires.
///
/// Built either with the consuming [`with`](Filter::with) chain or from an
/// existing token slice. Construction copies its input, so later changes to
/// the caller's buffer never show through. The only read access is the
/// [`keys`](Filter::keys) slice view.
///
/// `Filter` deliberately implements no equality. Callers that compare
/// signatures decide for themselves whether order and multiplicity matter.
///
/// # Examples
///
/// ```rust
/// use holdfast::{Component, Filter};
///
/// struct Position;
/// struct Velocity;
/// impl Component for Position {}
/// impl Component for Velocity {}
///
/// let filter = Filter::new().with::<Position>().with::<Velocity>();
/// assert_eq!(filter.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    keys: Vec<TypeToken>,
}

impl Filter {
    /// Create an empty filter. An empty filter matches every holder.
    #[must_use]
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Append the component type `C` to the signature.
    ///
    /// Duplicates are kept; the sequence preserves call order.
    #[must_use]
    pub fn with<C: Component + ?Sized>(mut self) -> Self {
        self.keys.push(TypeToken::of::<C>());
        self
    }

    /// Build a filter from an existing token sequence.
    ///
    /// The tokens are copied; the filter never aliases the caller's buffer.
    #[must_use]
    pub fn from_tokens(tokens: &[TypeToken]) -> Self {
        Self {
            keys: tokens.to_vec(),
        }
    }

    /// The ordered component signature, exactly as constructed.
    #[must_use]
    pub fn keys(&self) -> &[TypeToken] {
        &self.keys
    }

    /// Returns `true` if `token` appears anywhere in the signature.
    #[must_use]
    pub fn contains(&self, token: TypeToken) -> bool {
        self.keys.contains(&token)
    }

    /// Number of entries in the signature, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the signature has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    impl Component for Position {}

    struct Velocity;
    impl Component for Velocity {}

    trait Swimming: Component {}

    #[test]
    fn test_empty_filter() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.len(), 0);
        assert!(filter.keys().is_empty());
    }

    #[test]
    fn test_with_chain_preserves_call_order() {
        let filter = Filter::new().with::<Position>().with::<Velocity>();
        assert_eq!(
            filter.keys(),
            &[TypeToken::of::<Position>(), TypeToken::of::<Velocity>()]
        );
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        // [Position, Velocity, Position] stays a three-entry sequence.
        let filter = Filter::new()
            .with::<Position>()
            .with::<Velocity>()
            .with::<Position>();
        assert_eq!(filter.len(), 3);
        assert_eq!(
            filter.keys(),
            &[
                TypeToken::of::<Position>(),
                TypeToken::of::<Velocity>(),
                TypeToken::of::<Position>(),
            ]
        );
    }

    #[test]
    fn test_from_tokens_copies_the_input() {
        let mut tokens = vec![TypeToken::of::<Position>()];
        let filter = Filter::from_tokens(&tokens);
        tokens.push(TypeToken::of::<Velocity>());
        tokens.clear();
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.keys(), &[TypeToken::of::<Position>()]);
    }

    #[test]
    fn test_contains() {
        let filter = Filter::new().with::<Position>();
        assert!(filter.contains(TypeToken::of::<Position>()));
        assert!(!filter.contains(TypeToken::of::<Velocity>()));
    }

    #[test]
    fn test_trait_object_entry() {
        let filter = Filter::new().with::<dyn Swimming>();
        assert!(filter.contains(TypeToken::of::<dyn Swimming>()));
    }
}
