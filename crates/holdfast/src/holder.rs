//! Holder identity bound.

/// Types that can hold component registrations.
///
/// Blanket-implemented for every type usable as a hash-map key and shareable
/// across threads. Holders are pure identities: the registry never inspects
/// them beyond equality and hashing, and attaches no meaning to their
/// contents.
pub trait Holder: Eq + std::hash::Hash + Send + Sync + 'static {}

impl<T: Eq + std::hash::Hash + Send + Sync + 'static> Holder for T {}
