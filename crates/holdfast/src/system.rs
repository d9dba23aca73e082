//! The [`System`] trait for holder-scoped processing logic.

use crate::filter::Filter;
use crate::holder::Holder;

/// A unit of processing logic registered globally for a holder type.
///
/// A system announces the component types it needs through its [`Filter`];
/// holders carrying all of those components are the ones the system should
/// process. Driving the actual processing loop is the caller's job: the
/// registry stores systems and answers matching queries, nothing more.
///
/// Abstraction keys are traits with `System<H>` as a supertrait:
///
/// ```rust
/// use holdfast::System;
///
/// trait Physics: System<u64> {
///     fn gravity(&self) -> f32;
/// }
/// ```
pub trait System<H: Holder>: Send + Sync + 'static {
    /// The component signature a holder must carry for this system to
    /// consider it.
    fn filter(&self) -> &Filter;
}
