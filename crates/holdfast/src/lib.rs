//! # holdfast
//!
//! A typed component/system registry for arbitrary holder objects.
//!
//! Components are plain values attached to holders under a type key; systems
//! are global singletons keyed the same way. Adding under an occupied key
//! replaces, lookups return `Option`, removal is idempotent, and keys match
//! exactly (a trait object key and a concrete key are different keys).
//!
//! This crate provides:
//!
//! - [`Component`]: the contract all attachable data satisfies.
//! - [`System`]: processing logic declaring a component [`Filter`].
//! - [`TypeToken`]: runtime identity for component types.
//! - [`Filter`]: immutable ordered component signature.
//! - [`Holder`]: the identity bound for holder types.
//! - [`Registry`]: the single-owner store.
//! - [`SharedRegistry`]: the lock-based concurrent store.

pub mod component;
pub mod concurrent;
pub mod filter;
pub mod holder;
pub mod registry;
mod slot;
pub mod system;

pub use component::{Component, TypeToken};
pub use concurrent::SharedRegistry;
pub use filter::Filter;
pub use holder::Holder;
pub use registry::Registry;
pub use system::System;
