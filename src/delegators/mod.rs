//! # Delegator abstractions.
//!
//! This module provides the consumer-side contract:
//! - [`Item`] - marker trait for opaque channel items
//! - [`Delegator`] - trait for a named consumer of channel snapshots
//! - [`DelegatorFn`] - closure-backed delegator implementation
//! - [`DelegatorRef`] - shared reference to a delegator (`Arc<dyn Delegator<T>>`)

mod delegator;
mod delegator_fn;

pub use delegator::{Delegator, DelegatorRef, Item};
pub use delegator_fn::DelegatorFn;
