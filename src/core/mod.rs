//! Registry core: channels, deferred handles and staged writes.
//!
//! The public API from this module is [`Registry`] (with its builder and config),
//! the standalone [`BroadcastChannel`] primitive and the [`Staged`] completion handle.
//!
//! Internal modules:
//! - [`registry`]: name → lane bookkeeping, per-name write queues, drivers;
//! - [`channel`]: versioned item list with one subscriber;
//! - [`deferred`]: single-resolution handle for a channel that may not exist yet;
//! - [`staged`]: queued write and its completion future;
//! - [`builder`] / [`config`]: construction and tuning.

mod builder;
mod channel;
mod config;
mod deferred;
mod registry;
mod staged;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use builder::RegistryBuilder;
pub use channel::{BroadcastChannel, Mutation, Subscription};
pub use config::RegistryConfig;
pub use registry::Registry;
pub use staged::Staged;

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Delegator callbacks never run under the registry or cell locks. They do run under
/// a channel's delivery lock, wrapped in `catch_unwind`, so a panicking delegator
/// never poisons it.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
