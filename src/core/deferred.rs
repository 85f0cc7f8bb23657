//! # Deferred channel handle: a single-resolution rendezvous keyed by name.
//!
//! Producers may reference a channel before any consumer registers it. The registry
//! hands them a [`Deferred`] for that name; it resolves exactly once, with the
//! [`BroadcastChannel`] created by the first `register`.
//!
//! ## Rules
//! - Either side may be first to reference a name; the registry creates the handle
//!   under its lock (map-or-create), so there is one handle per pending name.
//! - Resolution happens once. A second `resolve` is rejected and hands the channel back.
//! - Any number of tasks may [`wait`](Deferred::wait) on clones of the same handle;
//!   all of them complete after resolution.

use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

use crate::core::channel::BroadcastChannel;
use crate::delegators::Item;

struct Inner<T: Item> {
    name: Arc<str>,
    slot: OnceLock<Arc<BroadcastChannel<T>>>,
    notify: Notify,
}

/// Handle to a channel that may not exist yet.
pub(crate) struct Deferred<T: Item> {
    inner: Arc<Inner<T>>,
}

impl<T: Item> Deferred<T> {
    /// Creates an unresolved handle.
    pub(crate) fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                slot: OnceLock::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Channel name this handle is keyed by.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns true once a channel has been delivered to the handle.
    pub fn is_resolved(&self) -> bool {
        self.inner.slot.get().is_some()
    }

    /// Waits until the handle is resolved and returns the channel.
    pub async fn wait(&self) -> Arc<BroadcastChannel<T>> {
        loop {
            // Register interest before checking the slot so a concurrent
            // `resolve` between the check and the await is not missed.
            let notified = self.inner.notify.notified();
            if let Some(channel) = self.inner.slot.get() {
                return Arc::clone(channel);
            }
            notified.await;
        }
    }

    /// Resolves the handle and wakes every waiter.
    ///
    /// Returns the channel back as `Err` if the handle was already resolved; the
    /// first resolution is kept.
    pub(crate) fn resolve(
        &self,
        channel: Arc<BroadcastChannel<T>>,
    ) -> Result<(), Arc<BroadcastChannel<T>>> {
        self.inner.slot.set(channel)?;
        self.inner.notify.notify_waiters();
        Ok(())
    }
}

impl<T: Item> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Item> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("name", &self.inner.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_waiters_complete_after_resolve() {
        let deferred: Deferred<u32> = Deferred::new("grid");
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let d = deferred.clone();
                tokio::spawn(async move { d.wait().await })
            })
            .collect();
        tokio::task::yield_now().await;
        assert!(!deferred.is_resolved());

        let channel = BroadcastChannel::new("grid");
        deferred.resolve(channel.clone()).unwrap();

        for w in waiters {
            let got = tokio::time::timeout(Duration::from_secs(1), w)
                .await
                .expect("waiter timed out")
                .expect("waiter panicked");
            assert!(Arc::ptr_eq(&got, &channel));
        }
    }

    #[tokio::test]
    async fn test_wait_after_resolve_returns_immediately() {
        let deferred: Deferred<u32> = Deferred::new("grid");
        let channel = BroadcastChannel::new("grid");
        deferred.resolve(channel.clone()).unwrap();

        let got = deferred.wait().await;
        assert!(Arc::ptr_eq(&got, &channel));
        assert!(deferred.is_resolved());
    }

    #[test]
    fn test_second_resolve_is_rejected() {
        let deferred: Deferred<u32> = Deferred::new("grid");
        let first = BroadcastChannel::new("grid");
        let second = BroadcastChannel::new("grid");

        assert!(deferred.resolve(first.clone()).is_ok());
        let rejected = deferred.resolve(second.clone()).unwrap_err();

        assert!(Arc::ptr_eq(&rejected, &second));
        assert!(Arc::ptr_eq(deferred.inner.slot.get().unwrap(), &first));
    }
}
