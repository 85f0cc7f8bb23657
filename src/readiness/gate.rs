//! # One-shot readiness signal.
//!
//! [`ReadyGate`] fires once for the lifetime of the process. Every waiter, past or
//! future, completes after the first [`fire`](ReadyGate::fire); further calls are no-ops.
//!
//! ## Example
//! ```rust
//! use chanvisor::{Readiness, ReadyGate};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let gate = ReadyGate::new();
//! assert!(!gate.is_ready());
//!
//! gate.fire();
//! gate.ready().await;
//! assert!(gate.is_ready());
//! # }
//! ```

use async_trait::async_trait;
use tokio::sync::watch;

/// Contract for the external readiness signal.
#[async_trait]
pub trait Readiness: Send + Sync + 'static {
    /// Completes once the signal has fired at least once.
    async fn ready(&self);
}

/// One-shot gate backed by a `watch` channel.
#[derive(Debug)]
pub struct ReadyGate {
    tx: watch::Sender<bool>,
}

impl ReadyGate {
    /// Creates a gate that has not fired yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Fires the gate. Returns `true` on the first call only.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    /// Returns true if the gate has fired.
    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Readiness for ReadyGate {
    async fn ready(&self) {
        let mut rx = self.tx.subscribe();
        // `self.tx` outlives this call, so the channel cannot close under us.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

/// Gate that never holds writes back.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReady;

#[async_trait]
impl Readiness for AlwaysReady {
    async fn ready(&self) {}
}
