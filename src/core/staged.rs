//! # Staged writes.
//!
//! `add_container` records its write in the channel's FIFO queue at call time and
//! returns a [`Staged`] future. The future completes once the write is part of the
//! channel snapshot and the delegator has been notified.
//!
//! Dropping a [`Staged`] does **not** cancel the write; it only stops observing it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::RegistryError;

/// A write waiting in a channel queue.
pub(crate) struct PendingWrite<T> {
    pub(crate) items: Vec<T>,
    pub(crate) done: oneshot::Sender<()>,
}

/// Completion handle of an `add_container` call.
///
/// Resolves to `Ok(())` once applied, or to [`RegistryError::Abandoned`] if the
/// registry was shut down (or dropped) first.
#[must_use = "the write is staged either way; await the handle to observe when it is applied"]
#[derive(Debug)]
pub struct Staged {
    name: Arc<str>,
    rx: oneshot::Receiver<()>,
}

impl Staged {
    /// Creates the queue entry and its completion handle.
    pub(crate) fn new<T>(name: Arc<str>, items: Vec<T>) -> (PendingWrite<T>, Self) {
        let (done, rx) = oneshot::channel();
        (PendingWrite { items, done }, Self { name, rx })
    }

    /// Channel name the write targets.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Future for Staged {
    type Output = Result<(), RegistryError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RegistryError::Abandoned {
                name: self.name.to_string(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
