//! # Runtime events emitted by the registry and subscriber workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registration events**: consumers binding/unbinding channel names
//! - **Mutation events**: producer writes being staged, applied or removed
//! - **Subscriber events**: failures inside delegators or event subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, channel name,
//! item counts and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use chanvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ContainersApplied)
//!     .with_channel("grid")
//!     .with_items(3);
//!
//! assert_eq!(ev.kind, EventKind::ContainersApplied);
//! assert_eq!(ev.channel.as_deref(), Some("grid"));
//! assert_eq!(ev.items, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `channel`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `channel`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    /// Delegator callback panicked while receiving a snapshot.
    ///
    /// Sets:
    /// - `channel`: channel name
    /// - `reason`: panic info/message
    DelegatorPanicked,

    // === Registration events ===
    /// A consumer bound a channel name; the channel was created empty.
    ///
    /// Sets:
    /// - `channel`: channel name
    ChannelRegistered,

    /// A consumer released its channel; the channel was torn down.
    ///
    /// Sets:
    /// - `channel`: channel name
    ChannelDeregistered,

    /// `register` was refused because the name already has a live channel.
    ///
    /// Sets:
    /// - `channel`: channel name
    /// - `reason`: error label
    RegisterRejected,

    /// A deferred handle was created ahead of any consumer.
    ///
    /// Sets:
    /// - `channel`: channel name
    DeferredCreated,

    /// A deferred handle was resolved with a freshly registered channel.
    ///
    /// Sets:
    /// - `channel`: channel name
    DeferredResolved,

    // === Mutation events ===
    /// A producer write was queued for the channel.
    ///
    /// Sets:
    /// - `channel`: channel name
    /// - `items`: number of items in the write
    ContainersStaged,

    /// Staged writes were applied to the channel snapshot in one batch.
    ///
    /// Sets:
    /// - `channel`: channel name
    /// - `items`: snapshot length after the batch
    ContainersApplied,

    /// One item was removed from the channel snapshot.
    ///
    /// Sets:
    /// - `channel`: channel name
    /// - `items`: snapshot length after removal
    ContainerRemoved,

    /// `remove_container` was refused because the name has no live channel.
    ///
    /// Sets:
    /// - `channel`: channel name
    /// - `reason`: error label
    RemoveRejected,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Event classification.
    pub kind: EventKind,
    /// Name of the channel (or subscriber), if applicable.
    pub channel: Option<Arc<str>>,
    /// Item count (write size or snapshot length, see [`EventKind`]).
    pub items: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            channel: None,
            items: None,
            reason: None,
        }
    }

    /// Attaches a channel name.
    #[inline]
    pub fn with_channel(mut self, channel: impl Into<Arc<str>>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Attaches an item count (saturates at `u32::MAX`).
    #[inline]
    pub fn with_items(mut self, n: usize) -> Self {
        self.items = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_channel(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_channel(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::ChannelRegistered);
        let b = Event::new(EventKind::ChannelDeregistered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_with_items_saturates() {
        let ev = Event::new(EventKind::ContainersStaged).with_items(usize::MAX);
        assert_eq!(ev.items, Some(u32::MAX));
    }

    #[test]
    fn test_panic_message_downcasts() {
        let s: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*s), "boom");

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*owned), "bang");

        let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*other), "unknown panic");
    }
}
