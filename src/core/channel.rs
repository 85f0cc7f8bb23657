//! # Broadcast channel: an observable item list with one subscriber.
//!
//! [`BroadcastChannel`] holds the current snapshot for one channel name and at most
//! one [`Delegator`](crate::Delegator). Every change produces a new immutable snapshot
//! (`Arc<[T]>`) tagged with a version, and the subscriber receives the **whole** list.
//!
//! ## Architecture
//! ```text
//! apply(mutation)
//!     ├─► stage(mutation)      cell lock:     old snapshot + mutation → new snapshot (version+1)
//!     └─► deliver(revision)    delivery lock: skip if version <= delivered
//!                                             └─► delegator.on_update(&items)  (panic caught)
//! ```
//!
//! ## Rules
//! - The channel has no queue of its own; callers serialize mutations (the registry
//!   stages them under its lock).
//! - Snapshots are delivered in version order: a subscriber never sees an older list
//!   after a newer one. Under contention an intermediate list may be skipped, the next
//!   delivered list contains its contributions.
//! - A new subscriber synchronously receives the current snapshot.
//! - No-op mutations (empty append, removing an absent item) produce no revision and
//!   no notification.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, Weak};

use crate::core::lock;
use crate::delegators::{DelegatorRef, Item};
use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind, panic_message};

/// A change to a channel's item list.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation<T> {
    /// Append items at the end, contiguously and in order.
    Append(Vec<T>),
    /// Remove the first occurrence of the item.
    Remove(T),
}

/// A snapshot produced by a mutation.
#[derive(Clone, Debug)]
pub(crate) struct Revision<T> {
    pub(crate) version: u64,
    pub(crate) items: Arc<[T]>,
}

/// Current value of the cell.
struct Cell<T> {
    version: u64,
    items: Arc<[T]>,
}

/// Subscriber slot plus delivery bookkeeping.
struct Delivery<T: Item> {
    subscriber: Option<(u64, DelegatorRef<T>)>,
    next_id: u64,
    /// Version last handed to the subscriber (`None` until the first delivery).
    delivered: Option<u64>,
}

const STANDALONE_BUS_CAPACITY: usize = 16;

/// Observable item list for one channel name.
pub struct BroadcastChannel<T: Item> {
    name: Arc<str>,
    bus: Bus,
    cell: Mutex<Cell<T>>,
    delivery: Mutex<Delivery<T>>,
}

impl<T: Item> BroadcastChannel<T> {
    /// Creates a standalone empty channel (version 0, no subscriber).
    ///
    /// Channels created by a [`Registry`](crate::Registry) publish to the registry's
    /// event bus instead and are never handed out for direct mutation.
    pub fn new(name: impl Into<Arc<str>>) -> Arc<Self> {
        Self::with_bus(name, Bus::new(STANDALONE_BUS_CAPACITY))
    }

    pub(crate) fn with_bus(name: impl Into<Arc<str>>, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            bus,
            cell: Mutex::new(Cell {
                version: 0,
                items: Arc::from(Vec::new()),
            }),
            delivery: Mutex::new(Delivery {
                subscriber: None,
                next_id: 0,
                delivered: None,
            }),
        })
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<[T]> {
        Arc::clone(&lock(&self.cell).items)
    }

    /// Version of the current snapshot (0 for the initial empty list).
    pub fn version(&self) -> u64 {
        lock(&self.cell).version
    }

    /// Returns true if a delegator is subscribed.
    pub fn has_subscriber(&self) -> bool {
        lock(&self.delivery).subscriber.is_some()
    }

    /// Applies a mutation and notifies the subscriber with the new snapshot.
    ///
    /// Returns `false` if the mutation changed nothing (no notification is sent).
    pub fn apply(&self, mutation: Mutation<T>) -> bool {
        match self.stage(mutation) {
            Some(rev) => {
                self.deliver(&rev);
                true
            }
            None => false,
        }
    }

    /// Subscribes a delegator and delivers the current snapshot to it.
    ///
    /// Fails with [`RegistryError::DuplicateChannel`] if a delegator is already subscribed.
    pub fn subscribe(
        self: &Arc<Self>,
        delegator: DelegatorRef<T>,
    ) -> Result<Subscription<T>, RegistryError> {
        let subscription = self.attach(delegator)?;
        self.deliver_current();
        Ok(subscription)
    }

    /// Computes the new snapshot from the current one.
    ///
    /// Callers that need ordering across mutations must hold their own lock while staging.
    pub(crate) fn stage(&self, mutation: Mutation<T>) -> Option<Revision<T>> {
        let mut cell = lock(&self.cell);
        let next: Vec<T> = match mutation {
            Mutation::Append(items) => {
                if items.is_empty() {
                    return None;
                }
                let mut next = Vec::with_capacity(cell.items.len() + items.len());
                next.extend_from_slice(&cell.items);
                next.extend(items);
                next
            }
            Mutation::Remove(item) => {
                let index = cell.items.iter().position(|it| *it == item)?;
                let mut next = cell.items.to_vec();
                next.remove(index);
                next
            }
        };

        cell.version += 1;
        cell.items = Arc::from(next);
        Some(Revision {
            version: cell.version,
            items: Arc::clone(&cell.items),
        })
    }

    /// Hands a revision to the subscriber unless a newer one was already delivered.
    pub(crate) fn deliver(&self, rev: &Revision<T>) {
        let mut delivery = lock(&self.delivery);
        if delivery.delivered.is_some_and(|seen| rev.version <= seen) {
            return;
        }
        let Some((_, delegator)) = delivery.subscriber.as_ref() else {
            return;
        };

        let delegator = Arc::clone(delegator);
        delivery.delivered = Some(rev.version);
        let outcome =
            std::panic::catch_unwind(AssertUnwindSafe(|| delegator.on_update(&rev.items)));
        drop(delivery);

        if let Err(panic_err) = outcome {
            self.bus.publish(
                Event::new(EventKind::DelegatorPanicked)
                    .with_channel(Arc::clone(&self.name))
                    .with_reason(panic_message(&*panic_err)),
            );
        }
    }

    /// Delivers the current snapshot (used right after a subscription is attached).
    pub(crate) fn deliver_current(&self) {
        let rev = {
            let cell = lock(&self.cell);
            Revision {
                version: cell.version,
                items: Arc::clone(&cell.items),
            }
        };
        self.deliver(&rev);
    }

    /// Installs the subscriber without delivering anything.
    pub(crate) fn attach(
        self: &Arc<Self>,
        delegator: DelegatorRef<T>,
    ) -> Result<Subscription<T>, RegistryError> {
        let mut delivery = lock(&self.delivery);
        if delivery.subscriber.is_some() {
            return Err(RegistryError::DuplicateChannel {
                name: self.name.to_string(),
            });
        }

        let id = delivery.next_id;
        delivery.next_id += 1;
        delivery.subscriber = Some((id, delegator));
        delivery.delivered = None;

        Ok(Subscription {
            channel: Arc::downgrade(self),
            id,
        })
    }

    fn detach(&self, id: u64) {
        let mut delivery = lock(&self.delivery);
        if delivery.subscriber.as_ref().is_some_and(|(sid, _)| *sid == id) {
            delivery.subscriber = None;
        }
    }
}

impl<T: Item> std::fmt::Debug for BroadcastChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("name", &self.name)
            .field("version", &self.version())
            .finish()
    }
}

/// Active subscription of a delegator to a channel.
///
/// Dropping the subscription (or calling [`unsubscribe`](Subscription::unsubscribe))
/// releases the subscriber slot; no further snapshots are delivered.
pub struct Subscription<T: Item> {
    channel: Weak<BroadcastChannel<T>>,
    id: u64,
}

impl<T: Item> Subscription<T> {
    /// Releases the subscription.
    pub fn unsubscribe(self) {}

    /// Returns true while the subscription still holds the channel's subscriber slot.
    pub fn is_active(&self) -> bool {
        self.channel.upgrade().is_some_and(|ch| {
            lock(&ch.delivery)
                .subscriber
                .as_ref()
                .is_some_and(|(sid, _)| *sid == self.id)
        })
    }
}

impl<T: Item> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.detach(self.id);
        }
    }
}
