//! Registry events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the registry and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry` operations, staged-write drivers, `BroadcastChannel`
//!   delivery (delegator panics), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the registry event listener, which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub(crate) use event::panic_message;
pub use event::{Event, EventKind};
