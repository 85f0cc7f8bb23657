//! # chanvisor
//!
//! **Chanvisor** is a named-channel broadcast registry for Rust.
//!
//! Producers push items into a channel by name, possibly before any consumer
//! exists. Exactly one consumer (a [`Delegator`]) binds to each name and receives
//! the **entire** current item list every time the channel changes. Writes staged
//! before the consumer registers, or before the process-wide readiness gate fires,
//! are queued in call order and applied afterwards.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer A        producer B                    consumer
//!       │                 │                            │
//!       │ add_container   │ add_container              │ register(delegator)
//!       ▼                 ▼                            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry                                                         │
//! │  - lanes: name → { Deferred, live channel, FIFO of staged writes }│
//! │  - Readiness (gate staged writes wait on)                         │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────────┬─────────────────────┬───────┘
//!        │ driver per write:            │ resolve Deferred    │
//!        │ wait channel + readiness,    ▼                     │
//!        │ flush FIFO as one batch ┌──────────────────┐       │
//!        └────────────────────────►│ BroadcastChannel │       │
//!                                  │ version + Arc<[T]>│      │
//!                                  └────────┬─────────┘       │
//!                                           ▼                 │
//!                              delegator.on_update(&items)    │
//!                                                             ▼
//!                                          ┌────────────────────────┐
//!                                          │     event listener     │
//!                                          └───────────┬────────────┘
//!                                                      ▼
//!                                               SubscriberSet
//!                                            (per-sub queues)
//! ```
//!
//! ### Write lifecycle
//! ```text
//! add_container(name, items) ──► lanes[name].pending.push_back(write) ──► Staged
//!
//! driver {
//!   ├─► channel = lanes[name].deferred.wait().await      (register resolves it)
//!   ├─► readiness.ready().await
//!   └─► flush:
//!         ├─ queue empty             ─► done (an earlier driver took the batch)
//!         ├─ channel deregistered    ─► retry with the lane's next handle
//!         └─ drain queue ─► Append(all items) ─► new snapshot (version+1)
//!                         ─► on_update(&snapshot) ─► Staged resolves Ok
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                          |
//! |-------------------|-------------------------------------------------------------------|---------------------------------------------|
//! | **Registry**      | Register consumers, stage and remove items by channel name.       | [`Registry`], [`RegistryBuilder`], [`Staged`]|
//! | **Consumers**     | Receive full snapshots on every change.                           | [`Delegator`], [`DelegatorFn`], [`DelegatorRef`] |
//! | **Channels**      | Versioned observable item list with one subscriber.               | [`BroadcastChannel`], [`Mutation`]          |
//! | **Readiness**     | Hold staged writes until the process is ready.                    | [`Readiness`], [`ReadyGate`], [`AlwaysReady`]|
//! | **Subscriber API**| Hook into registry events (logging, metrics, custom subscribers). | [`Subscribe`]                               |
//! | **Errors**        | Typed errors for contract violations.                             | [`RegistryError`]                           |
//! | **Configuration** | Centralize registry settings.                                     | [`RegistryConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use chanvisor::{DelegatorFn, DelegatorRef, ReadyGate, Registry, RegistryConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn chanvisor::Subscribe>> = {
//!         use chanvisor::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn chanvisor::Subscribe>> = Vec::new();
//!
//!     let gate = Arc::new(ReadyGate::new());
//!     let registry = Registry::<String>::builder(RegistryConfig::default())
//!         .with_subscribers(subs)
//!         .with_readiness(gate.clone())
//!         .build();
//!
//!     // A producer may write before the consumer exists.
//!     let staged = registry.add_container("grid", ["x".to_string(), "y".to_string()]);
//!
//!     let grid: DelegatorRef<String> = DelegatorFn::arc("grid", |items: &[String]| {
//!         println!("grid: {items:?}");
//!     });
//!     registry.register(grid)?; // prints `grid: []`
//!
//!     gate.fire();
//!     staged.await?;            // prints `grid: ["x", "y"]`
//!
//!     registry.remove_container("grid", &"x".to_string())?;
//!     registry.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod delegators;
mod error;
mod events;
mod readiness;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    BroadcastChannel, Mutation, Registry, RegistryBuilder, RegistryConfig, Staged, Subscription,
};
pub use delegators::{Delegator, DelegatorFn, DelegatorRef, Item};
pub use error::RegistryError;
pub use events::{Bus, Event, EventKind};
pub use readiness::{AlwaysReady, Readiness, ReadyGate};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
