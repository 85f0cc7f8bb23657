//! # Event subscribers for the chanvisor registry.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Registry ── publish(Event) ──► Bus ──► event listener ──► SubscriberSet::emit_arc()
//!                                                               │
//!                                                 ┌─────────────┼─────────────┐
//!                                                 ▼             ▼             ▼
//!                                             LogWriter      Metrics       Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
