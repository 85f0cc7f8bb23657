//! # Readiness gate.
//!
//! Producers' writes are staged but not applied until the process-wide readiness
//! signal has fired. The gate is an external collaborator; the registry only needs
//! the [`Readiness`] contract.
//!
//! - [`Readiness`] - async "wait until ready" contract
//! - [`ReadyGate`] - one-shot gate fired explicitly with [`ReadyGate::fire`]
//! - [`AlwaysReady`] - gate that is ready from the start

mod gate;

pub use gate::{AlwaysReady, Readiness, ReadyGate};
