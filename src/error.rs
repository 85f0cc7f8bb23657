//! Error types used by the chanvisor registry.
//!
//! [`RegistryError`] covers every contract violation a caller can hit:
//! - registering a name that already has a live channel;
//! - removing from a name that has no live channel;
//! - a staged write that could not be applied because the registry went away.
//!
//! Errors are returned synchronously at the call that violates the contract
//! (or through the [`Staged`](crate::Staged) future for writes). Nothing is retried
//! automatically. Helpers (`as_label`, `as_message`) are provided for logs/metrics.

use thiserror::Error;

/// # Errors produced by the registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `register` was called for a name that already has a live channel.
    ///
    /// The consumer registered first stays bound and keeps receiving updates.
    #[error("delegator with name {name:?} already exists")]
    DuplicateChannel {
        /// Channel name.
        name: String,
    },

    /// `remove_container` was called for a name with no live channel.
    #[error("no live channel named {name:?}")]
    UnknownChannel {
        /// Channel name.
        name: String,
    },

    /// The registry was shut down (or dropped) before a staged write could be applied.
    #[error("staged write on {name:?} abandoned: registry shut down")]
    Abandoned {
        /// Channel name.
        name: String,
    },
}

impl RegistryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use chanvisor::RegistryError;
    ///
    /// let err = RegistryError::DuplicateChannel { name: "grid".into() };
    /// assert_eq!(err.as_label(), "channel_duplicate");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegistryError::DuplicateChannel { .. } => "channel_duplicate",
            RegistryError::UnknownChannel { .. } => "channel_unknown",
            RegistryError::Abandoned { .. } => "write_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegistryError::DuplicateChannel { name } => format!("duplicate channel: {name}"),
            RegistryError::UnknownChannel { name } => format!("unknown channel: {name}"),
            RegistryError::Abandoned { name } => format!("abandoned write: {name}"),
        }
    }

    /// Name of the channel the error refers to.
    pub fn channel(&self) -> &str {
        match self {
            RegistryError::DuplicateChannel { name }
            | RegistryError::UnknownChannel { name }
            | RegistryError::Abandoned { name } => name,
        }
    }
}
