//! # Registry configuration.
//!
//! Provides [`RegistryConfig`], the centralized settings for a registry instance.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `subscriber_queue = 0` → clamped to 1

/// Configuration for a [`Registry`](crate::Registry).
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `subscriber_queue`: Default per-subscriber queue size (min 1), used when a
///   subscriber does not declare [`Subscribe::queue_capacity`](crate::Subscribe::queue_capacity)
///
/// All fields are public; prefer the clamping accessors when reading them.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// The event listener lagging behind more than `bus_capacity` events skips
    /// the oldest ones and reports `SubscriberOverflow`.
    pub bus_capacity: usize,

    /// Default capacity of each subscriber queue.
    pub subscriber_queue: usize,
}

impl RegistryConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a subscriber queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn subscriber_queue_clamped(&self) -> usize {
        self.subscriber_queue.max(1)
    }
}

impl Default for RegistryConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `subscriber_queue = 1024`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            subscriber_queue: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_values_are_clamped() {
        let cfg = RegistryConfig {
            bus_capacity: 0,
            subscriber_queue: 0,
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.subscriber_queue_clamped(), 1);
    }
}
