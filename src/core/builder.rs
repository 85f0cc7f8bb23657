use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    delegators::Item,
    events::Bus,
    readiness::{AlwaysReady, Readiness},
    subscribers::{Subscribe, SubscriberSet},
};

use super::{config::RegistryConfig, registry::Registry};

/// Builder for constructing a [`Registry`] with optional features.
pub struct RegistryBuilder<T: Item> {
    cfg: RegistryConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    readiness: Arc<dyn Readiness>,
    _items: std::marker::PhantomData<fn() -> T>,
}

impl<T: Item> RegistryBuilder<T> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RegistryConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            readiness: Arc::new(AlwaysReady),
            _items: std::marker::PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive registry events (registrations, staged and applied
    /// writes, rejected operations, panics) through dedicated workers with bounded
    /// queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the readiness gate staged writes wait on.
    ///
    /// Defaults to [`AlwaysReady`]. Removals and registrations are not gated.
    pub fn with_readiness(mut self, readiness: Arc<dyn Readiness>) -> Self {
        self.readiness = readiness;
        self
    }

    /// Builds and returns the Registry instance.
    ///
    /// Spawns the event listener when subscribers are configured, so this must then
    /// be called from within a tokio runtime.
    pub fn build(self) -> Arc<Registry<T>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();

        let listener = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(
                self.subscribers,
                bus.clone(),
                self.cfg.subscriber_queue_clamped(),
            );
            Registry::<T>::spawn_listener(&bus, set, runtime_token.clone())
        });

        Registry::new_internal(bus, self.readiness, runtime_token, listener)
    }
}
