//! # Channel registry: name → {channel, deferred handle, subscription, staged writes}.
//!
//! The registry is the façade producers and consumers talk to:
//! - `register(delegator)` → creates the channel, subscribes the delegator, resolves the
//!   deferred handle for that name
//! - `deregister(delegator)` → releases the subscription and tears the channel down
//! - `add_container(name, items)` → stages a write and spawns a driver that applies it
//!   once the channel exists and the readiness gate has fired
//! - `remove_container(name, item)` → removes the first occurrence from the live channel
//!
//! ## Architecture
//! ```text
//! add_container(name, items)
//!     ├─► lanes[name] (map-or-create) ─► pending.push_back(write)      FIFO per name
//!     └─► spawn driver:
//!           loop {
//!             deferred = lanes[name].deferred
//!             channel  = deferred.wait().await        ◄── resolved by register(name)
//!             readiness.ready().await
//!             flush(name, channel):
//!               ├─ pending empty          ─► done (another driver applied it)
//!               ├─ channel no longer live ─► retry with the lane's fresh handle
//!               └─ drain pending ─► one Append batch ─► deliver ─► complete Staged
//!           }
//! ```
//!
//! ## Rules
//! - One lane per name. A lane without a live channel always has an unresolved
//!   handle. `register` resolves the handle only after the delegator has received
//!   the initial empty snapshot, so a live channel may briefly sit behind an
//!   unresolved handle; no write reaches it in that window.
//! - Staging (snapshot computation) happens under the registry lock, so concurrent
//!   writes on one name never read the same old snapshot.
//! - Delegator callbacks run outside the registry lock.
//! - Writes staged for a name survive `deregister` and apply to the next channel
//!   registered under that name.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::builder::RegistryBuilder;
use crate::core::channel::{BroadcastChannel, Mutation, Subscription};
use crate::core::config::RegistryConfig;
use crate::core::deferred::Deferred;
use crate::core::lock;
use crate::core::staged::{PendingWrite, Staged};
use crate::delegators::{Delegator, DelegatorRef, Item};
use crate::error::RegistryError;
use crate::events::{Bus, Event, EventKind};
use crate::readiness::Readiness;
use crate::subscribers::SubscriberSet;

/// Live channel and the delegator's subscription to it.
struct Live<T: Item> {
    channel: Arc<BroadcastChannel<T>>,
    subscription: Subscription<T>,
}

/// Everything the registry knows about one name.
struct Lane<T: Item> {
    deferred: Deferred<T>,
    live: Option<Live<T>>,
    pending: VecDeque<PendingWrite<T>>,
}

impl<T: Item> Lane<T> {
    fn new(name: &str) -> Self {
        Self {
            deferred: Deferred::new(name),
            live: None,
            pending: VecDeque::new(),
        }
    }
}

struct State<T: Item> {
    lanes: HashMap<String, Lane<T>>,
    closed: bool,
}

/// Named-channel broadcast registry.
///
/// Build one per process (or per test) with [`Registry::builder`] and pass the
/// returned `Arc` to producers and consumers.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use chanvisor::{DelegatorFn, DelegatorRef, ReadyGate, Registry, RegistryConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), chanvisor::RegistryError> {
/// let gate = Arc::new(ReadyGate::new());
/// let registry = Registry::<&'static str>::builder(RegistryConfig::default())
///     .with_readiness(gate.clone())
///     .build();
///
/// // Producer writes before any consumer exists.
/// let staged = registry.add_container("grid", ["x", "y"]);
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// let grid: DelegatorRef<&'static str> = DelegatorFn::arc("grid", move |items: &[&'static str]| {
///     sink.lock().unwrap().push(items.to_vec());
/// });
/// registry.register(grid)?;
///
/// gate.fire();
/// staged.await?;
///
/// assert_eq!(*seen.lock().unwrap(), vec![vec![], vec!["x", "y"]]);
/// # Ok(())
/// # }
/// ```
pub struct Registry<T: Item> {
    state: Mutex<State<T>>,
    bus: Bus,
    readiness: Arc<dyn Readiness>,
    runtime_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Item> Registry<T> {
    /// Returns a builder for a registry with the given configuration.
    pub fn builder(cfg: RegistryConfig) -> RegistryBuilder<T> {
        RegistryBuilder::new(cfg)
    }

    /// Creates a registry without subscribers whose writes apply as soon as a
    /// consumer is registered.
    pub fn new(cfg: RegistryConfig) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    pub(crate) fn new_internal(
        bus: Bus,
        readiness: Arc<dyn Readiness>,
        runtime_token: CancellationToken,
        listener: Option<JoinHandle<()>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                lanes: HashMap::new(),
                closed: false,
            }),
            bus,
            readiness,
            runtime_token,
            listener: Mutex::new(listener),
        })
    }

    /// Binds a delegator to its channel name.
    ///
    /// Creates the channel with an empty list, subscribes the delegator (which is
    /// immediately called with `[]`) and resolves the deferred handle for the name, so
    /// writes staged earlier start applying.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateChannel`] if the name already has a live channel; the
    /// delegator registered first is left untouched.
    pub fn register(&self, delegator: DelegatorRef<T>) -> Result<(), RegistryError> {
        let name = delegator.name().to_string();

        let (channel, outstanding) = {
            let mut state = lock(&self.state);
            let outstanding = state.lanes.contains_key(&name);
            let lane = state
                .lanes
                .entry(name.clone())
                .or_insert_with(|| Lane::new(&name));

            if lane.live.is_some() {
                drop(state);
                let err = RegistryError::DuplicateChannel { name };
                self.bus.publish(
                    Event::new(EventKind::RegisterRejected)
                        .with_channel(err.channel())
                        .with_reason(err.as_label()),
                );
                return Err(err);
            }

            let channel = BroadcastChannel::with_bus(name.as_str(), self.bus.clone());
            let subscription = channel.attach(delegator)?;
            lane.live = Some(Live {
                channel: Arc::clone(&channel),
                subscription,
            });
            (channel, outstanding)
        };

        // The handle is still unresolved, so no driver can reach the channel before
        // the delegator has seen `[]`.
        channel.deliver_current();

        let resolved = {
            let mut state = lock(&self.state);
            match state.lanes.get_mut(&name) {
                Some(lane)
                    if lane
                        .live
                        .as_ref()
                        .is_some_and(|live| Arc::ptr_eq(&live.channel, &channel)) =>
                {
                    let resolved = lane.deferred.resolve(Arc::clone(&channel));
                    debug_assert!(
                        resolved.is_ok(),
                        "deferred handle for {:?} resolved twice",
                        lane.deferred.name()
                    );
                    true
                }
                // deregistered while the initial snapshot was being delivered
                _ => false,
            }
        };

        self.bus
            .publish(Event::new(EventKind::ChannelRegistered).with_channel(channel.name()));
        if outstanding && resolved {
            self.bus
                .publish(Event::new(EventKind::DeferredResolved).with_channel(channel.name()));
        }
        Ok(())
    }

    /// Releases the channel registered under the delegator's name.
    ///
    /// Returns `false` (and does nothing) if the name is not registered. Writes that are
    /// still staged for the name stay queued for the next registration.
    pub fn deregister<D>(&self, delegator: &D) -> bool
    where
        D: Delegator<T> + ?Sized,
    {
        let name = delegator.name();

        let live = {
            let mut state = lock(&self.state);
            let Some(lane) = state.lanes.get_mut(name) else {
                return false;
            };
            let Some(live) = lane.live.take() else {
                return false;
            };
            if lane.pending.is_empty() {
                state.lanes.remove(name);
            } else {
                lane.deferred = Deferred::new(name);
            }
            live
        };

        live.subscription.unsubscribe();
        self.bus
            .publish(Event::new(EventKind::ChannelDeregistered).with_channel(name));
        true
    }

    /// Appends items to the named channel, in argument order.
    ///
    /// The write is queued immediately (calls on one name apply in the order they were
    /// issued) and applied once a delegator has registered the name and the readiness
    /// gate has fired. Writes queued together are applied as a single batch, so the
    /// delegator sees them in one notification.
    ///
    /// The returned [`Staged`] completes when the items are visible. Dropping it does
    /// not cancel the write.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime (the applying driver is spawned).
    pub fn add_container<I>(self: &Arc<Self>, name: &str, items: I) -> Staged
    where
        I: IntoIterator<Item = T>,
    {
        let name: Arc<str> = Arc::from(name);
        let items: Vec<T> = items.into_iter().collect();
        let count = items.len();
        let (write, staged) = Staged::new(Arc::clone(&name), items);

        let created = {
            let mut state = lock(&self.state);
            if state.closed {
                return staged;
            }
            let created = !state.lanes.contains_key(&*name);
            let lane = state
                .lanes
                .entry(name.to_string())
                .or_insert_with(|| Lane::new(&name));
            lane.pending.push_back(write);
            created
        };

        if created {
            self.bus
                .publish(Event::new(EventKind::DeferredCreated).with_channel(Arc::clone(&name)));
        }
        self.bus.publish(
            Event::new(EventKind::ContainersStaged)
                .with_channel(Arc::clone(&name))
                .with_items(count),
        );

        self.spawn_driver(name);
        staged
    }

    /// Removes the first occurrence of `item` from the named channel.
    ///
    /// Returns `Ok(false)` without notifying the delegator if the item is absent.
    ///
    /// # Errors
    /// [`RegistryError::UnknownChannel`] if the name has no live channel.
    pub fn remove_container(&self, name: &str, item: &T) -> Result<bool, RegistryError> {
        let (channel, rev) = {
            let state = lock(&self.state);
            let channel = state
                .lanes
                .get(name)
                .and_then(|lane| lane.live.as_ref())
                .map(|live| Arc::clone(&live.channel));

            let Some(channel) = channel else {
                drop(state);
                let err = RegistryError::UnknownChannel {
                    name: name.to_string(),
                };
                self.bus.publish(
                    Event::new(EventKind::RemoveRejected)
                        .with_channel(name)
                        .with_reason(err.as_label()),
                );
                return Err(err);
            };

            let rev = channel.stage(Mutation::Remove(item.clone()));
            (channel, rev)
        };

        let Some(rev) = rev else {
            return Ok(false);
        };
        self.bus.publish(
            Event::new(EventKind::ContainerRemoved)
                .with_channel(name)
                .with_items(rev.items.len()),
        );
        channel.deliver(&rev);
        Ok(true)
    }

    /// Returns sorted list of registered channel names.
    pub fn list(&self) -> Vec<String> {
        let state = lock(&self.state);
        let mut names: Vec<String> = state
            .lanes
            .iter()
            .filter(|(_, lane)| lane.live.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Returns true if a delegator is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        lock(&self.state)
            .lanes
            .get(name)
            .is_some_and(|lane| lane.live.is_some())
    }

    /// Current item list of the named channel, if registered.
    pub fn snapshot(&self, name: &str) -> Option<Arc<[T]>> {
        lock(&self.state)
            .lanes
            .get(name)
            .and_then(|lane| lane.live.as_ref())
            .map(|live| live.channel.snapshot())
    }

    /// Number of writes staged for `name` and not yet applied.
    pub fn pending(&self, name: &str) -> usize {
        lock(&self.state)
            .lanes
            .get(name)
            .map_or(0, |lane| lane.pending.len())
    }

    /// Creates a receiver for raw registry events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the registry.
    ///
    /// Staged writes that were not applied yet resolve to [`RegistryError::Abandoned`],
    /// later `add_container` calls are abandoned immediately, and the event listener
    /// delivers what was already published to subscribers and exits. Registered
    /// channels stay readable.
    pub async fn shutdown(&self) {
        let abandoned: Vec<PendingWrite<T>> = {
            let mut state = lock(&self.state);
            state.closed = true;
            state
                .lanes
                .values_mut()
                .flat_map(|lane| lane.pending.drain(..))
                .collect()
        };
        drop(abandoned);

        self.runtime_token.cancel();
        let listener = lock(&self.listener).take();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
    }

    /// Spawns the task that applies the writes staged for `name`.
    fn spawn_driver(self: &Arc<Self>, name: Arc<str>) {
        let registry = Arc::downgrade(self);
        let readiness = Arc::clone(&self.readiness);
        let token = self.runtime_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = Self::drive(registry, readiness, name) => {}
            }
        });
    }

    /// Waits for the channel and the readiness gate, then flushes the lane.
    async fn drive(registry: Weak<Self>, readiness: Arc<dyn Readiness>, name: Arc<str>) {
        loop {
            let Some(deferred) = registry.upgrade().and_then(|me| me.lane_deferred(&name))
            else {
                return;
            };
            let channel = deferred.wait().await;
            readiness.ready().await;

            let Some(me) = registry.upgrade() else {
                return;
            };
            if me.flush(&name, &channel) {
                return;
            }
        }
    }

    fn lane_deferred(&self, name: &str) -> Option<Deferred<T>> {
        lock(&self.state)
            .lanes
            .get(name)
            .map(|lane| lane.deferred.clone())
    }

    /// Applies every staged write for `name` to `channel` as one batch.
    ///
    /// Returns `false` if `channel` is no longer the live channel for `name` and
    /// writes are still waiting (the caller retries with the lane's current handle).
    fn flush(&self, name: &str, channel: &Arc<BroadcastChannel<T>>) -> bool {
        let (rev, done) = {
            let mut state = lock(&self.state);
            let Some(lane) = state.lanes.get_mut(name) else {
                return true;
            };
            if lane.pending.is_empty() {
                return true;
            }
            let current = lane
                .live
                .as_ref()
                .is_some_and(|live| Arc::ptr_eq(&live.channel, channel));
            if !current {
                return false;
            }

            let mut items = Vec::new();
            let mut done = Vec::with_capacity(lane.pending.len());
            for write in lane.pending.drain(..) {
                items.extend(write.items);
                done.push(write.done);
            }
            (channel.stage(Mutation::Append(items)), done)
        };

        if let Some(rev) = rev {
            self.bus.publish(
                Event::new(EventKind::ContainersApplied)
                    .with_channel(name)
                    .with_items(rev.items.len()),
            );
            channel.deliver(&rev);
        }
        for tx in done {
            let _ = tx.send(());
        }
        true
    }

    /// Forwards bus events to the subscriber set until `token` is cancelled.
    pub(crate) fn spawn_listener(
        bus: &Bus,
        set: SubscriberSet,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => {
                        if !forward(&set, msg) {
                            break;
                        }
                    }
                }
            }

            while let Ok(ev) = rx.try_recv() {
                set.emit_arc(Arc::new(ev));
            }
            set.shutdown().await;
        })
    }
}

/// Hands one listener result to the subscribers. Returns `false` once the bus is closed.
///
/// Lag is reported straight to the subscribers (with the number of skipped events),
/// never back onto the bus the listener is draining.
fn forward(set: &SubscriberSet, msg: Result<Event, broadcast::error::RecvError>) -> bool {
    match msg {
        Ok(ev) => set.emit_arc(Arc::new(ev)),
        Err(broadcast::error::RecvError::Closed) => return false,
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            let ev = Event::subscriber_overflow("registry_listener", "lagged")
                .with_items(usize::try_from(skipped).unwrap_or(usize::MAX));
            set.emit_arc(Arc::new(ev));
        }
    }
    true
}

impl<T: Item> Drop for Registry<T> {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegators::DelegatorFn;
    use crate::readiness::ReadyGate;
    use crate::subscribers::Subscribe;
    use async_trait::async_trait;
    use std::time::Duration;

    type Log<T> = Arc<Mutex<Vec<Vec<T>>>>;

    fn recorder<T: Item>(name: &'static str) -> (DelegatorRef<T>, Log<T>) {
        let log: Log<T> = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let d: DelegatorRef<T> = DelegatorFn::arc(name, move |items: &[T]| {
            sink.lock().unwrap().push(items.to_vec());
        });
        (d, log)
    }

    fn gated<T: Item>() -> (Arc<Registry<T>>, Arc<ReadyGate>) {
        let gate = Arc::new(ReadyGate::new());
        let registry = Registry::builder(RegistryConfig::default())
            .with_readiness(gate.clone())
            .build();
        (registry, gate)
    }

    async fn applied(staged: Staged) -> Result<(), RegistryError> {
        tokio::time::timeout(Duration::from_secs(1), staged)
            .await
            .expect("staged write timed out")
    }

    #[tokio::test]
    async fn test_writes_before_register_apply_after_readiness() {
        let (registry, gate) = gated::<&'static str>();

        let first = registry.add_container("grid", ["x", "y"]);
        let second = registry.add_container("grid", ["z"]);
        assert_eq!(registry.pending("grid"), 2);
        assert!(!registry.is_registered("grid"));

        let (grid, log) = recorder("grid");
        registry.register(grid).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![Vec::<&str>::new()]);

        // channel exists, but the gate holds the writes back
        tokio::task::yield_now().await;
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(registry.pending("grid"), 2);

        assert!(gate.fire());
        applied(first).await.unwrap();
        applied(second).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![Vec::<&str>::new(), vec!["x", "y", "z"]]
        );
        assert_eq!(registry.pending("grid"), 0);
        assert_eq!(&*registry.snapshot("grid").unwrap(), &["x", "y", "z"]);
    }

    #[tokio::test]
    async fn test_write_after_register_applies() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let (grid, log) = recorder("grid");
        registry.register(grid).unwrap();

        applied(registry.add_container("grid", [1, 2])).await.unwrap();
        applied(registry.add_container("grid", [3])).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![vec![], vec![1, 2], vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn test_empty_write_completes_without_notification() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let (grid, log) = recorder("grid");
        registry.register(grid).unwrap();

        applied(registry.add_container("grid", Vec::new())).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![Vec::<u32>::new()]);
    }

    #[tokio::test]
    async fn test_duplicate_register_is_rejected() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let mut events = registry.subscribe_events();

        let (first, first_log) = recorder("grid");
        let (second, second_log) = recorder("grid");
        registry.register(first).unwrap();

        let err = registry.register(second).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateChannel { name: "grid".into() });

        applied(registry.add_container("grid", [7])).await.unwrap();
        assert_eq!(*first_log.lock().unwrap(), vec![vec![], vec![7]]);
        assert!(second_log.lock().unwrap().is_empty());

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::RegisterRejected));
    }

    #[tokio::test]
    async fn test_remove_first_occurrence() {
        let registry = Registry::<&'static str>::new(RegistryConfig::default());
        let (grid, log) = recorder("grid");
        registry.register(grid).unwrap();
        applied(registry.add_container("grid", ["x", "y", "x"]))
            .await
            .unwrap();

        assert_eq!(registry.remove_container("grid", &"x"), Ok(true));
        assert_eq!(&*registry.snapshot("grid").unwrap(), &["y", "x"]);

        // absent item: no change, no notification
        let before = log.lock().unwrap().len();
        assert_eq!(registry.remove_container("grid", &"q"), Ok(false));
        assert_eq!(log.lock().unwrap().len(), before);
        assert_eq!(log.lock().unwrap().last().unwrap(), &vec!["y", "x"]);
    }

    #[tokio::test]
    async fn test_remove_on_unknown_channel_fails() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let _pending = registry.add_container("nav", [1]);

        // a staged write does not make the channel live
        assert_eq!(
            registry.remove_container("nav", &1),
            Err(RegistryError::UnknownChannel { name: "nav".into() })
        );
        assert_eq!(
            registry.remove_container("missing", &1),
            Err(RegistryError::UnknownChannel {
                name: "missing".into()
            })
        );
    }

    #[tokio::test]
    async fn test_remove_is_not_gated() {
        let (registry, _gate) = gated::<u32>();
        let (grid, log) = recorder("grid");
        registry.register(grid).unwrap();
        let _pending = registry.add_container("grid", [1]);

        assert_eq!(registry.remove_container("grid", &1), Ok(false));
        assert_eq!(*log.lock().unwrap(), vec![Vec::<u32>::new()]);
        assert_eq!(registry.pending("grid"), 1);
    }

    #[tokio::test]
    async fn test_deregister_then_register_starts_empty() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let (first, first_log) = recorder("grid");
        registry.register(Arc::clone(&first)).unwrap();
        applied(registry.add_container("grid", [1, 2])).await.unwrap();

        assert!(registry.deregister(&*first));
        assert!(!registry.is_registered("grid"));
        assert!(!registry.deregister(&*first));
        assert_eq!(
            registry.remove_container("grid", &1),
            Err(RegistryError::UnknownChannel { name: "grid".into() })
        );

        let (second, second_log) = recorder("grid");
        registry.register(second).unwrap();
        assert_eq!(*second_log.lock().unwrap(), vec![Vec::<u32>::new()]);
        assert_eq!(first_log.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deregister_leaves_other_channels() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let (grid, _) = recorder("grid");
        let (nav, _) = recorder("nav");
        registry.register(Arc::clone(&grid)).unwrap();
        registry.register(nav).unwrap();

        assert!(registry.deregister(&*grid));
        assert_eq!(registry.list(), vec!["nav".to_string()]);
    }

    #[tokio::test]
    async fn test_staged_writes_survive_deregister() {
        let (registry, gate) = gated::<u32>();
        let (first, first_log) = recorder("grid");
        registry.register(Arc::clone(&first)).unwrap();

        let staged = registry.add_container("grid", [5]);
        tokio::task::yield_now().await;
        assert!(registry.deregister(&*first));
        assert_eq!(registry.pending("grid"), 1);

        let (second, second_log) = recorder("grid");
        registry.register(second).unwrap();
        assert!(gate.fire());
        applied(staged).await.unwrap();

        assert_eq!(*first_log.lock().unwrap(), vec![Vec::<u32>::new()]);
        assert_eq!(*second_log.lock().unwrap(), vec![vec![], vec![5]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_keep_batches_contiguous() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let (grid, log) = recorder("grid");
        registry.register(grid).unwrap();

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let r = Arc::clone(&registry);
                tokio::spawn(async move { r.add_container("grid", [i * 10, i * 10 + 1]).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let last = registry.snapshot("grid").unwrap();
        assert_eq!(last.len(), 16);
        for pair in last.chunks(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }

        // deliveries never go backwards: each list extends the previous one
        let log = log.lock().unwrap();
        for w in log.windows(2) {
            assert!(w[1].starts_with(&w[0]));
        }
        assert_eq!(log.last().unwrap().as_slice(), &*last);
    }

    #[tokio::test]
    async fn test_concurrent_registration_of_one_name() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let r = Arc::clone(&registry);
                tokio::spawn(async move { r.register(recorder("grid").0) })
            })
            .collect();

        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(registry.list(), vec!["grid".to_string()]);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_pending_writes() {
        let (registry, _gate) = gated::<u32>();
        let (grid, _) = recorder("grid");
        registry.register(grid).unwrap();

        let staged = registry.add_container("grid", [1]);
        registry.shutdown().await;

        assert_eq!(
            applied(staged).await,
            Err(RegistryError::Abandoned { name: "grid".into() })
        );
        assert_eq!(
            applied(registry.add_container("grid", [2])).await,
            Err(RegistryError::Abandoned { name: "grid".into() })
        );
        assert_eq!(registry.pending("grid"), 0);
        assert!(registry.is_registered("grid"));
    }

    struct Kinds {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Kinds {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "kinds"
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_registry_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let kinds: Arc<dyn Subscribe> = Arc::new(Kinds { seen: seen.clone() });
        let registry = Registry::<u32>::builder(RegistryConfig::default())
            .with_subscribers(vec![kinds])
            .build();

        let staged = registry.add_container("grid", [1]);
        let (grid, _) = recorder("grid");
        registry.register(Arc::clone(&grid)).unwrap();
        applied(staged).await.unwrap();
        assert_eq!(registry.remove_container("grid", &1), Ok(true));
        assert!(registry.deregister(&*grid));

        registry.shutdown().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                EventKind::DeferredCreated,
                EventKind::ContainersStaged,
                EventKind::ChannelRegistered,
                EventKind::DeferredResolved,
                EventKind::ContainersApplied,
                EventKind::ContainerRemoved,
                EventKind::ChannelDeregistered,
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_delegator_keeps_channel_usable() {
        let registry = Registry::<u32>::new(RegistryConfig::default());
        let mut events = registry.subscribe_events();
        let d: DelegatorRef<u32> = DelegatorFn::arc("grid", |items: &[u32]| {
            if items.len() == 1 {
                panic!("bad frame");
            }
        });
        registry.register(d).unwrap();

        applied(registry.add_container("grid", [1])).await.unwrap();
        applied(registry.add_container("grid", [2])).await.unwrap();
        assert_eq!(&*registry.snapshot("grid").unwrap(), &[1, 2]);

        let mut panicked = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::DelegatorPanicked {
                panicked += 1;
            }
        }
        assert_eq!(panicked, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_initial_empty_snapshot_precedes_staged_writes() {
        for _ in 0..500 {
            let registry = Registry::<u32>::new(RegistryConfig::default());
            let staged = registry.add_container("grid", [1]);
            tokio::task::yield_now().await;

            let (grid, log) = recorder("grid");
            registry.register(grid).unwrap();
            applied(staged).await.unwrap();

            let log = log.lock().unwrap();
            assert_eq!(log.first(), Some(&Vec::<u32>::new()), "log: {log:?}");
            assert_eq!(log.last(), Some(&vec![1]));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deregister_racing_register_keeps_writes_queued() {
        for _ in 0..200 {
            let registry = Registry::<u32>::new(RegistryConfig::default());
            let staged = registry.add_container("grid", [1]);

            let (first, _) = recorder("grid");
            let r = Arc::clone(&registry);
            let d = Arc::clone(&first);
            let racer = tokio::spawn(async move { r.deregister(&*d) });
            registry.register(first).unwrap();
            let _ = racer.await.unwrap();

            // whichever won, a fresh registration eventually receives the write
            let (second, log) = recorder("grid");
            if registry.register(second).is_ok() {
                applied(staged).await.unwrap();
                assert_eq!(log.lock().unwrap().first(), Some(&Vec::<u32>::new()));
            }
        }
    }

    #[tokio::test]
    async fn test_listener_lag_goes_to_subscribers_not_bus() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let kinds: Arc<dyn Subscribe> = Arc::new(Kinds { seen: seen.clone() });
        let set = SubscriberSet::new(vec![kinds], bus.clone(), 8);

        assert!(forward(&set, Err(broadcast::error::RecvError::Lagged(3))));
        assert!(!forward(&set, Err(broadcast::error::RecvError::Closed)));
        set.shutdown().await;

        assert_eq!(*seen.lock().unwrap(), vec![EventKind::SubscriberOverflow]);
        assert!(rx.try_recv().is_err());
    }
}
