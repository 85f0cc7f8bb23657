//! # Delegator capability.
//!
//! A [`Delegator`] is the single consumer bound to a channel name. It has a stable
//! [`name`](Delegator::name) and a synchronous [`on_update`](Delegator::on_update)
//! callback that receives the **entire** current item list (never a diff) every time
//! the channel changes.
//!
//! ## Contract
//! - `name()` must stay the same for the delegator's lifetime.
//! - `on_update` is called with an empty list immediately upon registration.
//! - `on_update` must not call back into the registry for its own channel.
//! - A panic inside `on_update` is caught and reported as `DelegatorPanicked`.

use std::sync::Arc;

/// Opaque channel item.
///
/// Items are owned by producers; the registry only clones them into snapshots and
/// compares them with `PartialEq` to find the occurrence to remove.
pub trait Item: Clone + PartialEq + Send + Sync + 'static {}

impl<T> Item for T where T: Clone + PartialEq + Send + Sync + 'static {}

/// # Consumer bound to a channel name.
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use chanvisor::Delegator;
///
/// struct Canvas {
///     drawn: Mutex<usize>,
/// }
///
/// impl Delegator<&'static str> for Canvas {
///     fn name(&self) -> &str { "canvas" }
///
///     fn on_update(&self, items: &[&'static str]) {
///         *self.drawn.lock().unwrap() = items.len();
///     }
/// }
/// ```
pub trait Delegator<T: Item>: Send + Sync + 'static {
    /// Returns the channel name this delegator consumes.
    fn name(&self) -> &str;

    /// Receives the full, updated item list.
    fn on_update(&self, items: &[T]);
}

/// Shared handle to a delegator.
pub type DelegatorRef<T> = Arc<dyn Delegator<T>>;
