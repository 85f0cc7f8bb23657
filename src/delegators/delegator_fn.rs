//! # Function-backed delegator (`DelegatorFn`)
//!
//! [`DelegatorFn`] wraps a closure `F: Fn(&[T])`, so consumers that only need to
//! react to snapshots do not have to declare a type.
//!
//! ## Example
//! ```rust
//! use chanvisor::{DelegatorFn, DelegatorRef};
//!
//! let d: DelegatorRef<u32> = DelegatorFn::arc("grid", |items: &[u32]| {
//!     println!("grid now holds {} items", items.len());
//! });
//!
//! assert_eq!(d.name(), "grid");
//! ```

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::delegators::delegator::{Delegator, Item};

/// Function-backed delegator implementation.
pub struct DelegatorFn<T, F> {
    name: Cow<'static, str>,
    f: F,
    _items: PhantomData<fn(&[T])>,
}

impl<T, F> DelegatorFn<T, F>
where
    T: Item,
    F: Fn(&[T]) + Send + Sync + 'static,
{
    /// Creates a new function-backed delegator.
    ///
    /// Prefer [`DelegatorFn::arc`] when you immediately need a [`DelegatorRef`](crate::DelegatorRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _items: PhantomData,
        }
    }

    /// Creates the delegator and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<T, F> Delegator<T> for DelegatorFn<T, F>
where
    T: Item,
    F: Fn(&[T]) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn on_update(&self, items: &[T]) {
        (self.f)(items)
    }
}

impl<T, F> std::fmt::Debug for DelegatorFn<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatorFn").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_receives_items() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let d = DelegatorFn::new("grid", move |items: &[u8]| {
            sink.lock().unwrap().push(items.to_vec());
        });

        d.on_update(&[1, 2]);
        d.on_update(&[]);

        assert_eq!(d.name(), "grid");
        assert_eq!(*seen.lock().unwrap(), vec![vec![1, 2], vec![]]);
    }
}
