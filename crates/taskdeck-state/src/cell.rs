//! Observable value cells shared between the client layer and its consumers.
//!
//! # Design
//! - The current value lives in a `tokio::sync::watch` slot so replacement is an atomic swap.
//! - Callback subscribers run synchronously, in registration order, after each replacement.
//! - Replacement and notification happen under one publish lock, so concurrent
//!   writers notify in the order they stored. Callbacks must not write to the
//!   cell they observe.
//! - Dropping a [`Subscription`] detaches its callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Shared, observable value cell.
///
/// Clones are cheap handles onto the same underlying value.
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    slot: watch::Sender<T>,
    publish: Mutex<()>,
    subscribers: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Inner<T> {
    fn publishing(&self) -> MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, Callback<T>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn detach(&self, id: u64) {
        self.subscribers().retain(|(existing, _)| *existing != id);
    }
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cell holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (slot, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                slot,
                publish: Mutex::new(()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Snapshot of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.slot.borrow().clone()
    }

    /// Replace the value wholesale and notify every subscriber.
    pub fn set(&self, value: T) {
        let _publishing = self.inner.publishing();
        self.inner.slot.send_replace(value.clone());
        self.notify(&value);
    }

    /// Derive the next value from the current one and store it.
    ///
    /// `apply` runs while the value slot is locked, so it must not touch this cell.
    pub fn update<F>(&self, apply: F)
    where
        F: FnOnce(&T) -> T,
    {
        let _publishing = self.inner.publishing();
        let mut next = None;
        self.inner.slot.send_modify(|current| {
            let value = apply(current);
            *current = value.clone();
            next = Some(value);
        });
        if let Some(value) = next {
            self.notify(&value);
        }
    }

    /// Register a change callback.
    ///
    /// The callback is invoked once immediately with the current value and
    /// then after every replacement until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback<T> = Arc::new(callback);
        {
            let _publishing = self.inner.publishing();
            callback(&self.get());
            self.inner.subscribers().push((id, callback));
        }

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.detach(id);
                }
            })),
        }
    }

    /// Receiver that wakes async consumers whenever the value is replaced.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<T> {
        self.inner.slot.subscribe()
    }

    /// Number of callbacks currently attached.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    fn notify(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Observable")
            .field("value", &*self.inner.slot.borrow())
            .field("subscribers", &self.inner.subscribers().len())
            .finish()
    }
}

/// Handle that keeps a callback attached to an [`Observable`].
#[must_use = "dropping a subscription detaches its callback"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Detach the callback now.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    /// Keep the callback attached for the lifetime of the cell.
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&u32) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |label: &str| -> Box<dyn Fn(&u32) + Send + Sync> {
            let sink = Arc::clone(&sink);
            let label = label.to_string();
            Box::new(move |value: &u32| {
                sink.lock().unwrap().push(format!("{label}:{value}"));
            })
        };
        (log, make)
    }

    #[test]
    fn subscribers_receive_current_value_then_updates_in_order() {
        let cell = Observable::new(1_u32);
        let (log, make) = recorder();
        let first = make("a");
        let second = make("b");
        let _a = cell.subscribe(move |value| first(value));
        let _b = cell.subscribe(move |value| second(value));

        cell.set(2);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:1", "b:1", "a:2", "b:2"]
        );
        assert_eq!(cell.get(), 2);
    }

    #[test]
    fn dropping_subscription_detaches_callback() {
        let cell = Observable::new(0_u32);
        let (log, make) = recorder();
        let callback = make("x");
        let subscription = cell.subscribe(move |value| callback(value));
        assert_eq!(cell.subscriber_count(), 1);

        drop(subscription);
        cell.set(5);

        assert_eq!(cell.subscriber_count(), 0);
        assert_eq!(*log.lock().unwrap(), vec!["x:0"]);
    }

    #[test]
    fn forgotten_subscription_stays_attached() {
        let cell = Observable::new(0_u32);
        cell.subscribe(|_| {}).forget();
        assert_eq!(cell.subscriber_count(), 1);
    }

    #[test]
    fn update_derives_from_current_value() {
        let cell = Observable::new(10_u32);
        cell.update(|current| current + 5);
        assert_eq!(cell.get(), 15);
    }

    #[test]
    fn clones_share_the_same_value() {
        let cell = Observable::new(String::from("before"));
        let handle = cell.clone();
        handle.set(String::from("after"));
        assert_eq!(cell.get(), "after");
    }

    #[test]
    fn values_written_from_other_threads_are_visible() {
        let cell = Observable::new(0_u32);
        let writers: Vec<_> = (1..=4)
            .map(|value| {
                let cell = cell.clone();
                std::thread::spawn(move || cell.set(value))
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        assert!((1..=4).contains(&cell.get()));
    }

    #[test]
    fn concurrent_writers_leave_subscribers_on_the_stored_value() {
        let cell = Observable::new(0_u32);
        let last_seen = Arc::new(Mutex::new(0_u32));
        let sink = Arc::clone(&last_seen);
        let _subscription = cell.subscribe(move |value| *sink.lock().unwrap() = *value);

        let writers: Vec<_> = (0..8_u32)
            .map(|writer| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for step in 0..200 {
                        cell.set(writer * 1_000 + step);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(*last_seen.lock().unwrap(), cell.get());
    }

    #[tokio::test]
    async fn watch_receiver_observes_replacements() {
        let cell = Observable::new(Option::<String>::None);
        let mut receiver = cell.watch();

        let writer = cell.clone();
        tokio::spawn(async move {
            writer.set(Some("token".to_string()));
        });

        tokio::time::timeout(Duration::from_secs(1), receiver.changed())
            .await
            .expect("change notification")
            .expect("sender alive");
        assert_eq!(receiver.borrow().as_deref(), Some("token"));
    }
}
