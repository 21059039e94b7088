//! Shared observable value with synchronous change fan-out.
//!
//! An [`Observable`] holds an immutable snapshot behind an `Arc`. Writers
//! replace the snapshot wholesale; readers and listeners only ever see
//! complete values, and a snapshot they hold never changes underneath them.
//!
//! Writers are serialized by a reentrant lock held across read, replace and
//! notify, so two concurrent `update` calls cannot both start from the same
//! snapshot. Listeners run on the writer's thread, in registration order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, RwLock};

type Listener<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;

struct Shared<T> {
    value: RwLock<Arc<T>>,
    writer: ReentrantMutex<()>,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
    pending: Mutex<VecDeque<Arc<T>>>,
    draining: AtomicBool,
    next_listener: AtomicU64,
}

impl<T> Shared<T> {
    fn is_registered(&self, id: u64) -> bool {
        self.listeners.lock().iter().any(|(lid, _)| *lid == id)
    }

    fn remove(&self, id: u64) {
        // Waits out any fan-out running on another thread.
        let _writer = self.writer.lock();
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    /// Queue a snapshot for delivery and drain the queue unless an outer
    /// round on this thread is already draining it. Caller holds `writer`.
    fn publish(&self, snapshot: Arc<T>) {
        self.pending.lock().push_back(snapshot);
        if self.draining.swap(true, Ordering::AcqRel) {
            return;
        }
        let _draining = DrainGuard { shared: self };
        loop {
            let Some(next) = self.pending.lock().pop_front() else {
                break;
            };
            let round: Vec<(u64, Listener<T>)> = self.listeners.lock().clone();
            for (id, listener) in round {
                if self.is_registered(id) {
                    listener(&next);
                }
            }
        }
    }
}

/// Ends a drain round even when a listener panics. Snapshots still queued
/// after an unwind are discarded; the next publish starts a fresh round.
struct DrainGuard<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared.pending.lock().clear();
        }
        self.shared.draining.store(false, Ordering::Release);
    }
}

/// A cloneable handle to a shared observable value.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T: Default + Send + Sync + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Send + Sync + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: RwLock::new(Arc::new(initial)),
                writer: ReentrantMutex::new(()),
                listeners: Mutex::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.shared.value.read())
    }

    /// Replace the value and notify every listener.
    pub fn set(&self, value: T) {
        let _writer = self.shared.writer.lock();
        let snapshot = Arc::new(value);
        *self.shared.value.write() = Arc::clone(&snapshot);
        self.shared.publish(snapshot);
    }

    /// Derive a new value from the current snapshot and publish it.
    ///
    /// The read and the replace happen under the same writer lock, so no
    /// concurrent update can slip in between them.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let _writer = self.shared.writer.lock();
        let current = self.get();
        let snapshot = Arc::new(f(&current));
        *self.shared.value.write() = Arc::clone(&snapshot);
        self.shared.publish(snapshot);
    }

    /// Register a listener. It is called once right away with the current
    /// snapshot, then after every change until the returned [`Subscription`]
    /// is dropped or unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        let _writer = self.shared.writer.lock();
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        let listener: Listener<T> = Arc::new(listener);
        self.shared.listeners.lock().push((id, Arc::clone(&listener)));
        listener(&self.get());

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.remove(id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + Sync + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&Arc<T>) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &Arc<T>| sink.lock().push((**v).clone()))
    }

    #[test]
    fn subscribe_delivers_current_value_immediately() {
        let obs = Observable::new(7u32);
        let (seen, listener) = recorder::<u32>();
        let _sub = obs.subscribe(listener);
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn set_and_update_notify_in_order() {
        let obs = Observable::new(0u32);
        let (seen, listener) = recorder::<u32>();
        let _sub = obs.subscribe(listener);
        obs.set(5);
        obs.update(|v| v + 1);
        assert_eq!(*seen.lock(), vec![0, 5, 6]);
        assert_eq!(*obs.get(), 6);
    }

    #[test]
    fn held_snapshot_is_not_affected_by_later_writes() {
        let obs = Observable::new(vec![1, 2]);
        let before = obs.get();
        obs.update(|v| {
            let mut next = v.clone();
            next.push(3);
            next
        });
        assert_eq!(*before, vec![1, 2]);
        assert_eq!(*obs.get(), vec![1, 2, 3]);
    }

    #[test]
    fn dropping_subscription_stops_notifications() {
        let obs = Observable::new(0u32);
        let (seen, listener) = recorder::<u32>();
        let sub = obs.subscribe(listener);
        assert_eq!(obs.subscriber_count(), 1);
        drop(sub);
        assert_eq!(obs.subscriber_count(), 0);
        obs.set(9);
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn explicit_unsubscribe_removes_listener() {
        let obs = Observable::new(0u32);
        let (seen, listener) = recorder::<u32>();
        let sub = obs.subscribe(listener);
        sub.unsubscribe();
        obs.set(1);
        assert_eq!(*seen.lock(), vec![0]);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn listener_can_read_during_notification() {
        let obs = Observable::new(1u32);
        let reader = obs.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = obs.subscribe(move |_| sink.lock().push(*reader.get()));
        obs.set(2);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn nested_update_is_delivered_after_current_round() {
        let obs = Observable::new(0u32);
        let writer = obs.clone();
        let _bump = obs.subscribe(move |v| {
            if **v == 1 {
                writer.set(2);
            }
        });
        let (seen, listener) = recorder::<u32>();
        let _sub = obs.subscribe(listener);
        obs.set(1);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
        assert_eq!(*obs.get(), 2);
    }

    #[test]
    fn panicking_listener_does_not_silence_later_writes() {
        let obs = Observable::new(0u32);
        let (seen, listener) = recorder::<u32>();
        let _good = obs.subscribe(listener);
        let bad = obs.subscribe(|v| {
            if **v == 1 {
                panic!("listener failed");
            }
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| obs.set(1)));
        assert!(result.is_err());
        drop(bad);

        obs.set(2);
        obs.update(|v| v + 1);
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3]);
        assert_eq!(*obs.get(), 3);
    }

    #[test]
    fn listener_removed_mid_round_is_skipped() {
        let obs = Observable::new(0u32);
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&victim);
        let _remover = obs.subscribe(move |v| {
            if **v == 1 {
                // Take first so the guard is released before unsubscribing.
                let sub = slot.lock().take();
                drop(sub);
            }
        });
        let (seen, listener) = recorder::<u32>();
        *victim.lock() = Some(obs.subscribe(listener));

        obs.set(1);
        obs.set(2);
        assert_eq!(*seen.lock(), vec![0]);
        assert_eq!(obs.subscriber_count(), 1);
    }

    #[test]
    fn subscription_outliving_observable_is_harmless() {
        let obs = Observable::new(0u32);
        let sub = obs.subscribe(|_| {});
        drop(obs);
        drop(sub);
    }
}
