//! Hot multicast source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::stream::{Observer, Stream};
use crate::subscription::Subscription;

struct SubjectInner<T> {
    observers: Mutex<Vec<(u64, Observer<T>)>>,
    next_id: AtomicU64,
}

/// Pushes every value to all current subscribers.
///
/// Late subscribers see only values pushed after they subscribed.
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Subject {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    pub fn new() -> Self {
        Subject {
            inner: Arc::new(SubjectInner {
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Deliver `value` to every subscriber.
    pub fn next(&self, value: T) {
        // Snapshot so observers may subscribe or dispose while being called.
        let observers: Vec<Observer<T>> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(value.clone());
        }
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    pub fn stream(&self) -> Stream<T> {
        let inner = Arc::downgrade(&self.inner);
        Stream::new(move |observer| {
            let Some(subject) = inner.upgrade() else {
                return Subscription::empty();
            };
            let id = subject.next_id.fetch_add(1, Ordering::Relaxed);
            subject.observers.lock().push((id, observer));

            let weak: Weak<SubjectInner<T>> = Arc::downgrade(&subject);
            Subscription::new(move || {
                if let Some(subject) = weak.upgrade() {
                    subject.observers.lock().retain(|(other, _)| *other != id);
                }
            })
        })
    }
}

impl<T> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.inner.observers.lock().len())
            .finish()
    }
}
