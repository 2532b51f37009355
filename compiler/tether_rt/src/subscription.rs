//! Disposal handles.
//!
//! Disposal is the only cancellation primitive at runtime.
//!
//! # Invariants
//!
//! 1. [`Subscription::dispose`] is idempotent; the teardown runs at most once.
//! 2. Dropping a [`Subscription`] disposes it.
//! 3. [`CompositeSubscription::dispose`] attempts every member even if one
//!    member's teardown panics; the first panic is re-raised afterwards.
//! 4. Adding to an already disposed composite disposes the newcomer at once.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

type Teardown = Box<dyn FnOnce() + Send>;

/// RAII handle for one active subscription.
pub struct Subscription {
    teardown: Mutex<Option<Teardown>>,
}

impl Subscription {
    /// A subscription that runs `teardown` when disposed.
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            teardown: Mutex::new(Some(Box::new(teardown))),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Subscription {
            teardown: Mutex::new(None),
        }
    }

    /// Run the teardown if it has not run yet.
    pub fn dispose(&self) {
        // Take under the lock, run outside it: teardowns may re-enter.
        let teardown = self.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.teardown.lock().is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Owns several subscriptions and disposes them together.
#[derive(Default)]
pub struct CompositeSubscription {
    members: Mutex<Vec<Subscription>>,
    disposed: AtomicBool,
}

impl CompositeSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, subscription: Subscription) {
        if self.disposed.load(Ordering::Acquire) {
            subscription.dispose();
            return;
        }
        self.members.lock().push(subscription);
    }

    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose every member, in registration order.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let members = std::mem::take(&mut *self.members.lock());

        let mut first_panic = None;
        for member in &members {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| member.dispose())) {
                tracing::error!("subscription teardown panicked; continuing with the rest");
                first_panic.get_or_insert(payload);
            }
        }
        drop(members);

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }

    /// Fold into a single [`Subscription`].
    pub fn into_subscription(self) -> Subscription {
        Subscription::new(move || self.dispose())
    }
}

impl Drop for CompositeSubscription {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.dispose();
        }
    }
}

impl std::fmt::Debug for CompositeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeSubscription")
            .field("members", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
