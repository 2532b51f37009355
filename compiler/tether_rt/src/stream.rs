//! Cold push streams and the composition operators plans need.
//!
//! A [`Stream<T>`] does nothing until subscribed; every subscription gets
//! its own operator state. Values are delivered synchronously on whichever
//! thread produced them.
//!
//! # Ordering and re-entrancy
//!
//! Operators that join several upstreams (`switch_latest`, `combine_latest`,
//! `merge`) serialise delivery through a [`ReentrantMutex`] gate: emissions
//! from other threads wait, while a re-entrant emission on the delivering
//! thread (a change triggered by the change being delivered) proceeds.
//! Per-source ordering is therefore preserved.
//!
//! `switch_latest` tags every inner subscription with a generation. The
//! switch (dispose the previous inner, subscribe the next) happens under the
//! gate, and an inner value is forwarded only if its generation is still
//! current, so a re-subscription neither drops nor duplicates the value that
//! triggered it and a stale inner can never leak a value past the switch.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};

use crate::scheduler::Scheduler;
use crate::subscription::{CompositeSubscription, Subscription};

/// Receives values from a stream.
pub type Observer<T> = Arc<dyn Fn(T) + Send + Sync>;

type OnSubscribe<T> = Arc<dyn Fn(Observer<T>) -> Subscription + Send + Sync>;

/// A cold, push-based stream.
pub struct Stream<T> {
    on_subscribe: OnSubscribe<T>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            on_subscribe: Arc::clone(&self.on_subscribe),
        }
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl<T> Stream<T> {
    /// Whether both handles refer to the same stream definition.
    pub fn ptr_eq(&self, other: &Stream<T>) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.on_subscribe).cast::<()>(),
            Arc::as_ptr(&other.on_subscribe).cast::<()>(),
        )
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    /// A stream whose subscriptions are set up by `on_subscribe`.
    pub fn new<F>(on_subscribe: F) -> Self
    where
        F: Fn(Observer<T>) -> Subscription + Send + Sync + 'static,
    {
        Stream {
            on_subscribe: Arc::new(on_subscribe),
        }
    }

    pub fn subscribe(&self, observer: impl Fn(T) + Send + Sync + 'static) -> Subscription {
        (self.on_subscribe)(Arc::new(observer))
    }

    pub fn subscribe_observer(&self, observer: Observer<T>) -> Subscription {
        (self.on_subscribe)(observer)
    }

    /// Emit `value` once on subscription.
    pub fn just(value: T) -> Self {
        Stream::new(move |observer| {
            observer(value.clone());
            Subscription::empty()
        })
    }

    /// Never emit.
    pub fn empty() -> Self {
        Stream::new(|_| Subscription::empty())
    }

    pub fn map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Arc::clone(&f);
            source.subscribe(move |value| observer(f(value)))
        })
    }

    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let source = self.clone();
        let predicate = Arc::new(predicate);
        Stream::new(move |observer: Observer<T>| {
            let predicate = Arc::clone(&predicate);
            source.subscribe(move |value| {
                if predicate(&value) {
                    observer(value);
                }
            })
        })
    }

    /// Drop the first `count` values of each subscription.
    #[must_use]
    pub fn skip(&self, count: usize) -> Self {
        let source = self.clone();
        Stream::new(move |observer: Observer<T>| {
            let remaining = AtomicUsize::new(count);
            source.subscribe(move |value| {
                let skipped = remaining
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                    .is_ok();
                if !skipped {
                    observer(value);
                }
            })
        })
    }

    /// Drop values equal to the previous delivered value.
    #[must_use]
    pub fn distinct_until_changed(&self) -> Self
    where
        T: PartialEq,
    {
        let source = self.clone();
        Stream::new(move |observer: Observer<T>| {
            let last: Mutex<Option<T>> = Mutex::new(None);
            source.subscribe(move |value| {
                let fresh = {
                    let mut last = last.lock();
                    if last.as_ref() == Some(&value) {
                        false
                    } else {
                        *last = Some(value.clone());
                        true
                    }
                };
                if fresh {
                    observer(value);
                }
            })
        })
    }

    /// Map each value to a stream and follow only the latest one.
    pub fn switch_map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Stream<U> + Send + Sync + 'static,
    {
        self.map(f).switch_latest()
    }

    /// Deliver each value through `scheduler`.
    #[must_use]
    pub fn observe_on(&self, scheduler: Arc<dyn Scheduler>) -> Self {
        let source = self.clone();
        Stream::new(move |observer: Observer<T>| {
            let alive = Arc::new(AtomicBool::new(true));
            let scheduler = Arc::clone(&scheduler);
            let gate = Arc::clone(&alive);
            let upstream = source.subscribe(move |value| {
                let observer = Arc::clone(&observer);
                let alive = Arc::clone(&gate);
                scheduler.schedule(Box::new(move || {
                    if alive.load(Ordering::Acquire) {
                        observer(value);
                    }
                }));
            });
            Subscription::new(move || {
                alive.store(false, Ordering::Release);
                upstream.dispose();
            })
        })
    }

    /// Interleave the values of every stream.
    pub fn merge(streams: Vec<Stream<T>>) -> Self {
        Stream::new(move |observer: Observer<T>| {
            let gate = Arc::new(ReentrantMutex::new(()));
            let composite = CompositeSubscription::new();
            for stream in &streams {
                let gate = Arc::clone(&gate);
                let observer = Arc::clone(&observer);
                composite.add(stream.subscribe(move |value| {
                    let _serial = gate.lock();
                    observer(value);
                }));
            }
            composite.into_subscription()
        })
    }

    /// Once every stream has emitted, emit the latest value of each (in
    /// stream order) on every subsequent emission of any of them.
    pub fn combine_latest(streams: Vec<Stream<T>>) -> Stream<Vec<T>> {
        Stream::new(move |observer: Observer<Vec<T>>| {
            let state = Arc::new(CombineState {
                gate: ReentrantMutex::new(()),
                latest: Mutex::new(vec![None; streams.len()]),
            });
            let composite = CompositeSubscription::new();
            for (index, stream) in streams.iter().enumerate() {
                let state = Arc::clone(&state);
                let observer = Arc::clone(&observer);
                composite.add(stream.subscribe(move |value| {
                    let _serial = state.gate.lock();
                    let snapshot = {
                        let mut latest = state.latest.lock();
                        latest[index] = Some(value);
                        latest.iter().cloned().collect::<Option<Vec<T>>>()
                    };
                    if let Some(values) = snapshot {
                        observer(values);
                    }
                }));
            }
            composite.into_subscription()
        })
    }
}

struct CombineState<T> {
    gate: ReentrantMutex<()>,
    latest: Mutex<Vec<Option<T>>>,
}

struct SwitchState {
    gate: ReentrantMutex<()>,
    slot: Mutex<InnerSlot>,
    stopped: AtomicBool,
}

struct InnerSlot {
    generation: u64,
    current: Option<Subscription>,
}

impl SwitchState {
    fn is_current(&self, generation: u64) -> bool {
        !self.stopped.load(Ordering::Acquire) && self.slot.lock().generation == generation
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<Stream<T>> {
    /// Flatten by following only the most recent inner stream.
    pub fn switch_latest(&self) -> Stream<T> {
        let outer = self.clone();
        Stream::new(move |observer: Observer<T>| {
            let state = Arc::new(SwitchState {
                gate: ReentrantMutex::new(()),
                slot: Mutex::new(InnerSlot {
                    generation: 0,
                    current: None,
                }),
                stopped: AtomicBool::new(false),
            });

            let switch_state = Arc::clone(&state);
            let outer_subscription = outer.subscribe(move |inner: Stream<T>| {
                let state = &switch_state;
                let _serial = state.gate.lock();

                let (generation, previous) = {
                    let mut slot = state.slot.lock();
                    slot.generation += 1;
                    (slot.generation, slot.current.take())
                };
                // Tear down the previous chain before the next one can emit.
                drop(previous);
                if state.stopped.load(Ordering::Acquire) {
                    return;
                }
                tracing::trace!(generation, "switching to new inner stream");

                let inner_state = Arc::clone(state);
                let observer = Arc::clone(&observer);
                let subscription = inner.subscribe(move |value| {
                    let _serial = inner_state.gate.lock();
                    let current = inner_state.is_current(generation);
                    if current {
                        observer(value);
                    }
                });

                let stale = {
                    let mut slot = state.slot.lock();
                    if slot.generation == generation {
                        slot.current = Some(subscription);
                        None
                    } else {
                        // A re-entrant switch happened while subscribing.
                        Some(subscription)
                    }
                };
                drop(stale);
            });

            Subscription::new(move || {
                state.stopped.store(true, Ordering::Release);
                outer_subscription.dispose();
                let current = state.slot.lock().current.take();
                drop(current);
            })
        })
    }
}
