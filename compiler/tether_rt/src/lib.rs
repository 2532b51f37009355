//! Reactive runtime for Tether plans.
//!
//! `tether_synth` produces plans and dispatch tables; this crate executes
//! them against dynamic, notifying objects.
//!
//! # Layers
//!
//! - [`Stream`], [`Subject`], [`Subscription`], [`Scheduler`]: a small
//!   push-based stream substrate with switch / combine-latest / merge.
//! - [`Object`], [`Value`]: property bags raising before/after-change
//!   notifications.
//! - [`exec::observe`], [`bind::activate`]: plan interpreters.
//! - [`Dispatcher`]: routes entry-point calls to implementations.
//!
//! # Threading
//!
//! Delivery is synchronous on the thread that changed a property unless a
//! plan relocates it with `observe_on`. Operators that join several inputs
//! serialise delivery; see [`stream`] for the ordering guarantees.

pub mod bind;
pub mod dispatch;
mod error;
pub mod exec;
mod object;
mod scheduler;
pub mod stream;
mod subject;
mod subscription;
mod value;

#[cfg(test)]
mod test_helpers;

pub use bind::{activate, BindingHandle};
pub use dispatch::{Activation, Dispatcher, Invocation};
pub use error::RuntimeError;
pub use exec::{observe, read_path, write_path, ExtraArgs, Func};
pub use object::{Object, ObjectRef};
pub use scheduler::{ImmediateScheduler, QueueScheduler, Scheduler, Task};
pub use stream::{Observer, Stream};
pub use subject::Subject;
pub use subscription::{CompositeSubscription, Subscription};
pub use value::{ObservedChange, Value};
