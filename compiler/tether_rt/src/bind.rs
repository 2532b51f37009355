//! Executing binding plans.
//!
//! [`activate`] wires a [`BindingPlan`] between a source object and a
//! target object:
//!
//! 1. Both directions are built first, so a missing converter or scheduler
//!    fails before anything is subscribed.
//! 2. The source→target direction is subscribed first. Its initial value is
//!    written into the target.
//! 3. The target→source direction is subscribed second. It starts with
//!    `skip(1)`, which drops the target's read-back of the value written in
//!    step 2.
//!
//! Writers hold their root weakly; a binding never keeps its objects alive.
//! Writes are set-if-changed, so a converted value that round-trips to the
//! same value ends the exchange.

use std::sync::{Arc, Weak};

use tether_ir::PropertyPath;
use tether_synth::{BindingMode, BindingPlan, PipelinePlan, Stage};

use crate::error::RuntimeError;
use crate::exec::{self, write_path, ExtraArgs};
use crate::object::{Object, ObjectRef};
use crate::stream::Stream;
use crate::subject::Subject;
use crate::subscription::{CompositeSubscription, Subscription};
use crate::value::Value;

/// A live binding. Dropping the handle disposes the binding.
#[derive(Debug)]
pub struct BindingHandle {
    subscription: CompositeSubscription,
    pipeline: Stream<Value>,
    changes: Option<Stream<Value>>,
}

impl BindingHandle {
    /// The source→target values as a cold stream (selector, converter and
    /// scheduler applied). Subscribing does not write to the target.
    pub fn pipeline(&self) -> &Stream<Value> {
        &self.pipeline
    }

    /// Tagged values from both directions, for tagged bindings.
    pub fn changes(&self) -> Option<&Stream<Value>> {
        self.changes.as_ref()
    }

    pub fn dispose(&self) {
        self.subscription.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.is_disposed()
    }
}

/// Activate `plan` between `source_root` (root of `plan.source_path`) and
/// `target_root` (root of `plan.target_path`).
pub fn activate(
    plan: &BindingPlan,
    source_root: &ObjectRef,
    target_root: &ObjectRef,
    args: &ExtraArgs,
) -> Result<BindingHandle, RuntimeError> {
    let changes = (plan.mode == BindingMode::Tagged).then(Subject::new);

    let forward = direction(&plan.source, &plan.to_target, source_root, args, changes.as_ref())?;
    let backward = plan
        .target
        .as_ref()
        .map(|target| direction(target, &plan.to_source, target_root, args, changes.as_ref()))
        .transpose()?;

    tracing::debug!(
        mode = ?plan.mode,
        source = %plan.source_path,
        target = %plan.target_path,
        "activating binding"
    );

    let subscription = CompositeSubscription::new();
    subscription.add(write_into(&forward.tapped, target_root, &plan.target_path));
    if let Some(backward) = &backward {
        subscription.add(write_into(&backward.tapped, source_root, &plan.source_path));
    }

    Ok(BindingHandle {
        subscription,
        pipeline: forward.plain,
        changes: changes.map(|subject| subject.stream()),
    })
}

struct Direction {
    /// Values as delivered to the writer, publishing tags on the way.
    tapped: Stream<Value>,
    /// The same values without tag publication.
    plain: Stream<Value>,
}

fn direction(
    plan: &PipelinePlan,
    operators: &[Stage],
    root: &ObjectRef,
    args: &ExtraArgs,
    changes: Option<&Subject<Value>>,
) -> Result<Direction, RuntimeError> {
    let mut stream = exec::observe(plan, root, args)?;
    let mut tag = None;
    for stage in operators {
        match stage {
            Stage::TagAndMerge(origin) => tag = Some(*origin),
            other => stream = exec::apply(other, stream, root, args)?,
        }
    }

    let tapped = match (tag, changes) {
        (Some(origin), Some(changes)) => {
            let changes = changes.clone();
            stream.map(move |value| {
                changes.next(Value::tagged(origin, value.clone()));
                value
            })
        }
        (Some(_), None) => {
            return Err(RuntimeError::InvalidPlan("tagging in an untagged binding"));
        }
        (None, _) => stream.clone(),
    };
    Ok(Direction {
        tapped,
        plain: stream,
    })
}

fn write_into(stream: &Stream<Value>, root: &ObjectRef, path: &PropertyPath) -> Subscription {
    let root: Weak<Object> = Arc::downgrade(root);
    let path = path.clone();
    stream.subscribe(move |value| {
        if let Some(root) = root.upgrade() {
            write_path(&root, &path, value);
        }
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
