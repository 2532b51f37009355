//! Executing observation plans.
//!
//! [`observe`] turns a [`PipelinePlan`] into a cold [`Stream`] rooted at one
//! object. Every user function and the scheduler the plan needs are looked
//! up in [`ExtraArgs`] up front, so a plan that cannot run fails before
//! anything is subscribed.
//!
//! Path semantics:
//!
//! - A chain link whose parent is absent (or not an object) yields one
//!   [`Value::Null`] and waits for the parent to change.
//! - A constant read walks the path once per subscription; an absent
//!   intermediate yields [`Value::Null`].
//! - A write through a path whose intermediate is absent is dropped.

use std::sync::{Arc, Weak};

use tether_ir::{NotificationMode, PropertyPath, PropertyPathSegment};
use tether_synth::{FuncSlot, PipelinePlan, Stage};

use crate::error::RuntimeError;
use crate::object::{Object, ObjectRef};
use crate::scheduler::Scheduler;
use crate::stream::Stream;
use crate::subscription::Subscription;
use crate::value::{ObservedChange, Value};

/// A user function: selector, converter or back-converter.
pub type Func = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Arguments forwarded unchanged from an entry point to its implementation.
#[derive(Clone, Default)]
pub struct ExtraArgs {
    pub selector: Option<Func>,
    pub converter: Option<Func>,
    pub back_converter: Option<Func>,
    pub scheduler: Option<Arc<dyn Scheduler>>,
}

impl ExtraArgs {
    #[must_use]
    pub fn with_selector(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.selector = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_converter(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.converter = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_back_converter(
        mut self,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.back_converter = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn func(&self, slot: FuncSlot) -> Result<Func, RuntimeError> {
        let func = match slot {
            FuncSlot::Selector => &self.selector,
            FuncSlot::Converter => &self.converter,
            FuncSlot::BackConverter => &self.back_converter,
        };
        func.clone().ok_or(RuntimeError::MissingArgument(slot))
    }

    pub fn scheduler(&self) -> Result<Arc<dyn Scheduler>, RuntimeError> {
        self.scheduler.clone().ok_or(RuntimeError::MissingScheduler)
    }
}

impl std::fmt::Debug for ExtraArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtraArgs")
            .field("selector", &self.selector.is_some())
            .field("converter", &self.converter.is_some())
            .field("back_converter", &self.back_converter.is_some())
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

/// Execute an observation plan rooted at `root`.
pub fn observe(
    plan: &PipelinePlan,
    root: &ObjectRef,
    args: &ExtraArgs,
) -> Result<Stream<Value>, RuntimeError> {
    let mut stream = source(plan.source(), root, args)?;
    for stage in plan.operators() {
        stream = apply(stage, stream, root, args)?;
    }
    Ok(stream)
}

fn source(
    stage: &Stage,
    root: &ObjectRef,
    args: &ExtraArgs,
) -> Result<Stream<Value>, RuntimeError> {
    match stage {
        Stage::Watch { segment, mode } => Ok(root.watch(&segment.property_name, *mode)),
        Stage::ConstantReturn { path } => Ok(constant(root, path.clone())),
        Stage::CombineLatest { inputs } => {
            let streams = inputs
                .iter()
                .map(|input| observe(input, root, args))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Stream::combine_latest(streams).map(Value::Tuple))
        }
        Stage::Merge { inputs } => {
            let streams = inputs
                .iter()
                .map(|input| observe(input, root, args))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Stream::merge(streams))
        }
        _ => Err(RuntimeError::InvalidPlan("pipeline does not start with a source")),
    }
}

/// Apply one operator stage. Tagging is only meaningful inside a binding
/// and is rejected here.
pub(crate) fn apply(
    stage: &Stage,
    stream: Stream<Value>,
    root: &ObjectRef,
    args: &ExtraArgs,
) -> Result<Stream<Value>, RuntimeError> {
    let stream = match stage {
        Stage::ChainSwitch { links, mode } => links
            .iter()
            .fold(stream, |parent, link| chain_link(&parent, link, *mode)),
        Stage::Select(slot) | Stage::Convert(slot) => {
            let f = args.func(*slot)?;
            stream.map(move |value| f(value))
        }
        Stage::WrapChange { property } => {
            let sender = Arc::downgrade(root);
            let property = property.clone();
            stream.map(move |value| wrap_change(&sender, property.as_ref(), value))
        }
        Stage::DistinctFilter => stream.distinct_until_changed(),
        Stage::Skip(count) => stream.skip(*count),
        Stage::EmptyIfNull => stream.map(|value| match value {
            Value::Stream(_) => value,
            _ => Value::Stream(Stream::empty()),
        }),
        Stage::SwitchLatest => stream
            .map(|value| match value {
                Value::Stream(inner) => inner,
                _ => Stream::empty(),
            })
            .switch_latest(),
        Stage::ObserveOn => stream.observe_on(args.scheduler()?),
        Stage::TagAndMerge(_) => {
            return Err(RuntimeError::InvalidPlan("tagging outside a binding"));
        }
        Stage::Watch { .. }
        | Stage::ConstantReturn { .. }
        | Stage::CombineLatest { .. }
        | Stage::Merge { .. } => {
            return Err(RuntimeError::InvalidPlan("source stage in operator position"));
        }
    };
    Ok(stream)
}

fn chain_link(
    parent: &Stream<Value>,
    link: &PropertyPathSegment,
    mode: NotificationMode,
) -> Stream<Value> {
    let property: Arc<str> = Arc::from(link.property_name.as_str());
    parent.switch_map(move |value| match value {
        Value::Object(object) => object.watch(&property, mode),
        _ => Stream::just(Value::Null),
    })
}

fn wrap_change(sender: &Weak<Object>, property: Option<&String>, value: Value) -> Value {
    match sender.upgrade() {
        Some(sender) => Value::Change(Arc::new(ObservedChange {
            sender,
            property: property.cloned(),
            value,
        })),
        None => Value::Null,
    }
}

fn constant(root: &ObjectRef, path: PropertyPath) -> Stream<Value> {
    let root = Arc::downgrade(root);
    Stream::new(move |observer| {
        let value = root
            .upgrade()
            .map_or(Value::Null, |root| read_path(&root, &path));
        observer(value);
        Subscription::empty()
    })
}

/// Walk `path` from `root`; an absent intermediate yields [`Value::Null`].
pub fn read_path(root: &ObjectRef, path: &PropertyPath) -> Value {
    let mut current = Value::Object(Arc::clone(root));
    for segment in path.segments() {
        current = match &current {
            Value::Object(object) => object.read(&segment.property_name),
            _ => return Value::Null,
        };
    }
    current
}

/// Assign `value` to the leaf of `path`. Returns whether the leaf changed;
/// the write is dropped when an intermediate link is absent.
pub fn write_path(root: &ObjectRef, path: &PropertyPath, value: Value) -> bool {
    let segments = path.segments();
    let (leaf, links) = match segments.split_last() {
        Some(split) => split,
        None => return false,
    };
    if leaf.is_any_property() {
        return false;
    }

    let mut owner = Arc::clone(root);
    for link in links {
        match owner.get(&link.property_name) {
            Value::Object(next) => owner = next,
            _ => {
                tracing::trace!(%path, at = %link.property_name, "write dropped: absent link");
                return false;
            }
        }
    }
    owner.set(&leaf.property_name, value)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
