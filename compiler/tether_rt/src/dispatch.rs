//! Invoking generated entry points.
//!
//! A [`Dispatcher`] owns the generated units and routes a call of an entry
//! point to the implementation whose arm accepts the caller, in arm order.
//! Extra arguments are forwarded unchanged.

use rustc_hash::FxHashMap;
use tether_synth::{CallerInfo, EntryPoint, GeneratedUnit, ImplPlan, Implementation};

use crate::bind::{self, BindingHandle};
use crate::error::RuntimeError;
use crate::exec::{self, ExtraArgs};
use crate::object::ObjectRef;
use crate::stream::Stream;
use crate::value::Value;

/// Runtime arguments of one entry-point call.
#[derive(Clone, Debug)]
pub struct Invocation {
    /// The object the call is made on; the target root of a binding.
    pub receiver: ObjectRef,
    /// The object a binding reads from.
    pub source: Option<ObjectRef>,
    pub args: ExtraArgs,
}

impl Invocation {
    pub fn on(receiver: ObjectRef) -> Self {
        Invocation {
            receiver,
            source: None,
            args: ExtraArgs::default(),
        }
    }

    #[must_use]
    pub fn from_source(mut self, source: ObjectRef) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: ExtraArgs) -> Self {
        self.args = args;
        self
    }
}

/// What an invoked implementation produced.
#[derive(Debug)]
pub enum Activation {
    Observation(Stream<Value>),
    Binding(BindingHandle),
}

impl Activation {
    pub fn into_stream(self) -> Option<Stream<Value>> {
        match self {
            Activation::Observation(stream) => Some(stream),
            Activation::Binding(_) => None,
        }
    }

    pub fn into_binding(self) -> Option<BindingHandle> {
        match self {
            Activation::Binding(handle) => Some(handle),
            Activation::Observation(_) => None,
        }
    }
}

/// Entry point location inside the owned units.
#[derive(Copy, Clone)]
struct EntryIndex {
    unit: usize,
    entry: usize,
}

pub struct Dispatcher {
    units: Vec<GeneratedUnit>,
    entries: FxHashMap<String, EntryIndex>,
}

impl Dispatcher {
    pub fn new(units: Vec<GeneratedUnit>) -> Self {
        let mut entries = FxHashMap::default();
        for (unit_index, unit) in units.iter().enumerate() {
            for (entry_index, entry) in unit.entry_points.iter().enumerate() {
                let index = EntryIndex {
                    unit: unit_index,
                    entry: entry_index,
                };
                if entries.insert(entry.name.clone(), index).is_some() {
                    tracing::warn!(entry = %entry.name, "duplicate entry point name; last one wins");
                }
            }
        }
        Dispatcher { units, entries }
    }

    pub fn units(&self) -> &[GeneratedUnit] {
        &self.units
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryPoint> {
        let index = self.entries.get(name)?;
        Some(&self.units[index.unit].entry_points[index.entry])
    }

    /// The implementation the first accepting arm of `entry` names.
    pub fn resolve(
        &self,
        entry: &str,
        caller: &CallerInfo,
    ) -> Result<&Implementation, RuntimeError> {
        let index = self
            .entries
            .get(entry)
            .ok_or_else(|| RuntimeError::UnknownEntryPoint(entry.to_owned()))?;
        let unit = &self.units[index.unit];
        let entry_point = &unit.entry_points[index.entry];

        let Some(arm) = entry_point.resolve(caller) else {
            tracing::error!(
                entry,
                file = %caller.file,
                line = caller.line,
                "no dispatch arm matches the caller; generated tables are stale"
            );
            return Err(RuntimeError::UnresolvedDispatch {
                entry: entry.to_owned(),
                file: caller.file.clone(),
                line: caller.line,
            });
        };

        unit.implementation(&arm.implementation)
            .ok_or_else(|| RuntimeError::UnknownImplementation {
                entry: entry.to_owned(),
                implementation: arm.implementation.clone(),
            })
    }

    /// Resolve and run the implementation for `caller`.
    pub fn invoke(
        &self,
        entry: &str,
        caller: &CallerInfo,
        invocation: &Invocation,
    ) -> Result<Activation, RuntimeError> {
        let implementation = self.resolve(entry, caller)?;
        tracing::trace!(entry, implementation = %implementation.name, "dispatching");

        match &implementation.plan {
            ImplPlan::Observation(plan) => {
                exec::observe(plan, &invocation.receiver, &invocation.args)
                    .map(Activation::Observation)
            }
            ImplPlan::Binding(plan) => {
                let source = invocation.source.as_ref().ok_or_else(|| {
                    RuntimeError::MissingSourceRoot {
                        implementation: implementation.name.clone(),
                    }
                })?;
                bind::activate(plan, source, &invocation.receiver, &invocation.args)
                    .map(Activation::Binding)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("units", &self.units.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}
