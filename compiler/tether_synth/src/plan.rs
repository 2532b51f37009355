//! Synthesized plans.
//!
//! A [`PipelinePlan`] is an ordered list of stages: the first stage is a
//! *source* (something that produces values when subscribed), every later
//! stage is an *operator* applied to the stream produced so far. Nested
//! plans appear inside `CombineLatest` and `Merge`.
//!
//! A [`BindingPlan`] pairs a source pipeline with an optional target
//! pipeline plus the operators applied in each direction before a value is
//! written through the opposite property path.
//!
//! Plans are derived data: built once per call site, never mutated.

use std::fmt::{self, Write as _};

use tether_ir::{NotificationMode, PropertyPath, PropertyPathSegment};

/// User-supplied function forwarded by dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FuncSlot {
    /// Maps the observed value (or aggregate) to the result.
    Selector,
    /// Source → target conversion.
    Converter,
    /// Target → source conversion.
    BackConverter,
}

impl FuncSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            FuncSlot::Selector => "selector",
            FuncSlot::Converter => "converter",
            FuncSlot::BackConverter => "back_converter",
        }
    }
}

impl fmt::Display for FuncSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a binding a forwarded value came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingOrigin {
    Source,
    Target,
}

impl fmt::Display for BindingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingOrigin::Source => "source",
            BindingOrigin::Target => "target",
        })
    }
}

/// One pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    // Sources
    /// Current value of `segment` on the root, then one value per notification.
    Watch {
        segment: PropertyPathSegment,
        mode: NotificationMode,
    },
    /// Read `path` once at subscription time; never updates.
    ConstantReturn { path: PropertyPath },
    /// Emit a tuple once every input has emitted, then on every input emission.
    CombineLatest { inputs: Vec<PipelinePlan> },
    /// Interleave every input's emissions.
    Merge { inputs: Vec<PipelinePlan> },

    // Operators
    /// For each link, switch to watching the latest parent value; an absent
    /// parent yields one absent value.
    ChainSwitch {
        links: Vec<PropertyPathSegment>,
        mode: NotificationMode,
    },
    /// Apply a user selector.
    Select(FuncSlot),
    /// Apply a user converter.
    Convert(FuncSlot),
    /// Wrap each value in an observed-change record.
    WrapChange { property: Option<String> },
    /// Drop consecutive duplicates.
    DistinctFilter,
    /// Drop the first `n` values.
    Skip(usize),
    /// Replace an absent stream-valued property with an empty stream.
    EmptyIfNull,
    /// Flatten a stream of streams, following only the latest inner stream.
    SwitchLatest,
    /// Relocate delivery onto the user scheduler.
    ObserveOn,
    /// Tag each value with its origin and publish it on the merged change stream.
    TagAndMerge(BindingOrigin),
}

impl Stage {
    /// Whether the stage starts a pipeline.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            Stage::Watch { .. }
                | Stage::ConstantReturn { .. }
                | Stage::CombineLatest { .. }
                | Stage::Merge { .. }
        )
    }

    /// The user function this stage consumes, if any.
    pub fn func_slot(&self) -> Option<FuncSlot> {
        match self {
            Stage::Select(slot) | Stage::Convert(slot) => Some(*slot),
            _ => None,
        }
    }

    fn describe_into(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            Stage::Watch { segment, mode } => {
                write!(out, "watch({}, {mode})", segment_label(segment))
            }
            Stage::ConstantReturn { path } => write!(out, "constant({path})"),
            Stage::CombineLatest { inputs } => {
                out.push_str("combine_latest[");
                describe_list(inputs, out);
                out.push(']');
                Ok(())
            }
            Stage::Merge { inputs } => {
                out.push_str("merge[");
                describe_list(inputs, out);
                out.push(']');
                Ok(())
            }
            Stage::ChainSwitch { links, mode } => {
                out.push_str("chain(");
                for (i, link) in links.iter().enumerate() {
                    if i > 0 {
                        out.push('>');
                    }
                    out.push_str(&segment_label(link));
                }
                write!(out, ", {mode})")
            }
            Stage::Select(slot) => write!(out, "select({slot})"),
            Stage::Convert(slot) => write!(out, "convert({slot})"),
            Stage::WrapChange { property } => match property {
                Some(name) => write!(out, "wrap({name})"),
                None => write!(out, "wrap(*)"),
            },
            Stage::DistinctFilter => write!(out, "distinct"),
            Stage::Skip(n) => write!(out, "skip({n})"),
            Stage::EmptyIfNull => write!(out, "empty_if_null"),
            Stage::SwitchLatest => write!(out, "switch"),
            Stage::ObserveOn => write!(out, "observe_on"),
            Stage::TagAndMerge(origin) => write!(out, "tag({origin})"),
        };
    }
}

fn segment_label(segment: &PropertyPathSegment) -> String {
    if segment.is_any_property() {
        "*".to_string()
    } else {
        segment.property_name.clone()
    }
}

fn describe_list(plans: &[PipelinePlan], out: &mut String) {
    for (i, plan) in plans.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        plan.describe_into(out);
    }
}

/// Ordered stages for one observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelinePlan {
    stages: Vec<Stage>,
}

impl PipelinePlan {
    /// A plan starting at `source`.
    pub fn from_source(source: Stage) -> Self {
        debug_assert!(source.is_source(), "{source:?} is not a source stage");
        PipelinePlan {
            stages: vec![source],
        }
    }

    /// Append an operator.
    #[must_use]
    pub fn then(mut self, stage: Stage) -> Self {
        debug_assert!(!stage.is_source(), "{stage:?} is a source stage");
        self.stages.push(stage);
        self
    }

    /// Append `stage` when `cond` holds.
    #[must_use]
    pub fn then_if(self, cond: bool, stage: Stage) -> Self {
        if cond {
            self.then(stage)
        } else {
            self
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn source(&self) -> &Stage {
        &self.stages[0]
    }

    pub fn operators(&self) -> &[Stage] {
        &self.stages[1..]
    }

    /// Whether the plan degraded to a one-shot read.
    pub fn is_constant(&self) -> bool {
        matches!(self.source(), Stage::ConstantReturn { .. })
    }

    /// Every user function the plan (including nested plans) consumes.
    pub fn func_slots(&self) -> Vec<FuncSlot> {
        let mut slots = Vec::new();
        self.collect_slots(&mut slots);
        slots
    }

    fn collect_slots(&self, slots: &mut Vec<FuncSlot>) {
        for stage in &self.stages {
            match stage {
                Stage::CombineLatest { inputs } | Stage::Merge { inputs } => {
                    for input in inputs {
                        input.collect_slots(slots);
                    }
                }
                other => {
                    if let Some(slot) = other.func_slot() {
                        if !slots.contains(&slot) {
                            slots.push(slot);
                        }
                    }
                }
            }
        }
    }

    /// One-line summary, e.g. `watch(Address, after) | chain(City, after) | distinct`.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out);
        out
    }

    fn describe_into(&self, out: &mut String) {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            stage.describe_into(out);
        }
    }
}

impl fmt::Display for PipelinePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Direction set of a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BindingMode {
    OneWay,
    TwoWay,
    Tagged,
}

/// Synthesized binding.
///
/// Values flow `source → to_target → write(target_path)` and, for two-way
/// modes, `target → to_source → write(source_path)`. `to_source` always
/// starts with `Skip(1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingPlan {
    pub mode: BindingMode,
    pub source_path: PropertyPath,
    pub target_path: PropertyPath,
    pub source: PipelinePlan,
    pub to_target: Vec<Stage>,
    pub target: Option<PipelinePlan>,
    pub to_source: Vec<Stage>,
}

impl BindingPlan {
    pub fn describe(&self) -> String {
        let mut out = format!("{} ⇒ ", self.source.describe());
        for stage in &self.to_target {
            stage.describe_into(&mut out);
            out.push_str(" ⇒ ");
        }
        let _ = write!(out, "set({})", self.target_path);
        if let Some(target) = &self.target {
            let _ = write!(out, " ‖ {} ⇒ ", target.describe());
            for stage in &self.to_source {
                stage.describe_into(&mut out);
                out.push_str(" ⇒ ");
            }
            let _ = write!(out, "set({})", self.source_path);
        }
        out
    }
}

/// Plan attached to one synthesized implementation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImplPlan {
    Observation(PipelinePlan),
    Binding(BindingPlan),
}

impl ImplPlan {
    pub fn describe(&self) -> String {
        match self {
            ImplPlan::Observation(plan) => plan.describe(),
            ImplPlan::Binding(plan) => plan.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tether_ir::TypeRef;

    use super::*;

    fn seg(name: &str) -> PropertyPathSegment {
        PropertyPathSegment::new(name, TypeRef::new("string"), TypeRef::new("Person"))
    }

    #[test]
    fn describe_nested_plan() {
        let plan = PipelinePlan::from_source(Stage::CombineLatest {
            inputs: vec![
                PipelinePlan::from_source(Stage::Watch {
                    segment: seg("Name"),
                    mode: NotificationMode::AfterChange,
                }),
                PipelinePlan::from_source(Stage::Watch {
                    segment: seg(""),
                    mode: NotificationMode::BeforeChange,
                }),
            ],
        })
        .then(Stage::Select(FuncSlot::Selector));

        assert_eq!(
            plan.describe(),
            "combine_latest[watch(Name, after); watch(*, before)] | select(selector)"
        );
        assert_eq!(plan.func_slots(), vec![FuncSlot::Selector]);
    }

    #[test]
    fn then_if_skips_when_false() {
        let plan = PipelinePlan::from_source(Stage::Watch {
            segment: seg("Name"),
            mode: NotificationMode::AfterChange,
        })
        .then_if(false, Stage::DistinctFilter)
        .then_if(true, Stage::ObserveOn);

        assert_eq!(plan.operators(), &[Stage::ObserveOn]);
        assert!(!plan.is_constant());
    }
}
