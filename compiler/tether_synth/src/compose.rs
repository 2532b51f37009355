//! Binding composition.
//!
//! Layers binding semantics on top of [`synthesize_path`](crate::synth::synthesize_path):
//!
//! - **One-way**: source pipeline → selector/converter → scheduler → write target.
//! - **Two-way**: as one-way, plus the target pipeline → `skip(1)` →
//!   back-converter → scheduler → write source. Skipping exactly one value
//!   keeps the target's initial read-back from being written into the
//!   source as if the user had edited it.
//! - **Tagged**: as two-way, with each direction tagging its values and
//!   publishing them on one merged change stream.
//!
//! It also owns the two stream-shaping call kinds:
//!
//! - **`WhenAny`**: every per-path value is wrapped in an observed-change
//!   record before the selector runs.
//! - **`WhenAnyObservable`**: the watched property holds a stream; an absent
//!   value becomes an empty stream, then the result is flattened by switch
//!   (one property), merge (several, no selector), or combine-latest over the
//!   switched inner streams (several, with selector).

use tether_ir::{CallKind, CallSite, CallSiteFlags, CapabilityTable, NotificationMode};

use crate::error::{MalformedReason, SynthError};
use crate::options::DispatchStrategy;
use crate::plan::{BindingMode, BindingOrigin, BindingPlan, FuncSlot, PipelinePlan, Stage};
use crate::synth::{finish, synthesize_path, synthesize_paths};
use crate::well_formed::check_call_site;

/// Plan for a `WhenAny` call site.
pub fn compose_when_any(site: &CallSite, capabilities: &CapabilityTable) -> PipelinePlan {
    let mut inputs = synthesize_paths(site, capabilities, |path, plan| {
        let property = (!path.leaf().is_any_property()).then(|| path.display());
        plan.then(Stage::WrapChange { property })
    });

    let plan = if inputs.len() == 1 {
        inputs.remove(0)
    } else {
        PipelinePlan::from_source(Stage::CombineLatest { inputs })
    };
    finish(plan, site, site.has(CallSiteFlags::HAS_SELECTOR))
}

/// Plan for a `WhenAnyObservable` call site.
pub fn compose_when_any_observable(
    site: &CallSite,
    capabilities: &CapabilityTable,
) -> PipelinePlan {
    let selector = site.has(CallSiteFlags::HAS_SELECTOR);
    let mut inputs = synthesize_paths(site, capabilities, |_, plan| {
        plan.then(Stage::EmptyIfNull).then(Stage::SwitchLatest)
    });

    let plan = match (inputs.len(), selector) {
        (1, _) => inputs.remove(0),
        (_, false) => PipelinePlan::from_source(Stage::Merge { inputs }),
        (_, true) => PipelinePlan::from_source(Stage::CombineLatest { inputs }),
    };
    finish(plan, site, selector)
}

/// Plan for a one-way, two-way or tagged binding call site.
///
/// The site's preconditions are checked here as well, so a malformed site
/// is rejected even when it did not come through [`generate`](crate::generate).
pub fn compose_binding(
    site: &CallSite,
    capabilities: &CapabilityTable,
) -> Result<BindingPlan, SynthError> {
    let mode = match site.kind {
        CallKind::OneWayBind => BindingMode::OneWay,
        CallKind::TwoWayBind => BindingMode::TwoWay,
        CallKind::TaggedBind => BindingMode::Tagged,
        found => {
            return Err(SynthError::MalformedCallSite {
                kind: found,
                location: site.location.clone(),
                reason: MalformedReason::KindMismatch {
                    expected: CallKind::OneWayBind,
                    found,
                },
            });
        }
    };
    // Argument texts only matter for dispatch; the lenient strategy checks the rest.
    check_call_site(site, site.kind, DispatchStrategy::Positional)?;
    let [source_path, target_path] = site.paths.as_slice() else {
        return Err(SynthError::MalformedCallSite {
            kind: site.kind,
            location: site.location.clone(),
            reason: MalformedReason::Arity {
                expected: "2",
                found: site.paths.len(),
            },
        });
    };
    let (source_path, target_path) = (source_path.clone(), target_path.clone());
    let convert = site.has(CallSiteFlags::HAS_CONVERSION);
    let schedule = site.has(CallSiteFlags::HAS_SCHEDULER);
    let tagged = mode == BindingMode::Tagged;

    let source = synthesize_path(&source_path, NotificationMode::AfterChange, capabilities);

    let mut to_target = Vec::new();
    if site.has(CallSiteFlags::HAS_SELECTOR) {
        to_target.push(Stage::Select(FuncSlot::Selector));
    }
    if convert {
        to_target.push(Stage::Convert(FuncSlot::Converter));
    }
    if schedule {
        to_target.push(Stage::ObserveOn);
    }
    if tagged {
        to_target.push(Stage::TagAndMerge(BindingOrigin::Source));
    }

    let (target, to_source) = if mode == BindingMode::OneWay {
        (None, Vec::new())
    } else {
        let target = synthesize_path(&target_path, NotificationMode::AfterChange, capabilities);
        let mut to_source = vec![Stage::Skip(1)];
        if convert {
            to_source.push(Stage::Convert(FuncSlot::BackConverter));
        }
        if schedule {
            to_source.push(Stage::ObserveOn);
        }
        if tagged {
            to_source.push(Stage::TagAndMerge(BindingOrigin::Target));
        }
        (Some(target), to_source)
    };

    Ok(BindingPlan {
        mode,
        source_path,
        target_path,
        source,
        to_target,
        target,
        to_source,
    })
}
