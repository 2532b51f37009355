//! Pipeline synthesis for observation call sites.
//!
//! # Rules
//!
//! For one property path in mode `m`, with root capability `cap`:
//!
//! | Path | `cap` supports `m` | Plan |
//! |------|--------------------|------|
//! | any | no | `constant(path)` |
//! | 1 segment | yes | `watch(s0, m)` |
//! | k ≥ 2 segments, after | yes | `watch(s0, m) \| chain(s1..sk, m) \| distinct` |
//! | k ≥ 2 segments, before | yes | `watch(s0, m) \| chain(s1..sk, m)` |
//!
//! The chain stage re-subscribes on every parent emission ("switch on latest
//! parent"), so the leaf always reflects the current root-to-leaf chain.
//! After-change chains can deliver an unchanged leaf through two different
//! re-subscription triggers, so they get a trailing duplicate filter.
//! Before-change chains keep every pending transition: the transition itself
//! is the signal. An any-property leaf (empty name) re-emits the same owner on
//! every change, so it never gets the duplicate filter either.
//!
//! Several independent paths are synthesized one by one and joined with
//! `combine_latest`; the selector (if any) runs on the aggregate.

use tether_ir::{CallSite, CallSiteFlags, CapabilityTable, NotificationMode, PropertyPath};

use crate::plan::{FuncSlot, PipelinePlan, Stage};

/// Plan for a single property path.
pub fn synthesize_path(
    path: &PropertyPath,
    mode: NotificationMode,
    capabilities: &CapabilityTable,
) -> PipelinePlan {
    if !capabilities.supports(path.root_type(), mode) {
        tracing::debug!(
            root = %path.root_type(),
            path = %path,
            %mode,
            "owner lacks notification capability; observing a constant"
        );
        return PipelinePlan::from_source(Stage::ConstantReturn { path: path.clone() });
    }

    let watch = PipelinePlan::from_source(Stage::Watch {
        segment: path.root().clone(),
        mode,
    });
    if !path.is_chain() {
        return watch;
    }

    let suppress_duplicates =
        mode == NotificationMode::AfterChange && !path.leaf().is_any_property();
    watch
        .then(Stage::ChainSwitch {
            links: path.segments()[1..].to_vec(),
            mode,
        })
        .then_if(suppress_duplicates, Stage::DistinctFilter)
}

/// Per-path plans for every path of `site`, each finished with `per_path`.
pub(crate) fn synthesize_paths(
    site: &CallSite,
    capabilities: &CapabilityTable,
    per_path: impl Fn(&PropertyPath, PipelinePlan) -> PipelinePlan,
) -> Vec<PipelinePlan> {
    let mode = site.mode();
    site.paths
        .iter()
        .map(|path| per_path(path, synthesize_path(path, mode, capabilities)))
        .collect()
}

/// Plan for an `Observe` or `ObserveMany` call site.
pub fn synthesize_observation(site: &CallSite, capabilities: &CapabilityTable) -> PipelinePlan {
    let selector = site.has(CallSiteFlags::HAS_SELECTOR);
    let plan = if let [path] = site.paths.as_slice() {
        synthesize_path(path, site.mode(), capabilities)
    } else {
        PipelinePlan::from_source(Stage::CombineLatest {
            inputs: synthesize_paths(site, capabilities, |_, plan| plan),
        })
    };
    finish(plan, site, selector)
}

/// Selector then scheduler, in that order.
pub(crate) fn finish(plan: PipelinePlan, site: &CallSite, selector: bool) -> PipelinePlan {
    plan.then_if(selector, Stage::Select(FuncSlot::Selector))
        .then_if(site.has(CallSiteFlags::HAS_SCHEDULER), Stage::ObserveOn)
}

#[cfg(test)]
mod tests;
