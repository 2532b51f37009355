//! Generated units.
//!
//! One unit per call kind: the entry points (one per signature group) and
//! the private implementations (one per call site) they dispatch to.
//!
//! Names are derived from [`stable_hash`], so repeated runs over identical
//! input produce identical units.

use tether_ir::{stable_hash, CallKind, CallSite, CapabilityTable};

use crate::compose::{compose_binding, compose_when_any, compose_when_any_observable};
use crate::dispatch::{build_entry_point, EntryPoint};
use crate::error::SynthError;
use crate::group::{group_call_sites, SignatureKey, TypeSignatureGroup};
use crate::options::SynthOptions;
use crate::plan::ImplPlan;
use crate::synth::synthesize_observation;
use crate::validate::check_unit;
use crate::well_formed::check_call_site;

/// Synthesized implementation of one call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Implementation {
    pub name: String,
    pub call_site: CallSite,
    pub plan: ImplPlan,
}

/// Everything generated for one call kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub kind: CallKind,
    pub entry_points: Vec<EntryPoint>,
    pub implementations: Vec<Implementation>,
}

impl GeneratedUnit {
    pub fn entry_point(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.iter().find(|entry| entry.name == name)
    }

    pub fn implementation(&self, name: &str) -> Option<&Implementation> {
        self.implementations.iter().find(|imp| imp.name == name)
    }
}

/// Name of the implementation synthesized for `site`.
///
/// The discriminator carries the signature as well as the argument texts:
/// two sites on one line with the same texts but different flags or types
/// produce different plans.
pub fn implementation_name(site: &CallSite) -> String {
    let discriminator = format!(
        "{}@{}",
        site.discriminator(),
        SignatureKey::of(site).describe()
    );
    format!(
        "__{}_{}",
        site.kind.entry_name(),
        stable_hash(
            &site.owner_type.name,
            &site.location.file,
            site.location.line,
            &discriminator,
        )
    )
}

/// Name of the entry point serving `key`.
pub fn entry_point_name(kind: CallKind, key: &SignatureKey) -> String {
    format!(
        "{}_{}",
        kind.entry_name(),
        stable_hash(&key.owner_type.name, "", 0, &key.describe())
    )
}

/// The plan for one call site.
pub fn plan_call_site(
    site: &CallSite,
    capabilities: &CapabilityTable,
) -> Result<ImplPlan, SynthError> {
    Ok(match site.kind {
        CallKind::Observe | CallKind::ObserveMany => {
            ImplPlan::Observation(synthesize_observation(site, capabilities))
        }
        CallKind::WhenAny => ImplPlan::Observation(compose_when_any(site, capabilities)),
        CallKind::WhenAnyObservable => {
            ImplPlan::Observation(compose_when_any_observable(site, capabilities))
        }
        CallKind::OneWayBind | CallKind::TwoWayBind | CallKind::TaggedBind => {
            ImplPlan::Binding(compose_binding(site, capabilities)?)
        }
    })
}

/// Synthesize the unit for every call site of `kind`.
///
/// Returns `Ok(None)` when there are no call sites. Every site must be of
/// `kind` and well formed; the first violation aborts the pass.
pub fn generate(
    kind: CallKind,
    sites: &[CallSite],
    capabilities: &CapabilityTable,
    options: &SynthOptions,
) -> Result<Option<GeneratedUnit>, SynthError> {
    if sites.is_empty() {
        return Ok(None);
    }

    let _span = tracing::debug_span!("generate", %kind, sites = sites.len()).entered();

    for site in sites {
        check_call_site(site, kind, options.dispatch)?;
    }

    let groups = group_call_sites(sites);
    let mut entry_points = Vec::with_capacity(groups.len());
    let mut implementations = Vec::with_capacity(sites.len());

    for group in &groups {
        entry_points.push(synthesize_group(
            kind,
            group,
            capabilities,
            options,
            &mut implementations,
        )?);
    }

    let unit = GeneratedUnit {
        kind,
        entry_points,
        implementations,
    };

    if options.validate {
        for problem in check_unit(&unit) {
            tracing::warn!(%problem, "generated unit inconsistency");
        }
    }

    Ok(Some(unit))
}

fn synthesize_group(
    kind: CallKind,
    group: &TypeSignatureGroup,
    capabilities: &CapabilityTable,
    options: &SynthOptions,
    implementations: &mut Vec<Implementation>,
) -> Result<EntryPoint, SynthError> {
    let name = entry_point_name(kind, &group.key);
    tracing::debug!(
        entry = %name,
        members = group.members.len(),
        signature = %group.key.describe(),
        "synthesizing group"
    );

    let mut names = Vec::with_capacity(group.members.len());
    for site in &group.members {
        let plan = plan_call_site(site, capabilities)?;
        let imp_name = implementation_name(site);
        tracing::trace!(
            implementation = %imp_name,
            location = %site.location,
            plan = %plan.describe(),
            "synthesized call site"
        );
        names.push(imp_name.clone());
        implementations.push(Implementation {
            name: imp_name,
            call_site: site.clone(),
            plan,
        });
    }

    Ok(build_entry_point(name, group, &names, options.dispatch))
}

/// Synthesize a unit for every kind present in `sites`, in [`CallKind::ALL`] order.
pub fn generate_all(
    sites: &[CallSite],
    capabilities: &CapabilityTable,
    options: &SynthOptions,
) -> Result<Vec<GeneratedUnit>, SynthError> {
    let mut units = Vec::new();
    for kind in CallKind::ALL {
        let of_kind: Vec<CallSite> = sites.iter().filter(|s| s.kind == kind).cloned().collect();
        if let Some(unit) = generate(kind, &of_kind, capabilities, options)? {
            units.push(unit);
        }
    }
    Ok(units)
}

#[cfg(test)]
mod tests;
