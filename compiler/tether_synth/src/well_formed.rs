//! Call-site preconditions.
//!
//! Everything here is checked before any plan is built. A failure is a
//! contract violation by the extraction stage, not a user error.

use tether_ir::{CallKind, CallSite, CallSiteFlags};

use crate::error::{MalformedReason, SynthError};
use crate::options::DispatchStrategy;

/// Reject `site` if it cannot be synthesized for `kind` under `dispatch`.
pub fn check_call_site(
    site: &CallSite,
    kind: CallKind,
    dispatch: DispatchStrategy,
) -> Result<(), SynthError> {
    check_inner(site, kind, dispatch).map_err(|reason| SynthError::MalformedCallSite {
        kind: site.kind,
        location: site.location.clone(),
        reason,
    })
}

fn check_inner(
    site: &CallSite,
    kind: CallKind,
    dispatch: DispatchStrategy,
) -> Result<(), MalformedReason> {
    if site.kind != kind {
        return Err(MalformedReason::KindMismatch {
            expected: kind,
            found: site.kind,
        });
    }

    let paths = site.paths.len();
    if paths == 0 {
        return Err(MalformedReason::NoPaths);
    }

    let arity_ok = match site.kind {
        CallKind::Observe => paths == 1,
        CallKind::ObserveMany => paths >= 2,
        CallKind::WhenAny | CallKind::WhenAnyObservable => true,
        CallKind::OneWayBind | CallKind::TwoWayBind | CallKind::TaggedBind => paths == 2,
    };
    if !arity_ok {
        return Err(MalformedReason::Arity {
            expected: expected_arity(site.kind),
            found: paths,
        });
    }

    // Exact-text dispatch needs one recorded text per path; positional
    // dispatch tolerates missing texts but not a partial set.
    let texts = site.argument_texts.len();
    let texts_ok = match dispatch {
        DispatchStrategy::ArgumentText => texts == paths,
        DispatchStrategy::Positional => texts == 0 || texts == paths,
    };
    if !texts_ok {
        return Err(MalformedReason::ArgumentTextCount {
            paths,
            found: texts,
        });
    }

    // Observation paths hang off the owner; for bindings only the target does.
    let owner_rooted = if site.kind.is_binding() {
        &site.paths[1..]
    } else {
        &site.paths[..]
    };
    let offset = site.paths.len() - owner_rooted.len();
    for (i, path) in owner_rooted.iter().enumerate() {
        if path.root_type().name != site.owner_type.name {
            return Err(MalformedReason::RootMismatch {
                index: i + offset,
                root: path.root_type().name.clone(),
                expected: site.owner_type.name.clone(),
            });
        }
    }

    if site.has(CallSiteFlags::IS_BEFORE_CHANGE)
        && !matches!(
            site.kind,
            CallKind::Observe | CallKind::ObserveMany | CallKind::WhenAny
        )
    {
        return Err(MalformedReason::BeforeChangeNotAllowed);
    }

    if site.kind == CallKind::WhenAnyObservable {
        if let Some((index, path)) = site.paths.iter().enumerate().find(|(_, p)| p.is_chain()) {
            return Err(MalformedReason::NestedObservable {
                index,
                len: path.len(),
            });
        }
    }

    if site.has(CallSiteFlags::HAS_CONVERSION) && !site.kind.is_binding() {
        return Err(MalformedReason::ConversionNotAllowed);
    }

    if site.has(CallSiteFlags::HAS_SELECTOR) && site.kind.is_bidirectional() {
        return Err(MalformedReason::SelectorNotAllowed);
    }

    Ok(())
}

fn expected_arity(kind: CallKind) -> &'static str {
    match kind {
        CallKind::Observe => "1",
        CallKind::ObserveMany => "at least 2",
        CallKind::WhenAny | CallKind::WhenAnyObservable => "at least 1",
        CallKind::OneWayBind | CallKind::TwoWayBind | CallKind::TaggedBind => "2",
    }
}
