use pretty_assertions::assert_eq;
use tether_ir::{CallSiteFlags, SourceLocation};

use super::*;
use crate::dispatch::{CallerInfo, MatchRule};
use crate::error::MalformedReason;
use crate::options::DispatchStrategy;
use crate::test_helpers::{address_city, bind, capabilities, observe, person_age, person_name};
use crate::validate::UnitProblem;

fn options(dispatch: DispatchStrategy) -> SynthOptions {
    SynthOptions {
        dispatch,
        validate: true,
    }
}

fn sample_sites() -> Vec<CallSite> {
    vec![
        observe(vec![person_name()], "string", 10),
        observe(vec![address_city()], "string", 20),
        observe(vec![person_age()], "int", 30),
    ]
}

#[test]
fn no_call_sites_generate_nothing() {
    let unit = generate(
        CallKind::Observe,
        &[],
        &capabilities(),
        &SynthOptions::default(),
    );
    assert_eq!(unit, Ok(None));
}

#[test]
fn one_entry_per_group_one_implementation_per_site() {
    let Ok(Some(unit)) = generate(
        CallKind::Observe,
        &sample_sites(),
        &capabilities(),
        &options(DispatchStrategy::ArgumentText),
    ) else {
        panic!("expected a unit");
    };

    assert_eq!(unit.kind, CallKind::Observe);
    assert_eq!(unit.entry_points.len(), 2);
    assert_eq!(unit.implementations.len(), 3);
    assert_eq!(unit.entry_points[0].arms.len(), 2);
    assert_eq!(unit.entry_points[1].arms.len(), 1);
    assert!(check_unit(&unit).is_empty());

    for entry in &unit.entry_points {
        assert!(entry.name.starts_with("when_changed_"));
        for arm in &entry.arms {
            assert!(unit.implementation(&arm.implementation).is_some());
        }
    }
}

#[test]
fn output_is_deterministic() {
    let sites = sample_sites();
    let opts = options(DispatchStrategy::Positional);
    let first = generate(CallKind::Observe, &sites, &capabilities(), &opts);
    let second = generate(CallKind::Observe, &sites, &capabilities(), &opts);
    assert_eq!(first, second);
}

#[test]
fn names_depend_on_location() {
    let a = observe(vec![person_name()], "string", 10);
    let b = observe(vec![person_name()], "string", 11);
    assert_ne!(implementation_name(&a), implementation_name(&b));
    assert_eq!(implementation_name(&a), implementation_name(&a.clone()));
    assert!(implementation_name(&a).starts_with("__when_changed_"));
    assert_eq!(implementation_name(&a).len(), "__when_changed_".len() + 16);
}

#[test]
fn positional_strategy_records_line_and_suffix() {
    let Ok(Some(unit)) = generate(
        CallKind::Observe,
        &sample_sites(),
        &capabilities(),
        &options(DispatchStrategy::Positional),
    ) else {
        panic!("expected a unit");
    };
    assert_eq!(
        unit.entry_points[0].arms[1].rule,
        MatchRule::Positional {
            line: 20,
            path_suffix: "Views/PersonView.cs".into(),
        }
    );

    let arm = unit.entry_points[0]
        .resolve(&CallerInfo::positional("/elsewhere/Views/PersonView.cs", 20));
    assert_eq!(
        arm.map(|a| a.implementation.clone()),
        Some(unit.implementations[1].name.clone())
    );
}

#[test]
fn malformed_site_aborts_the_pass() {
    let mut sites = sample_sites();
    sites.push(
        observe(vec![person_name()], "string", 40).with_flags(CallSiteFlags::HAS_CONVERSION),
    );
    let result = generate(
        CallKind::Observe,
        &sites,
        &capabilities(),
        &SynthOptions::default(),
    );
    assert_eq!(
        result,
        Err(SynthError::MalformedCallSite {
            kind: CallKind::Observe,
            location: SourceLocation::new("/src/app/Views/PersonView.cs", 40),
            reason: MalformedReason::ConversionNotAllowed,
        })
    );
}

#[test]
fn binding_sites_get_binding_plans() {
    let site = bind(CallKind::TwoWayBind, CallSiteFlags::empty(), 50);
    let Ok(Some(unit)) = generate(
        CallKind::TwoWayBind,
        &[site],
        &capabilities(),
        &SynthOptions::default(),
    ) else {
        panic!("expected a unit");
    };
    assert!(matches!(
        unit.implementations[0].plan,
        ImplPlan::Binding(ref plan) if plan.target.is_some()
    ));
    assert!(unit.entry_points[0].name.starts_with("bind_two_way_"));
}

#[test]
fn generate_all_orders_units_by_kind() {
    let sites = vec![
        bind(CallKind::OneWayBind, CallSiteFlags::empty(), 1),
        observe(vec![person_name()], "string", 2),
        observe(vec![person_name(), person_age()], "(string, int)", 3),
    ];
    let units = generate_all(&sites, &capabilities(), &SynthOptions::default());
    let kinds: Vec<CallKind> = units
        .map(|units| units.iter().map(|u| u.kind).collect())
        .unwrap_or_default();
    assert_eq!(
        kinds,
        vec![CallKind::Observe, CallKind::ObserveMany, CallKind::OneWayBind]
    );
}

#[test]
fn duplicate_call_site_is_reported_not_fatal() {
    let site = observe(vec![person_name()], "string", 10);
    let Ok(Some(unit)) = generate(
        CallKind::Observe,
        &[site.clone(), site],
        &capabilities(),
        &options(DispatchStrategy::ArgumentText),
    ) else {
        panic!("expected a unit");
    };
    assert_eq!(
        check_unit(&unit),
        vec![UnitProblem::DuplicateImplementationName(
            unit.implementations[0].name.clone()
        )]
    );
}

#[test]
fn same_line_sites_differing_in_flags_get_their_own_plans() {
    let plain = observe(vec![person_name()], "string", 40);
    let selecting = plain.clone().with_flags(CallSiteFlags::HAS_SELECTOR);
    assert_ne!(implementation_name(&plain), implementation_name(&selecting));

    let Ok(Some(unit)) = generate(
        CallKind::Observe,
        &[plain.clone(), selecting.clone()],
        &capabilities(),
        &options(DispatchStrategy::ArgumentText),
    ) else {
        panic!("expected a unit");
    };
    assert!(check_unit(&unit).is_empty());
    assert_eq!(unit.entry_points.len(), 2);

    let caller = CallerInfo::with_texts(["x => x.Name"], "/src/app/Views/PersonView.cs", 40);
    let routed: Vec<String> = [&plain, &selecting]
        .into_iter()
        .map(|site| {
            let entry = unit
                .entry_point(&entry_point_name(site.kind, &SignatureKey::of(site)))
                .and_then(|entry| entry.resolve(&caller))
                .and_then(|arm| unit.implementation(&arm.implementation));
            entry.map(|imp| imp.plan.describe()).unwrap_or_default()
        })
        .collect();
    assert_eq!(
        routed,
        vec![
            "watch(Name, after)".to_string(),
            "watch(Name, after) | select(selector)".to_string(),
        ]
    );
}
