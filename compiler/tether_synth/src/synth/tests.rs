use pretty_assertions::assert_eq;
use tether_ir::{CapabilityTable, TypeCapability};

use super::*;
use crate::test_helpers::{address_city, capabilities, observe, person_age, person_any, person_name};

#[test]
fn single_segment_after_change() {
    let plan = synthesize_path(&person_name(), NotificationMode::AfterChange, &capabilities());
    assert_eq!(plan.describe(), "watch(Name, after)");
}

#[test]
fn single_segment_before_change() {
    let plan = synthesize_path(&person_name(), NotificationMode::BeforeChange, &capabilities());
    assert_eq!(plan.describe(), "watch(Name, before)");
}

#[test]
fn missing_capability_degrades_to_constant() {
    let plan = synthesize_path(&person_name(), NotificationMode::AfterChange, &CapabilityTable::default());
    assert!(plan.is_constant());
    assert_eq!(plan.describe(), "constant(Name)");
}

#[test]
fn missing_mode_degrades_to_constant() {
    let caps = CapabilityTable::builder()
        .with("Person", TypeCapability::AFTER_ONLY)
        .build();
    let plan = synthesize_path(&address_city(), NotificationMode::BeforeChange, &caps);
    assert_eq!(plan.describe(), "constant(Address.City)");
}

#[test]
fn after_change_chain_gets_trailing_distinct() {
    let plan = synthesize_path(&address_city(), NotificationMode::AfterChange, &capabilities());
    assert_eq!(
        plan.describe(),
        "watch(Address, after) | chain(City, after) | distinct"
    );
}

#[test]
fn before_change_chain_has_no_distinct() {
    let plan = synthesize_path(&address_city(), NotificationMode::BeforeChange, &capabilities());
    assert_eq!(plan.describe(), "watch(Address, before) | chain(City, before)");
    assert!(!plan.stages().contains(&Stage::DistinctFilter));
}

#[test]
fn any_property_sentinel_is_watched_verbatim() {
    let plan = synthesize_path(&person_any(), NotificationMode::AfterChange, &capabilities());
    match plan.source() {
        Stage::Watch { segment, .. } => assert_eq!(segment.property_name, ""),
        other => panic!("expected a watch stage, got {other:?}"),
    }
}

#[test]
fn single_path_selector() {
    let site = observe(vec![person_name()], "int", 1).with_flags(CallSiteFlags::HAS_SELECTOR);
    let plan = synthesize_observation(&site, &capabilities());
    assert_eq!(plan.describe(), "watch(Name, after) | select(selector)");
}

#[test]
fn multiple_paths_combine_latest() {
    let site = observe(vec![person_name(), address_city()], "(string, string)", 1);
    let plan = synthesize_observation(&site, &capabilities());
    assert_eq!(
        plan.describe(),
        "combine_latest[watch(Name, after); watch(Address, after) | chain(City, after) | distinct]"
    );
}

#[test]
fn multiple_paths_with_selector_and_scheduler() {
    let site = observe(vec![person_name(), person_age()], "string", 1)
        .with_flags(CallSiteFlags::HAS_SELECTOR | CallSiteFlags::HAS_SCHEDULER);
    let plan = synthesize_observation(&site, &capabilities());
    assert_eq!(
        plan.describe(),
        "combine_latest[watch(Name, after); watch(Age, after)] | select(selector) | observe_on"
    );
}

#[test]
fn multiple_paths_before_change() {
    let site = observe(vec![person_name(), address_city()], "(string, string)", 1)
        .with_flags(CallSiteFlags::IS_BEFORE_CHANGE);
    let plan = synthesize_observation(&site, &capabilities());
    assert_eq!(
        plan.describe(),
        "combine_latest[watch(Name, before); watch(Address, before) | chain(City, before)]"
    );
}
