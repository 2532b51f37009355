use pretty_assertions::assert_eq;
use tether_ir::{CallKind, CallSiteFlags};
use tether_synth::BindingOrigin;

use super::*;
use crate::test_helpers::{collect, name_to_text, person, upper, view};

#[test]
fn one_way_writes_initial_value_and_updates() {
    let plan = name_to_text(CallKind::OneWayBind, CallSiteFlags::empty());
    let (source, target) = (person("Ann"), view());
    let handle = activate(&plan, &source, &target, &ExtraArgs::default()).unwrap();

    assert_eq!(target.get("Text"), Value::str("Ann"));
    source.set("Name", "Bea");
    assert_eq!(target.get("Text"), Value::str("Bea"));

    // Target edits do not flow back.
    target.set("Text", "Cy");
    assert_eq!(source.get("Name"), Value::str("Bea"));
    assert!(handle.changes().is_none());

    handle.dispose();
    source.set("Name", "Dee");
    assert_eq!(target.get("Text"), Value::str("Cy"));
    assert_eq!(source.handler_count(), 0);
}

#[test]
fn two_way_does_not_echo_the_initial_write() {
    let plan = name_to_text(CallKind::TwoWayBind, CallSiteFlags::HAS_CONVERSION);
    let (source, target) = (person("ann"), view());
    let args = ExtraArgs::default()
        .with_converter(upper)
        .with_back_converter(|v| v);
    let _handle = activate(&plan, &source, &target, &args).unwrap();

    // Without the skip, the read-back "ANN" would overwrite the source.
    assert_eq!(target.get("Text"), Value::str("ANN"));
    assert_eq!(source.get("Name"), Value::str("ann"));

    target.set("Text", "bob");
    assert_eq!(source.get("Name"), Value::str("BOB"));
    assert_eq!(target.get("Text"), Value::str("BOB"));
}

#[test]
fn tagged_binding_publishes_both_directions() {
    let plan = name_to_text(CallKind::TaggedBind, CallSiteFlags::empty());
    let (source, target) = (person("Ann"), view());
    let handle = activate(&plan, &source, &target, &ExtraArgs::default()).unwrap();
    let Some(changes) = handle.changes() else {
        panic!("tagged binding exposes a change stream");
    };
    let (seen, _sub) = collect(changes);

    source.set("Name", "Bea");
    target.set("Text", "Cy");

    assert_eq!(
        *seen.lock(),
        vec![
            Value::tagged(BindingOrigin::Source, "Bea".into()),
            // The target read-back after the forward write.
            Value::tagged(BindingOrigin::Target, "Bea".into()),
            Value::tagged(BindingOrigin::Target, "Cy".into()),
            Value::tagged(BindingOrigin::Source, "Cy".into()),
        ]
    );
}

#[test]
fn missing_back_converter_fails_before_subscribing() {
    let plan = name_to_text(CallKind::TwoWayBind, CallSiteFlags::HAS_CONVERSION);
    let (source, target) = (person("Ann"), view());
    let args = ExtraArgs::default().with_converter(upper);

    let result = activate(&plan, &source, &target, &args);
    assert_eq!(
        result.err().map(|e| e.to_string()),
        Some("plan needs a back_converter but none was supplied".to_string())
    );
    assert_eq!(source.handler_count(), 0);
    assert_eq!(target.handler_count(), 0);
    assert_eq!(target.get("Text"), Value::Null);
}

#[test]
fn pipeline_is_cold_and_does_not_write() {
    let plan = name_to_text(CallKind::OneWayBind, CallSiteFlags::empty());
    let (source, target) = (person("Ann"), view());
    let handle = activate(&plan, &source, &target, &ExtraArgs::default()).unwrap();
    target.set("Text", "edited");

    let (seen, _sub) = collect(handle.pipeline());
    assert_eq!(*seen.lock(), vec![Value::str("Ann")]);
    assert_eq!(target.get("Text"), Value::str("edited"));
}

#[test]
fn dropping_the_handle_disposes() {
    let plan = name_to_text(CallKind::TwoWayBind, CallSiteFlags::empty());
    let (source, target) = (person("Ann"), view());
    let handle = activate(&plan, &source, &target, &ExtraArgs::default()).unwrap();
    assert_eq!(source.handler_count(), 1);
    assert_eq!(target.handler_count(), 1);

    drop(handle);
    assert_eq!(source.handler_count(), 0);
    assert_eq!(target.handler_count(), 0);
}
