//! Shared fixtures for runtime tests.
//!
//! Same model as the synthesis fixtures: `Person { Name, Age, Address? }`,
//! `Address { City }`, `View { Text }`.

use std::sync::Arc;

use parking_lot::Mutex;
use tether_ir::{
    CallKind, CallSite, CallSiteFlags, CapabilityTable, PropertyPath, PropertyPathSegment,
    SourceLocation, TypeCapability, TypeRef,
};
use tether_synth::{compose_binding, BindingPlan};

use crate::object::{Object, ObjectRef};
use crate::stream::Stream;
use crate::subscription::Subscription;
use crate::value::Value;

pub(crate) type Seen = Arc<Mutex<Vec<Value>>>;

pub(crate) fn seg(name: &str, ty: &str, declaring: &str) -> PropertyPathSegment {
    PropertyPathSegment::new(name, TypeRef::new(ty), TypeRef::new(declaring))
}

pub(crate) fn person_name() -> PropertyPath {
    PropertyPath::single(seg("Name", "string", "Person"))
}

pub(crate) fn view_text() -> PropertyPath {
    PropertyPath::single(seg("Text", "string", "View"))
}

pub(crate) fn capabilities() -> CapabilityTable {
    CapabilityTable::builder()
        .with("Person", TypeCapability::FULL)
        .with("Address", TypeCapability::FULL)
        .with("View", TypeCapability::FULL)
        .build()
}

pub(crate) fn person(name: &str) -> ObjectRef {
    let person = Object::new("Person", TypeCapability::FULL);
    person.init("Name", name);
    person
}

pub(crate) fn view() -> ObjectRef {
    Object::new("View", TypeCapability::FULL)
}

/// Binding plan for `view.Bind(person, p => p.Name, v => v.Text)`.
pub(crate) fn name_to_text(kind: CallKind, flags: CallSiteFlags) -> BindingPlan {
    let site = CallSite::new(
        kind,
        TypeRef::new("View"),
        vec![person_name(), view_text()],
        TypeRef::new("string"),
    )
    .with_flags(flags)
    .at(SourceLocation::new("/src/app/Views/PersonView.cs", 40))
    .with_argument_texts(["p => p.Name", "v => v.Text"]);
    match compose_binding(&site, &capabilities()) {
        Ok(plan) => plan,
        Err(err) => panic!("fixture binding is malformed: {err}"),
    }
}

pub(crate) fn collect(stream: &Stream<Value>) -> (Seen, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = stream.subscribe(move |v| sink.lock().push(v));
    (seen, sub)
}

pub(crate) fn upper(value: Value) -> Value {
    value
        .as_str()
        .map_or(Value::Null, |s| Value::from(s.to_uppercase()))
}
