//! Shared fixtures for synthesis tests.
//!
//! Model: `Person { Name: string, Age: int, Address: Address? }`,
//! `Address { City: string }`, `View { Text: string, Title: Label? }`,
//! `Label { Text: string }`, `Feed { Ticks: IObservable<int>?, Tocks: IObservable<int>? }`.

use tether_ir::{
    CallKind, CallSite, CallSiteFlags, CapabilityTable, PropertyPath, PropertyPathSegment,
    SourceLocation, TypeCapability, TypeRef,
};

pub(crate) fn seg(name: &str, ty: TypeRef, declaring: &str) -> PropertyPathSegment {
    PropertyPathSegment::new(name, ty, TypeRef::new(declaring))
}

pub(crate) fn person_name() -> PropertyPath {
    PropertyPath::single(seg("Name", TypeRef::new("string"), "Person"))
}

pub(crate) fn person_age() -> PropertyPath {
    PropertyPath::single(seg("Age", TypeRef::new("int"), "Person"))
}

pub(crate) fn person_any() -> PropertyPath {
    PropertyPath::single(seg("", TypeRef::new("Person"), "Person"))
}

pub(crate) fn address_city() -> PropertyPath {
    match PropertyPath::new([
        seg("Address", TypeRef::nullable("Address"), "Person"),
        seg("City", TypeRef::new("string"), "Address"),
    ]) {
        Ok(path) => path,
        Err(err) => panic!("fixture path is malformed: {err}"),
    }
}

pub(crate) fn view_text() -> PropertyPath {
    PropertyPath::single(seg("Text", TypeRef::new("string"), "View"))
}

pub(crate) fn feed_ticks() -> PropertyPath {
    PropertyPath::single(seg("Ticks", TypeRef::nullable("IObservable<int>"), "Feed"))
}

pub(crate) fn feed_tocks() -> PropertyPath {
    PropertyPath::single(seg("Tocks", TypeRef::nullable("IObservable<int>"), "Feed"))
}

/// Observation call site on `Person` at `file:line`.
pub(crate) fn observe(paths: Vec<PropertyPath>, result: &str, line: u32) -> CallSite {
    let kind = if paths.len() == 1 {
        CallKind::Observe
    } else {
        CallKind::ObserveMany
    };
    let texts: Vec<String> = paths
        .iter()
        .map(|p| format!("x => x.{}", p.display()))
        .collect();
    CallSite::new(kind, TypeRef::new("Person"), paths, TypeRef::new(result))
        .at(SourceLocation::new("/src/app/Views/PersonView.cs", line))
        .with_argument_texts(texts)
}

/// `view.Bind(person, p => p.Name, v => v.Text)` at `line`.
pub(crate) fn bind(kind: CallKind, flags: CallSiteFlags, line: u32) -> CallSite {
    CallSite::new(
        kind,
        TypeRef::new("View"),
        vec![person_name(), view_text()],
        TypeRef::new("string"),
    )
    .with_flags(flags)
    .at(SourceLocation::new("/src/app/Views/PersonView.cs", line))
    .with_argument_texts(["p => p.Name", "v => v.Text"])
}

/// Every fixture type raises both notifications, except `Feed` (after only).
pub(crate) fn capabilities() -> CapabilityTable {
    CapabilityTable::builder()
        .with("Person", TypeCapability::FULL)
        .with("Address", TypeCapability::FULL)
        .with("View", TypeCapability::FULL)
        .with("Label", TypeCapability::FULL)
        .with("Feed", TypeCapability::AFTER_ONLY)
        .build()
}
