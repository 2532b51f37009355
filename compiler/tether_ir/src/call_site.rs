//! Resolved call sites.
//!
//! A [`CallSite`] is one textual invocation of an observation or binding
//! operation, fully resolved by the extraction stage: owner type, every
//! property type, flags, location and the verbatim argument-expression text
//! for each property path.

use std::fmt;

use bitflags::bitflags;

use crate::path::PropertyPath;
use crate::types::{NotificationMode, TypeRef};

/// The operation a call site invokes.
///
/// Call sites of different kinds never share a generated unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallKind {
    /// Observe one property path (possibly a deep chain).
    Observe,
    /// Observe several independent paths together.
    ObserveMany,
    /// Observe one or more paths, wrapping each value in an observed-change record.
    WhenAny,
    /// Observe properties whose values are themselves streams, and flatten them.
    WhenAnyObservable,
    /// Push source values into a target property.
    OneWayBind,
    /// Keep a source and a target property in sync in both directions.
    TwoWayBind,
    /// Two-way binding that also exposes an origin-tagged change stream.
    TaggedBind,
}

impl CallKind {
    /// Every kind, in generation order.
    pub const ALL: [CallKind; 7] = [
        CallKind::Observe,
        CallKind::ObserveMany,
        CallKind::WhenAny,
        CallKind::WhenAnyObservable,
        CallKind::OneWayBind,
        CallKind::TwoWayBind,
        CallKind::TaggedBind,
    ];

    /// Prefix for generated entry-point and implementation names.
    pub fn entry_name(self) -> &'static str {
        match self {
            CallKind::Observe => "when_changed",
            CallKind::ObserveMany => "when_changed_many",
            CallKind::WhenAny => "when_any",
            CallKind::WhenAnyObservable => "when_any_observable",
            CallKind::OneWayBind => "bind_one_way",
            CallKind::TwoWayBind => "bind_two_way",
            CallKind::TaggedBind => "bind_tagged",
        }
    }

    /// Kinds whose result is a binding rather than a stream.
    pub fn is_binding(self) -> bool {
        matches!(
            self,
            CallKind::OneWayBind | CallKind::TwoWayBind | CallKind::TaggedBind
        )
    }

    /// Kinds that write back into the source.
    pub fn is_bidirectional(self) -> bool {
        matches!(self, CallKind::TwoWayBind | CallKind::TaggedBind)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_name())
    }
}

bitflags! {
    /// Optional features requested at a call site.
    ///
    /// Flags participate in the grouping key: two call sites that differ in
    /// any flag never share an entry point.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, PartialOrd, Ord)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CallSiteFlags: u8 {
        /// A user selector is applied to the observed value(s).
        const HAS_SELECTOR = 1 << 0;
        /// A converter (and, for two-way bindings, a back-converter) is supplied.
        const HAS_CONVERSION = 1 << 1;
        /// Delivery is relocated onto a user scheduler.
        const HAS_SCHEDULER = 1 << 2;
        /// Watch pending changes instead of completed ones.
        const IS_BEFORE_CHANGE = 1 << 3;
    }
}

/// Where a call site appears in application source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        SourceLocation {
            file: file.into(),
            line,
        }
    }

    /// The last two components of the file path, joined with `/`.
    ///
    /// Both `/` and `\` count as separators, so `C:\src\Views\Main.cs`
    /// and `/src/Views/Main.cs` yield the same suffix `Views/Main.cs`.
    pub fn path_suffix(&self) -> String {
        let mut parts = self
            .file
            .rsplit(['/', '\\'])
            .filter(|part| !part.is_empty());
        match (parts.next(), parts.next()) {
            (Some(file), Some(dir)) => format!("{dir}/{file}"),
            (Some(file), None) => file.to_string(),
            _ => String::new(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One resolved invocation.
///
/// For binding kinds, `paths[0]` is the source path (rooted at the source
/// object) and `paths[1]` the target path (rooted at the owner). For every
/// other kind, all paths are rooted at the owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallSite {
    pub kind: CallKind,
    pub owner_type: TypeRef,
    pub paths: Vec<PropertyPath>,
    pub result_type: TypeRef,
    pub flags: CallSiteFlags,
    pub location: SourceLocation,
    /// Verbatim text of each property-expression argument, one per path.
    pub argument_texts: Vec<String>,
}

impl CallSite {
    pub fn new(
        kind: CallKind,
        owner_type: TypeRef,
        paths: Vec<PropertyPath>,
        result_type: TypeRef,
    ) -> Self {
        CallSite {
            kind,
            owner_type,
            paths,
            result_type,
            flags: CallSiteFlags::empty(),
            location: SourceLocation::default(),
            argument_texts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: CallSiteFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_argument_texts<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argument_texts = texts.into_iter().map(Into::into).collect();
        self
    }

    /// Notification mode requested by the flags.
    pub fn mode(&self) -> NotificationMode {
        if self.flags.contains(CallSiteFlags::IS_BEFORE_CHANGE) {
            NotificationMode::BeforeChange
        } else {
            NotificationMode::AfterChange
        }
    }

    #[inline]
    pub fn has(&self, flag: CallSiteFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Text distinguishing this call site from others at the same location.
    ///
    /// The argument texts joined with `|`; falls back to the dotted paths
    /// when the extraction stage recorded no texts.
    pub fn discriminator(&self) -> String {
        if self.argument_texts.is_empty() {
            self.paths
                .iter()
                .map(PropertyPath::display)
                .collect::<Vec<_>>()
                .join("|")
        } else {
            self.argument_texts.join("|")
        }
    }
}
