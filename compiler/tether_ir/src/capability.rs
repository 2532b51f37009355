//! Change-notification capabilities per owner type.
//!
//! The extraction stage resolves, for every type that roots a property
//! path, whether it raises after-change and/or before-change notifications.
//! The table is built once before synthesis begins and is read-only after.

use rustc_hash::FxHashMap;

use crate::types::{NotificationMode, TypeRef};

/// Notification support of one type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeCapability {
    pub after_change: bool,
    pub before_change: bool,
}

impl TypeCapability {
    /// Raises both notifications.
    pub const FULL: TypeCapability = TypeCapability {
        after_change: true,
        before_change: true,
    };

    /// Raises only after-change notifications.
    pub const AFTER_ONLY: TypeCapability = TypeCapability {
        after_change: true,
        before_change: false,
    };

    #[inline]
    pub fn supports(self, mode: NotificationMode) -> bool {
        match mode {
            NotificationMode::AfterChange => self.after_change,
            NotificationMode::BeforeChange => self.before_change,
        }
    }
}

/// Immutable map from type name to [`TypeCapability`].
///
/// Lookup ignores nullability: `Address?` and `Address` share an entry.
#[derive(Clone, Debug, Default)]
pub struct CapabilityTable {
    entries: FxHashMap<String, TypeCapability>,
}

impl CapabilityTable {
    pub fn builder() -> CapabilityTableBuilder {
        CapabilityTableBuilder::default()
    }

    /// Capability of `ty`, or `None` if the extraction stage recorded nothing.
    pub fn get(&self, ty: &TypeRef) -> Option<TypeCapability> {
        self.entries.get(&ty.name).copied()
    }

    /// Whether `ty` raises notifications for `mode`. Absent entries do not.
    pub fn supports(&self, ty: &TypeRef, mode: NotificationMode) -> bool {
        self.get(ty).is_some_and(|cap| cap.supports(mode))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates entries for a [`CapabilityTable`].
#[derive(Debug, Default)]
pub struct CapabilityTableBuilder {
    entries: FxHashMap<String, TypeCapability>,
}

impl CapabilityTableBuilder {
    /// Record `capability` for the type named `name`. Later entries win.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, capability: TypeCapability) -> Self {
        self.entries.insert(name.into(), capability);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, capability: TypeCapability) {
        self.entries.insert(name.into(), capability);
    }

    pub fn build(self) -> CapabilityTable {
        CapabilityTable {
            entries: self.entries,
        }
    }
}
