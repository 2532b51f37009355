//! Resolved type references and notification modes.

use std::fmt;

/// A fully resolved type, as reported by the extraction stage.
///
/// Type identity is by name. Nullability travels with the reference because
/// deep property chains need to know whether an intermediate may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRef {
    pub name: String,
    pub nullable: bool,
}

impl TypeRef {
    /// A non-nullable type.
    pub fn new(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            nullable: false,
        }
    }

    /// A nullable type (`Name?`).
    pub fn nullable(name: impl Into<String>) -> Self {
        TypeRef {
            name: name.into(),
            nullable: true,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Which change notification a watch stage listens to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NotificationMode {
    /// Fires after the property value has been replaced.
    AfterChange,
    /// Fires while the change is pending; the observed value is the old one.
    BeforeChange,
}

impl NotificationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationMode::AfterChange => "after",
            NotificationMode::BeforeChange => "before",
        }
    }
}

impl fmt::Display for NotificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
