//! Property paths.
//!
//! A [`PropertyPath`] is the compile-time shape of an expression such as
//! `x => x.Address.City`: a root-first list of segments, each naming the
//! property, the type it yields and the type that declares it.
//!
//! # Invariants
//!
//! 1. A path is never empty. [`PropertyPath::new`] rejects an empty
//!    segment list and [`PropertyPath::single`] always has one segment.
//! 2. Segment `i + 1` is declared on the property type of segment `i`
//!    (by name; nullability is ignored for this check).
//! 3. An empty property name is the *any-property* sentinel: it means
//!    "notify on any property change" and is preserved verbatim.

use std::fmt;

use smallvec::SmallVec;

use crate::types::TypeRef;

/// One property access in a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyPathSegment {
    pub property_name: String,
    pub property_type: TypeRef,
    pub declaring_type: TypeRef,
}

impl PropertyPathSegment {
    pub fn new(
        property_name: impl Into<String>,
        property_type: TypeRef,
        declaring_type: TypeRef,
    ) -> Self {
        PropertyPathSegment {
            property_name: property_name.into(),
            property_type,
            declaring_type,
        }
    }

    /// Whether this segment is the "any property changed" sentinel.
    #[inline]
    pub fn is_any_property(&self) -> bool {
        self.property_name.is_empty()
    }
}

/// Error constructing a [`PropertyPath`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathError {
    /// No segments were supplied.
    Empty,
    /// Segment `index` is declared on a type other than its parent's property type.
    Disconnected {
        index: usize,
        expected: String,
        found: String,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Empty => f.write_str("property path has no segments"),
            PathError::Disconnected {
                index,
                expected,
                found,
            } => write!(
                f,
                "segment {index} is declared on `{found}` but its parent yields `{expected}`"
            ),
        }
    }
}

impl std::error::Error for PathError {}

/// Non-empty, root-first sequence of property segments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<PropertyPathSegment>", into = "Vec<PropertyPathSegment>")
)]
pub struct PropertyPath {
    segments: SmallVec<[PropertyPathSegment; 4]>,
}

impl PropertyPath {
    /// Build a path, rejecting empty or disconnected segment lists.
    pub fn new(segments: impl IntoIterator<Item = PropertyPathSegment>) -> Result<Self, PathError> {
        let segments: SmallVec<[PropertyPathSegment; 4]> = segments.into_iter().collect();
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for (index, pair) in segments.windows(2).enumerate() {
            let (parent, child) = (&pair[0], &pair[1]);
            if parent.property_type.name != child.declaring_type.name {
                return Err(PathError::Disconnected {
                    index: index + 1,
                    expected: parent.property_type.name.clone(),
                    found: child.declaring_type.name.clone(),
                });
            }
        }
        Ok(PropertyPath { segments })
    }

    /// Single-segment path.
    pub fn single(segment: PropertyPathSegment) -> Self {
        let mut segments = SmallVec::new();
        segments.push(segment);
        PropertyPath { segments }
    }

    #[inline]
    pub fn segments(&self) -> &[PropertyPathSegment] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// More than one segment: needs switch composition.
    #[inline]
    pub fn is_chain(&self) -> bool {
        self.segments.len() > 1
    }

    /// The first segment.
    pub fn root(&self) -> &PropertyPathSegment {
        &self.segments[0]
    }

    /// The last segment.
    pub fn leaf(&self) -> &PropertyPathSegment {
        &self.segments[self.segments.len() - 1]
    }

    /// The type the path starts from.
    pub fn root_type(&self) -> &TypeRef {
        &self.root().declaring_type
    }

    /// The type the path yields.
    pub fn leaf_type(&self) -> &TypeRef {
        &self.leaf().property_type
    }

    /// Dotted member-access text, e.g. `Address.City`.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&segment.property_name);
        }
        out
    }
}

impl TryFrom<Vec<PropertyPathSegment>> for PropertyPath {
    type Error = PathError;

    fn try_from(segments: Vec<PropertyPathSegment>) -> Result<Self, Self::Error> {
        PropertyPath::new(segments)
    }
}

impl From<PropertyPath> for Vec<PropertyPathSegment> {
    fn from(path: PropertyPath) -> Self {
        path.segments.into_vec()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
