//! Dynamic values flowing through executed plans.

use std::fmt;
use std::sync::Arc;

use tether_synth::BindingOrigin;

use crate::object::ObjectRef;
use crate::stream::Stream;

/// A property value or pipeline element.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value; also what an absent intermediate link yields.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Object(ObjectRef),
    /// One element per input of a combine-latest source.
    Tuple(Vec<Value>),
    /// A stream-valued property.
    Stream(Stream<Value>),
    Change(Arc<ObservedChange>),
    /// A binding value tagged with the side it came from.
    Tagged {
        origin: BindingOrigin,
        value: Box<Value>,
    },
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_change(&self) -> Option<&ObservedChange> {
        match self {
            Value::Change(change) => Some(change),
            _ => None,
        }
    }

    pub fn tagged(origin: BindingOrigin, value: Value) -> Self {
        Value::Tagged {
            origin,
            value: Box::new(value),
        }
    }
}

/// Objects and streams compare by identity, everything else structurally.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Stream(a), Value::Stream(b)) => a.ptr_eq(b),
            (Value::Change(a), Value::Change(b)) => a == b,
            (
                Value::Tagged {
                    origin: oa,
                    value: va,
                },
                Value::Tagged {
                    origin: ob,
                    value: vb,
                },
            ) => oa == ob && va == vb,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(object) => write!(f, "<{}>", object.type_name()),
            Value::Tuple(items) => f.debug_list().entries(items).finish(),
            Value::Stream(_) => f.write_str("<stream>"),
            Value::Change(change) => fmt::Debug::fmt(&**change, f),
            Value::Tagged { origin, value } => write!(f, "{origin}:{value:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<Stream<Value>> for Value {
    fn from(stream: Stream<Value>) -> Self {
        Value::Stream(stream)
    }
}

/// What `WhenAny` hands its selector for each path.
#[derive(Clone)]
pub struct ObservedChange {
    /// The object the observation was rooted at.
    pub sender: ObjectRef,
    /// Dotted path display, or `None` for an any-property observation.
    pub property: Option<String>,
    pub value: Value,
}

impl PartialEq for ObservedChange {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sender, &other.sender)
            && self.property == other.property
            && self.value == other.value
    }
}

impl fmt::Debug for ObservedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedChange")
            .field("sender", &self.sender.type_name())
            .field("property", &self.property)
            .field("value", &self.value)
            .finish()
    }
}
