//! Runtime values handled by the object model.
//!
//! The object model does not interpret values beyond identity and equality:
//! numbers, strings and collections are payloads that collaborator method
//! bodies give meaning to. Every value is `Eq + Hash` so that any of them can
//! key a [`ValueTable`](crate::ValueTable).

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::{ObjectId, TypeId};

/// A runtime value.
///
/// # Example
///
/// ```
/// use corundum_core::Value;
///
/// let sym = Value::symbol("greet");
/// assert_eq!(sym.as_symbol(), Some("greet"));
/// assert!(Value::Nil.is_nil());
/// assert!(!Value::Bool(false).is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(Arc<str>),
    Symbol(Arc<str>),
    Array(Arc<[Value]>),
    /// A heap object allocated by an object space.
    Object(ObjectId),
    /// A class, module or singleton type used as a value.
    Type(TypeId),
}

impl Value {
    pub fn symbol(name: impl AsRef<str>) -> Self {
        Value::Symbol(Arc::from(name.as_ref()))
    }

    pub fn str(text: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(text.as_ref()))
    }

    pub fn float(value: f64) -> Self {
        Value::Float(OrderedFloat(value))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Type(_) => ValueKind::Type,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Everything except `nil` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match self {
            Value::Type(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this value lives on the object heap or is a type, i.e. whether
    /// it has an identity that a singleton type can attach to.
    pub fn has_identity(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Type(_))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::str(value)
    }
}

impl From<TypeId> for Value {
    fn from(value: TypeId) -> Self {
        Value::Type(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::Object(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Symbol(s) => write!(f, ":{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(id) => write!(f, "#<object {id}>"),
            Value::Type(id) => write!(f, "#<{id}>"),
        }
    }
}

/// The kind of a [`Value`], used to bind immediates to their classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    Symbol,
    Array,
    Object,
    Type,
}

impl ValueKind {
    /// Kinds whose class is chosen by a binding rather than stored on the value.
    pub const IMMEDIATES: [ValueKind; 7] = [
        ValueKind::Nil,
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Str,
        ValueKind::Symbol,
        ValueKind::Array,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Symbol => "symbol",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Type => "type",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
