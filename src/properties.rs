//! Generic, name-addressed properties with enum-from-nick coercion.
//!
//! Objects that expose their arguments through [`Introspect`] can be driven
//! by a host that only knows argument names and loosely typed values. The
//! entry point is [`set_property`]: when the target argument is an enum and
//! the value is a string, the string is resolved as the enum's nickname
//! (`"lanczos2"`, `"north-east"`, ...) before the assignment.
//!
//! `set_property` never fails. A missing argument, an unknown nickname, or a
//! value of the wrong type is logged as a warning and the call returns
//! without changing the object.

use crate::types::{EnumType, UnknownVariant};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PropertyError {
    #[error("{object}: no property named \"{name}\"")]
    UnknownArgument { object: &'static str, name: String },
    #[error("{object}: {source}")]
    UnknownEnumNick {
        object: &'static str,
        #[source]
        source: UnknownVariant,
    },
    #[error("{object}: property \"{name}\" expects {expected}, got {got}")]
    TypeMismatch {
        object: &'static str,
        name: String,
        expected: ArgumentKind,
        got: &'static str,
    },
}

/// A loosely typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    /// An already resolved enum value.
    Enum(i32),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
        }
    }

    /// Parse command-line text: integer, then float, then bool, else string.
    pub fn parse(text: &str) -> Value {
        if let Ok(i) = text.parse::<i64>() {
            Value::Int(i)
        } else if let Ok(d) = text.parse::<f64>() {
            Value::Double(d)
        } else if let Ok(b) = text.parse::<bool>() {
            Value::Bool(b)
        } else {
            Value::String(text.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Enum(e) => write!(f, "enum {e}"),
        }
    }
}

/// Declared type of an argument.
#[derive(Debug, Clone, Copy)]
pub enum ArgumentKind {
    Int,
    Double,
    Bool,
    Enum(&'static EnumType),
}

impl PartialEq for ArgumentKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgumentKind::Enum(a), ArgumentKind::Enum(b)) => std::ptr::eq(*a, *b),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentKind::Int => f.write_str("int"),
            ArgumentKind::Double => f.write_str("double"),
            ArgumentKind::Bool => f.write_str("bool"),
            ArgumentKind::Enum(t) => f.write_str(t.name),
        }
    }
}

/// One named argument of an introspectable object.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub kind: ArgumentKind,
}

impl ArgumentSpec {
    pub const fn new(name: &'static str, kind: ArgumentKind) -> Self {
        Self { name, kind }
    }
}

/// An object whose arguments can be listed and set by name.
pub trait Introspect {
    /// Short name used in messages (`"resize"`, `"save"`, ...).
    fn nickname(&self) -> &'static str;

    fn arguments(&self) -> &'static [ArgumentSpec];

    /// Assign a value already coerced to the argument's declared kind.
    fn set_argument(&mut self, name: &str, value: TypedValue) -> Result<(), PropertyError>;

    fn argument(&self, name: &str) -> Result<&'static ArgumentSpec, PropertyError> {
        self.arguments()
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| PropertyError::UnknownArgument {
                object: self.nickname(),
                name: name.to_string(),
            })
    }
}

/// A value checked against an [`ArgumentSpec`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    Enum(i32),
}

impl TypedValue {
    pub fn as_int(self) -> i64 {
        match self {
            TypedValue::Int(i) => i,
            TypedValue::Double(d) => d as i64,
            TypedValue::Bool(b) => b as i64,
            TypedValue::Enum(e) => e as i64,
        }
    }

    pub fn as_double(self) -> f64 {
        match self {
            TypedValue::Double(d) => d,
            other => other.as_int() as f64,
        }
    }

    pub fn as_bool(self) -> bool {
        self.as_int() != 0
    }

    pub fn as_enum(self) -> i32 {
        self.as_int() as i32
    }
}

/// Coerce `value` to the argument's kind, resolving enum nicknames.
///
/// Ints widen to doubles and convert to enums (validated against the enum's
/// values); no other implicit conversions happen.
pub fn coerce(
    object: &'static str,
    spec: &ArgumentSpec,
    value: &Value,
) -> Result<TypedValue, PropertyError> {
    let mismatch = || PropertyError::TypeMismatch {
        object,
        name: spec.name.to_string(),
        expected: spec.kind,
        got: value.type_name(),
    };
    let unknown = |source| PropertyError::UnknownEnumNick { object, source };

    match (spec.kind, value) {
        (ArgumentKind::Int, Value::Int(i)) => Ok(TypedValue::Int(*i)),
        (ArgumentKind::Double, Value::Double(d)) => Ok(TypedValue::Double(*d)),
        (ArgumentKind::Double, Value::Int(i)) => Ok(TypedValue::Double(*i as f64)),
        (ArgumentKind::Bool, Value::Bool(b)) => Ok(TypedValue::Bool(*b)),
        (ArgumentKind::Enum(enum_type), Value::String(nick)) => enum_type
            .from_nick(nick)
            .map(TypedValue::Enum)
            .map_err(unknown),
        (ArgumentKind::Enum(enum_type), Value::Enum(v)) => {
            let v = *v;
            enum_type
                .nick(v)
                .map(|_| TypedValue::Enum(v))
                .ok_or_else(|| {
                    unknown(UnknownVariant {
                        enum_name: enum_type.name,
                        value: v.to_string(),
                    })
                })
        }
        (ArgumentKind::Enum(enum_type), Value::Int(i)) => {
            let v = i32::try_from(*i).map_err(|_| mismatch())?;
            coerce(object, spec, &Value::Enum(v)).map_err(|_| {
                unknown(UnknownVariant {
                    enum_name: enum_type.name,
                    value: i.to_string(),
                })
            })
        }
        _ => Err(mismatch()),
    }
}

/// Set a property, or fail with the reason it could not be set.
pub fn try_set_property(
    object: &mut dyn Introspect,
    name: &str,
    value: &Value,
) -> Result<(), PropertyError> {
    let spec = object.argument(name)?;
    let typed = coerce(object.nickname(), spec, value)?;
    object.set_argument(name, typed)
}

/// Set a property by name, logging a warning instead of failing.
pub fn set_property(object: &mut dyn Introspect, name: &str, value: &Value) {
    if let Err(e) = try_set_property(object, name, value) {
        log::warn!("property warning: {e}");
    }
}
