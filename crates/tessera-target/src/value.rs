//! Dynamic attribute values and the schema type tags that constrain them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::target::Target;

/// A string-keyed map of values: structured configs, attributes, features.
pub type ConfigMap = BTreeMap<String, Value>;

/// A typed attribute value.
///
/// Equality, ordering and hashing are structural; nested targets compare by
/// content, not by identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Value {
    /// Undefined. Skipped when stringifying.
    #[default]
    None,
    /// A signed integer.
    Int(i64),
    /// A boolean, written `0`/`1` in target strings.
    Bool(bool),
    /// An already-interpreted string.
    Str(String),
    /// A nested target, such as a host.
    Target(Arc<Target>),
    /// A homogeneous array.
    Array(Vec<Value>),
    /// A map; only built from structured input.
    Map(BTreeMap<Value, Value>),
}

impl Value {
    /// Short name of the dynamic type, used in error messages.
    pub fn type_key(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::Target(_) => "Target",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<&Arc<Target>> {
        match self {
            Value::Target(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Array of strings, if every element is a string.
    pub fn as_str_array(&self) -> Option<Vec<&str>> {
        self.as_array()?.iter().map(Value::as_str).collect()
    }

    /// Build a `Map` value from a string-keyed config.
    pub fn from_config(config: ConfigMap) -> Value {
        Value::Map(
            config
                .into_iter()
                .map(|(k, v)| (Value::Str(k), v))
                .collect(),
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::Target(t) => write!(f, "{t}"),
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
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_unit(),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Target(t) => t.export().serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Arc<Target>> for Value {
    fn from(t: Arc<Target>) -> Self {
        Value::Target(t)
    }
}

impl From<Target> for Value {
    fn from(t: Target) -> Self {
        Value::Target(Arc::new(t))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<ConfigMap> for Value {
    fn from(config: ConfigMap) -> Self {
        Value::from_config(config)
    }
}

/// The declared type of a schema attribute.
///
/// Closed over the shapes a target attribute may take; compound types carry
/// their element types so coercion can recurse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Base-10 integer.
    Int,
    /// Integer-coded boolean; `true`/`false` are also accepted.
    Bool,
    /// String, with surrounding spaces removed when parsed from text.
    Str,
    /// A target built from a string or a config map.
    Target,
    /// Array of one element type; comma-separated in text.
    Array(Box<ValueType>),
    /// Map from key type to value type; structured input only.
    Map(Box<ValueType>, Box<ValueType>),
}

impl ValueType {
    pub fn array_of(elem: ValueType) -> Self {
        ValueType::Array(Box::new(elem))
    }

    pub fn map_of(key: ValueType, value: ValueType) -> Self {
        ValueType::Map(Box::new(key), Box::new(value))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Str => write!(f, "str"),
            ValueType::Target => write!(f, "Target"),
            ValueType::Array(elem) => write!(f, "Array<{elem}>"),
            ValueType::Map(k, v) => write!(f, "Map<{k}, {v}>"),
        }
    }
}
