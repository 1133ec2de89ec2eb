use std::collections::BTreeMap;

/// A format-neutral dynamic document value: the materialized form of a
/// token-stream document, and the target of wildcard ("any shape") decode
/// (spec.md §4.4 "Wildcard slots").
///
/// `Map` is an ordered association list rather than a sorted map: struct
/// encode order must reproduce atlas declaration order exactly (spec.md
/// §4.3 "Struct field emission order"), which a map keyed and iterated in
/// sorted order cannot preserve. Plain host maps (`BTreeMap<String, T>`)
/// still iterate in sorted order by construction, so the determinism
/// spec.md's Open Question (ii) recommends falls out of that blanket impl
/// rather than out of `Value` itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/nil.
    Null,
    /// A scalar boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A scalar UTF-8 string.
    String(String),
    /// A scalar byte string.
    Bytes(Vec<u8>),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered association list of string-keyed values.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// A short name for this value's shape, used in incongruence error
    /// messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Uint(_) => "Uint",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    /// `true` unless this value is a container (`Array`/`Map`).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Map(_))
    }

    /// Builds a `Map` value from a `BTreeMap`, which iterates in sorted key
    /// order — the stable order this crate recommends for plain host maps.
    pub fn map_from_sorted(entries: BTreeMap<String, Value>) -> Value {
        Value::Map(entries.into_iter().collect())
    }
}
