use std::collections::BTreeMap;

use crate::atlas::Atlas;
use crate::error::UnmarshalError;
use crate::value::Value;

/// Converts a host value into the dynamic document representation
/// (spec.md §4.3, Design Notes §9(a)). The atlas is threaded through so a
/// struct's own `to_value` can consult its registered field order and
/// rename table (see [`Atlas::struct_fields`]).
pub trait ToValue {
    /// Converts `self` into a [`Value`].
    fn to_value(&self, atlas: &Atlas) -> Value;
}

/// The inverse of [`ToValue`]: reconstructs a host value from a document
/// value. Fails when the value's shape does not match what `Self` expects.
pub trait FromValue: Sized {
    /// Attempts to reconstruct `Self` from `value`.
    fn from_value(value: Value, atlas: &Atlas) -> Result<Self, UnmarshalError>;
}

/// A byte-string newtype. Plain `Vec<u8>` serializes element-by-element as
/// an array of `Uint`s via the blanket `Vec<T>` impl below (no
/// specialization in Rust to special-case `Vec<u8>`); wrap a field in
/// `Bytes` to get the token stream's native `Bytes` scalar instead — the
/// same trick `serde_bytes` uses for `serde`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl ToValue for Bytes {
    fn to_value(&self, _atlas: &Atlas) -> Value {
        Value::Bytes(self.0.clone())
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
        match value {
            Value::Bytes(b) => Ok(Bytes(b)),
            other => Err(UnmarshalError::incongruent(other.kind_name(), "Bytes")),
        }
    }
}

impl ToValue for Value {
    fn to_value(&self, _atlas: &Atlas) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
        Ok(value)
    }
}

impl ToValue for bool {
    fn to_value(&self, _atlas: &Atlas) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(UnmarshalError::incongruent(other.kind_name(), "bool")),
        }
    }
}

macro_rules! impl_unsigned_value {
    ($($t:ty),+ $(,)?) => {
        $(
            impl ToValue for $t {
                fn to_value(&self, _atlas: &Atlas) -> Value {
                    Value::Uint(*self as u64)
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
                    match value {
                        Value::Uint(n) => <$t>::try_from(n)
                            .map_err(|_| UnmarshalError::incongruent("Uint", stringify!($t))),
                        Value::Int(n) if n >= 0 => <$t>::try_from(n as u64)
                            .map_err(|_| UnmarshalError::incongruent("Int", stringify!($t))),
                        other => Err(UnmarshalError::incongruent(other.kind_name(), stringify!($t))),
                    }
                }
            }
        )+
    }
}

macro_rules! impl_signed_value {
    ($($t:ty),+ $(,)?) => {
        $(
            impl ToValue for $t {
                fn to_value(&self, _atlas: &Atlas) -> Value {
                    if *self < 0 { Value::Int(*self as i64) } else { Value::Uint(*self as u64) }
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
                    match value {
                        Value::Int(n) => <$t>::try_from(n)
                            .map_err(|_| UnmarshalError::incongruent("Int", stringify!($t))),
                        Value::Uint(n) => <$t>::try_from(n)
                            .map_err(|_| UnmarshalError::incongruent("Uint", stringify!($t))),
                        other => Err(UnmarshalError::incongruent(other.kind_name(), stringify!($t))),
                    }
                }
            }
        )+
    }
}

impl_unsigned_value!(u8, u16, u32, u64, usize);
impl_signed_value!(i8, i16, i32, i64, isize);

macro_rules! impl_float_value {
    ($($t:ty),+ $(,)?) => {
        $(
            impl ToValue for $t {
                fn to_value(&self, _atlas: &Atlas) -> Value {
                    Value::Float(*self as f64)
                }
            }

            impl FromValue for $t {
                fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
                    match value {
                        Value::Float(f) => Ok(f as $t),
                        Value::Uint(n) => Ok(n as $t),
                        Value::Int(n) => Ok(n as $t),
                        other => Err(UnmarshalError::incongruent(other.kind_name(), stringify!($t))),
                    }
                }
            }
        )+
    }
}

impl_float_value!(f32, f64);

impl ToValue for String {
    fn to_value(&self, _atlas: &Atlas) -> Value {
        Value::String(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value, _atlas: &Atlas) -> Result<Self, UnmarshalError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(UnmarshalError::incongruent(other.kind_name(), "String")),
        }
    }
}

impl ToValue for str {
    fn to_value(&self, _atlas: &Atlas) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self, atlas: &Atlas) -> Value {
        match self {
            Some(v) => v.to_value(atlas),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value, atlas: &Atlas) -> Result<Self, UnmarshalError> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(T::from_value(other, atlas)?)),
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self, atlas: &Atlas) -> Value {
        Value::Array(self.iter().map(|v| v.to_value(atlas)).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value, atlas: &Atlas) -> Result<Self, UnmarshalError> {
        match value {
            Value::Array(items) => items.into_iter().map(|v| T::from_value(v, atlas)).collect(),
            other => Err(UnmarshalError::incongruent(other.kind_name(), "Vec")),
        }
    }
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self, atlas: &Atlas) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value(atlas))).collect())
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value, atlas: &Atlas) -> Result<Self, UnmarshalError> {
        match value {
            Value::Map(entries) => entries.into_iter()
                .map(|(k, v)| Ok((k, T::from_value(v, atlas)?)))
                .collect(),
            other => Err(UnmarshalError::incongruent(other.kind_name(), "BTreeMap")),
        }
    }
}
