use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;

use xtok::step::TokenSink;
use xtok::Token;

use crate::atlas::Atlas;
use crate::convert::{Bytes, FromValue};
use crate::error::UnmarshalError;
use crate::value::Value;

/// The shape a bound [`UnmarshalTarget`] expects from the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single non-container token.
    Scalar,
    /// An `ArrOpen` ... `ArrClose` run.
    Array,
    /// A `MapOpen` ... `MapClose` run.
    Map,
}

/// A bindable unmarshal destination: a type-erased "writable slot"
/// (spec.md §4.4, Design Notes §9(b)). Implemented for every type that also
/// implements [`crate::FromValue`]; struct types implement it by hand
/// alongside `FromValue`.
pub trait UnmarshalTarget {
    /// The shape this target expects, or `None` to accept any shape
    /// (the wildcard case, spec.md §4.4 "Wildcard slots").
    fn expected_kind(&self) -> Option<ValueKind>;

    /// Consumes the fully materialized document value and writes it into
    /// `self`.
    fn assign(&mut self, value: Value, atlas: &Atlas) -> Result<(), UnmarshalError>;
}

enum BuildFrame {
    Array(Vec<Value>),
    Map { entries: Vec<(String, Value)>, pending_key: Option<String> },
}

fn token_kind_name(tok: &Token) -> &'static str {
    match tok {
        Token::MapOpen(_) => "MapOpen",
        Token::MapClose => "MapClose",
        Token::ArrOpen(_) => "ArrOpen",
        Token::ArrClose => "ArrClose",
        Token::String(_) => "String",
        Token::Bytes(_) => "Bytes",
        Token::Bool(_) => "Bool",
        Token::Int(_) => "Int",
        Token::Uint(_) => "Uint",
        Token::Float(_) => "Float",
        Token::Null => "Null",
    }
}

fn token_to_scalar(tok: &Token) -> Value {
    match tok {
        Token::String(s) => Value::String(s.clone()),
        Token::Bytes(b) => Value::Bytes(b.clone()),
        Token::Bool(b) => Value::Bool(*b),
        Token::Int(n) => Value::Int(*n),
        Token::Uint(n) => Value::Uint(*n),
        Token::Float(f) => Value::Float(*f),
        Token::Null => Value::Null,
        Token::MapOpen(_) | Token::MapClose | Token::ArrOpen(_) | Token::ArrClose =>
            unreachable!("container mark handed to token_to_scalar"),
    }
}

/// Drives tokens into a bound [`UnmarshalTarget`], one [`Token`] per `step`
/// call (spec.md §4.4).
pub struct Unmarshaler<'a> {
    atlas: Arc<Atlas>,
    target: Option<(&'a mut dyn UnmarshalTarget, TypeId)>,
    root_kind: Option<ValueKind>,
    stack: Vec<BuildFrame>,
    started: bool,
    done: bool,
    poisoned: bool,
}

impl<'a> Unmarshaler<'a> {
    /// Creates an unmarshaller driven by `atlas`.
    pub fn new(atlas: Arc<Atlas>) -> Self {
        Unmarshaler {
            atlas,
            target: None,
            root_kind: None,
            stack: Vec::new(),
            started: false,
            done: false,
            poisoned: false,
        }
    }

    /// Binds a writable slot. The atlas entry (if any) registered for `T`
    /// governs how a materialized `Map` value is interpreted on
    /// assignment — see the per-type `UnmarshalTarget`/`FromValue` impls.
    pub fn bind<T: UnmarshalTarget + 'static>(&mut self, slot: &'a mut T) -> Result<(), UnmarshalError> {
        self.root_kind = slot.expected_kind();
        self.target = Some((slot, TypeId::of::<T>()));
        self.stack.clear();
        self.started = false;
        self.done = false;
        self.poisoned = false;
        Ok(())
    }

    /// Binds a non-writable, by-value handle. Always rejected: a value
    /// passed by copy has no address the unmarshaller can write back
    /// through (spec.md §4.4, Design Notes §9(b): writability is the
    /// defining requirement of a bindable slot).
    pub fn bind_value<T>(&mut self, _value: T) -> Result<(), UnmarshalError> {
        Err(UnmarshalError::invalid_target("target is a by-value handle, not a writable slot"))
    }
}

impl<'a> TokenSink for Unmarshaler<'a> {
    type Error = UnmarshalError;

    fn step(&mut self, tok: &Token) -> Result<bool, UnmarshalError> {
        if self.poisoned {
            return Err(UnmarshalError::Message("unmarshaler used after a previous error"))
        }
        if self.target.is_none() {
            return Err(UnmarshalError::Message("step called before bind"))
        }
        let result = self.step_inner(tok);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}

impl<'a> Unmarshaler<'a> {
    fn step_inner(&mut self, tok: &Token) -> Result<bool, UnmarshalError> {
        if self.done {
            return Err(UnmarshalError::Message("step called after document complete"))
        }

        if !self.started {
            self.started = true;
            if let Some(expected) = self.root_kind {
                let congruent = match expected {
                    ValueKind::Scalar => !matches!(tok, Token::MapOpen(_) | Token::ArrOpen(_)),
                    ValueKind::Map => matches!(tok, Token::MapOpen(_)),
                    ValueKind::Array => matches!(tok, Token::ArrOpen(_)),
                };
                if !congruent {
                    return Err(UnmarshalError::incongruent(token_kind_name(tok), "bound target"))
                }
            }
        }

        match tok {
            Token::MapOpen(len) => {
                let cap = len.value().unwrap_or(0) as usize;
                self.stack.push(BuildFrame::Map { entries: Vec::with_capacity(cap), pending_key: None });
                Ok(false)
            }
            Token::ArrOpen(len) => {
                let cap = len.value().unwrap_or(0) as usize;
                self.stack.push(BuildFrame::Array(Vec::with_capacity(cap)));
                Ok(false)
            }
            Token::MapClose | Token::ArrClose => {
                let frame = self.stack.pop()
                    .ok_or(UnmarshalError::Message("close token without a matching open"))?;
                let closing_map = matches!(tok, Token::MapClose);
                let is_map = matches!(frame, BuildFrame::Map { .. });
                if closing_map != is_map {
                    return Err(UnmarshalError::Message("mismatched container close"))
                }
                let value = match frame {
                    BuildFrame::Map { entries, pending_key } => {
                        if pending_key.is_some() {
                            return Err(UnmarshalError::Message("map closed with a key awaiting its value"))
                        }
                        Value::Map(entries)
                    }
                    BuildFrame::Array(items) => Value::Array(items),
                };
                self.place(value)
            }
            scalar => {
                let value = token_to_scalar(scalar);
                self.place(value)
            }
        }
    }

    /// Places a completed value into the parent frame (an array item, or a
    /// map entry once its key has been seen), or — if the stack is empty —
    /// assigns it to the bound target and finishes the document.
    fn place(&mut self, value: Value) -> Result<bool, UnmarshalError> {
        match self.stack.last_mut() {
            None => {
                let (target, id) = self.target.as_mut().expect("bound before step");
                let value = self.atlas.transform_decode(*id, value)?;
                target.assign(value, &self.atlas)?;
                self.done = true;
                Ok(true)
            }
            Some(BuildFrame::Array(items)) => {
                items.push(value);
                Ok(false)
            }
            Some(BuildFrame::Map { entries, pending_key }) => {
                match pending_key.take() {
                    Some(key) => {
                        entries.push((key, value));
                        Ok(false)
                    }
                    None => {
                        let Value::String(key) = value else {
                            return Err(UnmarshalError::incongruent("non-string", "map key"))
                        };
                        *pending_key = Some(key);
                        Ok(false)
                    }
                }
            }
        }
    }
}

macro_rules! impl_scalar_target {
    ($($t:ty),+ $(,)?) => {
        $(
            impl UnmarshalTarget for $t {
                fn expected_kind(&self) -> Option<ValueKind> { Some(ValueKind::Scalar) }

                fn assign(&mut self, value: Value, atlas: &Atlas) -> Result<(), UnmarshalError> {
                    *self = <$t>::from_value(value, atlas)?;
                    Ok(())
                }
            }
        )+
    }
}

impl_scalar_target!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, Bytes);

impl UnmarshalTarget for Value {
    fn expected_kind(&self) -> Option<ValueKind> {
        None
    }

    fn assign(&mut self, value: Value, _atlas: &Atlas) -> Result<(), UnmarshalError> {
        *self = value;
        Ok(())
    }
}

impl<T: FromValue> UnmarshalTarget for Vec<T> {
    fn expected_kind(&self) -> Option<ValueKind> {
        Some(ValueKind::Array)
    }

    fn assign(&mut self, value: Value, atlas: &Atlas) -> Result<(), UnmarshalError> {
        *self = Vec::<T>::from_value(value, atlas)?;
        Ok(())
    }
}

impl<T: FromValue> UnmarshalTarget for BTreeMap<String, T> {
    fn expected_kind(&self) -> Option<ValueKind> {
        Some(ValueKind::Map)
    }

    fn assign(&mut self, value: Value, atlas: &Atlas) -> Result<(), UnmarshalError> {
        *self = BTreeMap::<String, T>::from_value(value, atlas)?;
        Ok(())
    }
}

impl<T: FromValue> UnmarshalTarget for Option<T> {
    fn expected_kind(&self) -> Option<ValueKind> {
        None
    }

    fn assign(&mut self, value: Value, atlas: &Atlas) -> Result<(), UnmarshalError> {
        *self = Option::<T>::from_value(value, atlas)?;
        Ok(())
    }
}
