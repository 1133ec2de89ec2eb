use std::any::TypeId;
use std::sync::Arc;

use xtok::step::TokenSource;
use xtok::{Length, Token};

use crate::atlas::Atlas;
use crate::convert::ToValue;
use crate::error::MarshalError;
use crate::value::Value;

struct MapFrame {
    opened: bool,
    entries: std::vec::IntoIter<(String, Value)>,
    len: usize,
    pending_value: Option<Value>,
}

struct ArrayFrame {
    opened: bool,
    items: std::vec::IntoIter<Value>,
    len: usize,
}

enum Frame {
    Scalar(Token),
    Map(MapFrame),
    Array(ArrayFrame),
}

enum Action {
    Scalar(Token),
    OpenMap(u64),
    OpenArray(u64),
    Close,
    Key(String, Value),
    Item(Value),
}

/// Drives a bound host value through the atlas, one [`Token`] per `step`
/// call (spec.md §4.3). The value is converted to a [`Value`] tree eagerly
/// at [`bind`](Marshaler::bind) time — Rust has no runtime reflection to
/// walk an arbitrary host type lazily, so `ToValue` materializes the tree
/// up front; only *token emission* off that tree is paced one `Step` at a
/// time, matching the frame-stack discipline spec.md §4.3 describes.
pub struct Marshaler {
    atlas: Arc<Atlas>,
    stack: Vec<Frame>,
    bound: bool,
    poisoned: bool,
}

impl Marshaler {
    /// Creates a marshaller driven by `atlas`.
    pub fn new(atlas: Arc<Atlas>) -> Self {
        Marshaler { atlas, stack: Vec::new(), bound: false, poisoned: false }
    }

    /// Binds `value` as the root of the next document, discarding any
    /// in-progress traversal.
    pub fn bind<T: ToValue + 'static>(&mut self, value: &T) -> Result<(), MarshalError> {
        let id = TypeId::of::<T>();
        let raw = value.to_value(&self.atlas);
        let transformed = self.atlas.transform_encode(id, raw);
        self.stack.clear();
        self.push_value(transformed);
        self.bound = true;
        self.poisoned = false;
        Ok(())
    }

    fn push_value(&mut self, value: Value) {
        match value {
            Value::Map(entries) => {
                let len = entries.len();
                self.stack.push(Frame::Map(MapFrame { opened: false, entries: entries.into_iter(), len, pending_value: None }));
            }
            Value::Array(items) => {
                let len = items.len();
                self.stack.push(Frame::Array(ArrayFrame { opened: false, items: items.into_iter(), len }));
            }
            scalar => self.stack.push(Frame::Scalar(scalar_token(scalar))),
        }
    }
}

fn scalar_token(value: Value) -> Token {
    match value {
        Value::Null => Token::Null,
        Value::Bool(b) => Token::Bool(b),
        Value::Int(n) => Token::Int(n),
        Value::Uint(n) => Token::Uint(n),
        Value::Float(f) => Token::Float(f),
        Value::String(s) => Token::String(s),
        Value::Bytes(b) => Token::Bytes(b),
        Value::Array(_) | Value::Map(_) => unreachable!("composite value handed to scalar_token"),
    }
}

fn map_action(mf: &mut MapFrame) -> Action {
    if !mf.opened {
        mf.opened = true;
        return Action::OpenMap(mf.len as u64)
    }
    if let Some(v) = mf.pending_value.take() {
        return Action::Item(v)
    }
    match mf.entries.next() {
        Some((k, v)) => Action::Key(k, v),
        None => Action::Close,
    }
}

fn array_action(af: &mut ArrayFrame) -> Action {
    if !af.opened {
        af.opened = true;
        return Action::OpenArray(af.len as u64)
    }
    match af.items.next() {
        Some(v) => Action::Item(v),
        None => Action::Close,
    }
}

impl TokenSource for Marshaler {
    type Error = MarshalError;

    fn step(&mut self, out: &mut Token) -> Result<bool, MarshalError> {
        if self.poisoned {
            return Err(MarshalError::Message("marshaler used after a previous error"))
        }
        if !self.bound {
            return Err(MarshalError::Message("step called before bind"))
        }
        let result = self.step_inner(out);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}

impl Marshaler {
    fn step_inner(&mut self, out: &mut Token) -> Result<bool, MarshalError> {
        let idx = self.stack.len().checked_sub(1)
            .ok_or(MarshalError::Message("step called after document complete"))?;

        let action = match &mut self.stack[idx] {
            Frame::Scalar(tok) => Action::Scalar(tok.clone()),
            Frame::Map(mf) => map_action(mf),
            Frame::Array(af) => array_action(af),
        };

        match action {
            Action::Scalar(tok) => {
                self.stack.pop();
                *out = tok;
                Ok(self.stack.is_empty())
            }
            Action::OpenMap(n) => {
                *out = Token::MapOpen(Length::definite(n));
                Ok(false)
            }
            Action::OpenArray(n) => {
                *out = Token::ArrOpen(Length::definite(n));
                Ok(false)
            }
            Action::Close => {
                let was_map = matches!(self.stack[idx], Frame::Map(_));
                self.stack.pop();
                *out = if was_map { Token::MapClose } else { Token::ArrClose };
                Ok(self.stack.is_empty())
            }
            Action::Key(k, v) => {
                if let Frame::Map(mf) = &mut self.stack[idx] {
                    mf.pending_value = Some(v);
                }
                *out = Token::String(k);
                Ok(false)
            }
            Action::Item(v) => {
                self.push_value(v);
                self.step_inner(out)
            }
        }
    }
}
