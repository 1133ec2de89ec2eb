use std::any::TypeId;
use std::collections::{BTreeMap, HashSet};

use crate::error::UnmarshalError;
use crate::value::Value;

/// What happens to a `StructMap` key present on the wire but not declared
/// in the entry's field list (spec.md §4.4 "StructMap decode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeyPolicy {
    /// Skip the corresponding value subtree. The default.
    Skip,
    /// Reject the whole document.
    Reject,
}

/// One `(Rust field name, wire/serial name)` pair in a `StructMap` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The field's name on the Rust struct.
    pub field_name: &'static str,
    /// The name this field is keyed by on the wire.
    pub serial_name: &'static str,
}

impl FieldSpec {
    /// Builds a field spec pairing `field_name` with `serial_name`.
    pub const fn new(field_name: &'static str, serial_name: &'static str) -> Self {
        FieldSpec { field_name, serial_name }
    }
}

struct StructMapEntry {
    fields: Vec<FieldSpec>,
    unknown_key_policy: UnknownKeyPolicy,
}

type ToTokenFn = Box<dyn Fn(Value) -> Value + Send + Sync>;
type FromTokenFn = Box<dyn Fn(Value) -> Result<Value, UnmarshalError> + Send + Sync>;

struct TransformEntry {
    to_token: ToTokenFn,
    from_token: FromTokenFn,
}

enum Strategy {
    StructMap(StructMapEntry),
    Transform(TransformEntry),
}

struct AtlasEntry {
    type_name: &'static str,
    strategy: Strategy,
}

/// An immutable, shareable registry of per-type serialization descriptors
/// (spec.md §3.3/§4.5). Built once via [`AtlasBuilder`], then read-only —
/// safe to share across marshallers, unmarshallers, and threads.
pub struct Atlas {
    entries: BTreeMap<TypeId, AtlasEntry>,
}

impl Atlas {
    /// An atlas with no registered types: every bound value falls through
    /// to the marshaller/unmarshaller's structural recognition.
    pub fn empty() -> Self {
        Atlas { entries: BTreeMap::new() }
    }

    /// The declared `(field, serial)` pairs for a `StructMap`-registered
    /// type, in declaration order, or `None` if `id` has no such entry.
    pub fn struct_fields(&self, id: TypeId) -> Option<&[FieldSpec]> {
        match self.entries.get(&id).map(|e| &e.strategy) {
            Some(Strategy::StructMap(sm)) => Some(&sm.fields),
            _ => None,
        }
    }

    /// The unknown-key policy for a `StructMap`-registered type, or
    /// [`UnknownKeyPolicy::Skip`] if `id` has no such entry.
    pub fn unknown_key_policy(&self, id: TypeId) -> UnknownKeyPolicy {
        match self.entries.get(&id).map(|e| &e.strategy) {
            Some(Strategy::StructMap(sm)) => sm.unknown_key_policy,
            _ => UnknownKeyPolicy::Skip,
        }
    }

    /// The registered type name for `id`, for diagnostics.
    pub fn type_name(&self, id: TypeId) -> Option<&'static str> {
        self.entries.get(&id).map(|e| e.type_name)
    }

    /// Applies a registered `Transform` entry's encode direction, or passes
    /// `value` through unchanged if `id` has no such entry.
    pub fn transform_encode(&self, id: TypeId, value: Value) -> Value {
        match self.entries.get(&id).map(|e| &e.strategy) {
            Some(Strategy::Transform(t)) => (t.to_token)(value),
            _ => value,
        }
    }

    /// Applies a registered `Transform` entry's decode direction, or passes
    /// `value` through unchanged (`Ok`) if `id` has no such entry.
    pub fn transform_decode(&self, id: TypeId, value: Value) -> Result<Value, UnmarshalError> {
        match self.entries.get(&id).map(|e| &e.strategy) {
            Some(Strategy::Transform(t)) => (t.from_token)(value),
            _ => Ok(value),
        }
    }
}

/// Builds an [`Atlas`]. Registrations are fluent and type-keyed; duplicate
/// registrations for the same type panic, mirroring spec.md §4.5's
/// `MustBuild`, which rejects duplicate type registrations at build time.
#[derive(Default)]
pub struct AtlasBuilder {
    entries: BTreeMap<TypeId, AtlasEntry>,
}

impl AtlasBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        AtlasBuilder { entries: BTreeMap::new() }
    }

    /// Registers `T` as a `StructMap` with [`UnknownKeyPolicy::Skip`].
    pub fn struct_map<T: 'static>(self, fields: Vec<FieldSpec>) -> Self {
        self.struct_map_with_policy::<T>(fields, UnknownKeyPolicy::Skip)
    }

    /// Registers `T` as a `StructMap`, with an explicit unknown-key policy.
    ///
    /// Panics if two fields share a serial name (serial names must be
    /// unique within one entry, spec.md §3.3) or if `T` is already
    /// registered.
    pub fn struct_map_with_policy<T: 'static>(mut self, fields: Vec<FieldSpec>, policy: UnknownKeyPolicy) -> Self {
        let mut seen = HashSet::with_capacity(fields.len());
        for f in &fields {
            if !seen.insert(f.serial_name) {
                panic!("duplicate serial name `{}` in StructMap entry for `{}`", f.serial_name, std::any::type_name::<T>());
            }
        }
        let id = TypeId::of::<T>();
        let entry = AtlasEntry {
            type_name: std::any::type_name::<T>(),
            strategy: Strategy::StructMap(StructMapEntry { fields, unknown_key_policy: policy }),
        };
        if self.entries.insert(id, entry).is_some() {
            panic!("duplicate atlas registration for type `{}`", std::any::type_name::<T>());
        }
        self
    }

    /// Registers a `Transform` strategy for `T`: `to_token` reshapes a
    /// value before the standard strategies apply on encode, `from_token`
    /// reshapes it back on decode (spec.md §3.3).
    pub fn transform<T, E, D>(mut self, to_token: E, from_token: D) -> Self
    where
        T: 'static,
        E: Fn(Value) -> Value + Send + Sync + 'static,
        D: Fn(Value) -> Result<Value, UnmarshalError> + Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        let entry = AtlasEntry {
            type_name: std::any::type_name::<T>(),
            strategy: Strategy::Transform(TransformEntry { to_token: Box::new(to_token), from_token: Box::new(from_token) }),
        };
        if self.entries.insert(id, entry).is_some() {
            panic!("duplicate atlas registration for type `{}`", std::any::type_name::<T>());
        }
        self
    }

    /// Finalizes the builder into an immutable [`Atlas`].
    pub fn build(self) -> Atlas {
        Atlas { entries: self.entries }
    }
}
