//! Type id assignment and value writing for the encoder.

use std::any;
use std::collections::{HashMap, HashSet};

use crate::dynamic::Dynamic;
use crate::encoder::FieldDeltas;
use crate::record::{Encode, Record};
use crate::types::{Builtin, OpaqueFlavor, TypeId, WireField, WireKind, WireType, FIRST_USER_ID};
use crate::{GobEncoder, GobError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeKey {
    Rust(any::TypeId),
    Slice(TypeId),
    Map(TypeId, TypeId),
    /// A dynamic struct, identified by its name and field names.
    Struct(String, Vec<String>),
}

/// Wire types known to one encoding stream.
///
/// Ids are reserved before component types are registered, so a parent
/// definition is always queued ahead of the definitions it refers to.
#[derive(Debug)]
pub struct TypeRegistry {
    ids: HashMap<TypeKey, TypeId>,
    names: HashMap<TypeId, String>,
    structs: HashSet<TypeId>,
    pending: Vec<(TypeId, Option<WireType>)>,
    next_id: TypeId,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            names: HashMap::new(),
            structs: HashSet::new(),
            pending: Vec::new(),
            next_id: FIRST_USER_ID + 1,
        }
    }

    fn reserve(&mut self, key: TypeKey, name: String, is_struct: bool) -> TypeId {
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        self.names.insert(id, name);
        if is_struct {
            self.structs.insert(id);
        }
        self.pending.push((id, None));
        id
    }

    fn fill(&mut self, id: TypeId, kind: WireKind) {
        let name = self.name(id);
        if let Some((_, slot)) = self.pending.iter_mut().find(|(pending, _)| *pending == id) {
            *slot = Some(WireType { id, name, kind });
        }
    }

    pub fn record<T: Record>(&mut self) -> Result<TypeId, GobError> {
        let key = TypeKey::Rust(any::TypeId::of::<T>());
        if let Some(id) = self.ids.get(&key) {
            return Ok(*id);
        }
        let id = self.reserve(key, T::NAME.to_string(), true);
        let fields = T::FIELDS
            .iter()
            .zip(T::field_wire_types(self)?)
            .map(|(name, id)| WireField {
                name: (*name).to_string(),
                id,
            })
            .collect();
        self.fill(id, WireKind::Struct { fields });
        Ok(id)
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        let key = TypeKey::Slice(elem);
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let name = format!("[]{}", self.name(elem));
        let id = self.reserve(key, name, false);
        self.fill(id, WireKind::Slice { elem });
        id
    }

    pub fn map(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        let type_key = TypeKey::Map(key, elem);
        if let Some(id) = self.ids.get(&type_key) {
            return *id;
        }
        let name = format!("map[{}]{}", self.name(key), self.name(elem));
        let id = self.reserve(type_key, name, false);
        self.fill(id, WireKind::Map { key, elem });
        id
    }

    /// Registers `T` as a value that marshals itself into a blob.
    pub fn opaque<T: 'static>(&mut self, name: &str, flavor: OpaqueFlavor) -> TypeId {
        let key = TypeKey::Rust(any::TypeId::of::<T>());
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.reserve(key, name.to_string(), false);
        self.fill(id, WireKind::Opaque(flavor));
        id
    }

    /// Registers a struct whose fields all hold interface values.
    pub fn dynamic_struct(&mut self, name: &str, fields: Vec<String>) -> TypeId {
        let key = TypeKey::Struct(name.to_string(), fields.clone());
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = self.reserve(key, name.to_string(), true);
        let fields = fields
            .into_iter()
            .map(|name| WireField {
                name,
                id: Builtin::Interface.id(),
            })
            .collect();
        self.fill(id, WireKind::Struct { fields });
        id
    }

    pub fn name(&self, id: TypeId) -> String {
        match Builtin::from_id(id) {
            Some(builtin) => builtin.name().to_string(),
            None => self.names.get(&id).cloned().unwrap_or_default(),
        }
    }

    pub fn is_struct(&self, id: TypeId) -> bool {
        self.structs.contains(&id)
    }

    /// Definitions registered since the last call, parents first.
    pub fn take_pending(&mut self) -> Result<Vec<WireType>, GobError> {
        self.pending
            .drain(..)
            .map(|(id, wire)| {
                wire.ok_or_else(|| {
                    GobError::Unencodable(format!("definition of type {id} was never completed"))
                })
            })
            .collect()
    }
}

/// Writes values into one message body.
pub struct ValueEncoder<'r> {
    enc: GobEncoder,
    registry: &'r mut TypeRegistry,
}

impl<'r> ValueEncoder<'r> {
    pub(crate) fn new(registry: &'r mut TypeRegistry) -> Self {
        Self {
            enc: GobEncoder::new(),
            registry,
        }
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.enc.writer.flush()
    }

    pub fn registry(&mut self) -> &mut TypeRegistry {
        &mut *self.registry
    }

    pub fn write_uint(&mut self, x: u64) {
        self.enc.write_uint(x);
    }

    pub fn write_int(&mut self, i: i64) {
        self.enc.write_int(i);
    }

    pub fn write_bool(&mut self, b: bool) {
        self.enc.write_bool(b);
    }

    pub fn write_float(&mut self, f: f64) {
        self.enc.write_float(f);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.enc.write_bytes(data);
    }

    pub fn write_string(&mut self, s: &str) {
        self.enc.write_string(s);
    }

    /// Writes field `index` unless `value` is zero.
    pub fn encode_field<T: Encode>(
        &mut self,
        deltas: &mut FieldDeltas,
        index: usize,
        value: &T,
    ) -> Result<(), GobError> {
        if value.is_zero() {
            return Ok(());
        }
        deltas.field(&mut self.enc, index);
        value.encode(self)
    }

    pub fn encode_record<T: Record>(&mut self, record: &T) -> Result<(), GobError> {
        let mut deltas = FieldDeltas::default();
        record.encode_fields(self, &mut deltas)?;
        deltas.end(&mut self.enc);
        Ok(())
    }

    /// Writes `value` as an interface value: concrete type name, type id,
    /// then the byte count and encoding of the concrete value.
    pub fn write_interface(&mut self, value: &Dynamic) -> Result<(), GobError> {
        let Some(name) = value.concrete_name() else {
            if value.is_nil() {
                self.write_string("");
                return Ok(());
            }
            return Err(GobError::Unencodable(
                "opaque dynamic value has no concrete type".to_string(),
            ));
        };
        let id = self.dynamic_type(value)?;
        self.write_string(name);
        self.write_int(i64::from(id));
        let mut inner = ValueEncoder::new(&mut *self.registry);
        if !inner.registry.is_struct(id) {
            inner.write_uint(0);
        }
        inner.write_dynamic(value)?;
        let body = inner.finish();
        self.write_bytes(&body);
        Ok(())
    }

    fn dynamic_type(&mut self, value: &Dynamic) -> Result<TypeId, GobError> {
        Ok(match value {
            Dynamic::Bool(_) => Builtin::Bool.id(),
            Dynamic::Int(_) => Builtin::Int.id(),
            Dynamic::Uint(_) => Builtin::Uint.id(),
            Dynamic::Float(_) => Builtin::Float.id(),
            Dynamic::Complex(..) => Builtin::Complex.id(),
            Dynamic::Bytes(_) => Builtin::Bytes.id(),
            Dynamic::String(_) => Builtin::String.id(),
            Dynamic::List(_) => self.registry.slice(Builtin::Interface.id()),
            Dynamic::Map(_) => self
                .registry
                .map(Builtin::String.id(), Builtin::Interface.id()),
            Dynamic::Struct { name, fields } => self
                .registry
                .dynamic_struct(name, fields.keys().cloned().collect()),
            Dynamic::Nil | Dynamic::Opaque(_) => {
                return Err(GobError::Unencodable(
                    "nil and opaque dynamic values have no wire type".to_string(),
                ))
            }
        })
    }

    fn write_dynamic(&mut self, value: &Dynamic) -> Result<(), GobError> {
        match value {
            Dynamic::Bool(b) => self.write_bool(*b),
            Dynamic::Int(i) => self.write_int(*i),
            Dynamic::Uint(u) => self.write_uint(*u),
            Dynamic::Float(f) => self.write_float(*f),
            Dynamic::Complex(re, im) => {
                self.write_float(*re);
                self.write_float(*im);
            }
            Dynamic::Bytes(bytes) => self.write_bytes(bytes),
            Dynamic::String(s) => self.write_string(s),
            Dynamic::List(items) => {
                self.write_uint(items.len() as u64);
                for item in items {
                    self.write_interface(item)?;
                }
            }
            Dynamic::Map(map) => {
                self.write_uint(map.len() as u64);
                for (key, item) in map {
                    self.write_string(key);
                    self.write_interface(item)?;
                }
            }
            Dynamic::Struct { fields, .. } => {
                let mut deltas = FieldDeltas::default();
                for (index, item) in fields.values().enumerate() {
                    if !item.is_nil() {
                        deltas.field(&mut self.enc, index);
                        self.write_interface(item)?;
                    }
                }
                deltas.end(&mut self.enc);
            }
            Dynamic::Nil | Dynamic::Opaque(_) => {
                return Err(GobError::Unencodable(
                    "nil and opaque dynamic values have no wire type".to_string(),
                ))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_types_are_reused() {
        let mut registry = TypeRegistry::new();
        let strings = registry.slice(Builtin::String.id());
        assert_eq!(strings, FIRST_USER_ID + 1);
        assert_eq!(registry.slice(Builtin::String.id()), strings);
        let map = registry.map(Builtin::String.id(), strings);
        assert_eq!(registry.name(map), "map[string][]string");

        let pending = registry.take_pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert!(registry.take_pending().unwrap().is_empty());
        assert_eq!(registry.slice(Builtin::String.id()), strings);
    }

    #[test]
    fn dynamic_structs_are_structs() {
        let mut registry = TypeRegistry::new();
        let id = registry.dynamic_struct("Timeouts", vec!["create".to_string()]);
        assert!(registry.is_struct(id));
        let pending = registry.take_pending().unwrap();
        assert_eq!(pending[0].struct_fields().map(<[_]>::len), Some(1));
    }
}
