//! Per-stream registry of received type definitions.
//!
//! Definitions arrive as `wireType` bootstrap structs. A definition may
//! name component ids that the producer sends afterwards, so references
//! are only resolved when a value needs them.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::decoder::advance_field;
use crate::encoder::FieldDeltas;
use crate::types::{Builtin, Descriptor, OpaqueFlavor, TypeId, WireField, WireKind, WireType, FIRST_USER_ID};
use crate::{GobDecoder, GobEncoder, GobError};

/// Field count of the `wireType` bootstrap struct.
const WIRE_TYPE_FIELDS: usize = 7;

/// Type definitions received on one stream.
#[derive(Debug, Default)]
pub struct WireTypeCatalog {
    types: HashMap<TypeId, Rc<WireType>>,
}

impl WireTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a definition. Reserved ids and redefinitions are rejected.
    pub fn define(&mut self, wire: WireType) -> Result<(), GobError> {
        if wire.id < FIRST_USER_ID {
            return Err(GobError::malformed(format!(
                "type definition for reserved id {}",
                wire.id
            )));
        }
        if self.types.contains_key(&wire.id) {
            return Err(GobError::malformed(format!(
                "duplicate type definition for id {}",
                wire.id
            )));
        }
        trace!(id = wire.id, name = %wire.name, kind = wire.kind.label(), "received type definition");
        self.types.insert(wire.id, Rc::new(wire));
        Ok(())
    }

    pub fn resolve(&self, id: TypeId) -> Result<Descriptor, GobError> {
        if let Some(builtin) = Builtin::from_id(id) {
            return Ok(Descriptor::Builtin(builtin));
        }
        self.types
            .get(&id)
            .map(|wire| Descriptor::Defined(Rc::clone(wire)))
            .ok_or_else(|| GobError::malformed(format!("reference to undefined type id {id}")))
    }

    pub fn describe(&self, id: TypeId) -> String {
        match self.resolve(id) {
            Ok(desc) => desc.describe(),
            Err(_) => format!("undefined type {id}"),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

pub(crate) fn type_id_from(raw: i64) -> Result<TypeId, GobError> {
    TypeId::try_from(raw).map_err(|_| GobError::malformed(format!("type id {raw} out of range")))
}

/// Walks one bootstrap struct value, handing each present field to `visit`.
fn read_fields(
    dec: &mut GobDecoder,
    count: usize,
    mut visit: impl FnMut(&mut GobDecoder, usize) -> Result<(), GobError>,
) -> Result<(), GobError> {
    let mut last = -1i64;
    loop {
        let delta = dec.read_uint()?;
        if delta == 0 {
            return Ok(());
        }
        let field = advance_field(last, delta, count)?;
        last = field as i64;
        visit(dec, field)?;
    }
}

/// `CommonType { Name string; Id typeId }`
fn read_common(dec: &mut GobDecoder) -> Result<String, GobError> {
    let mut name = String::new();
    read_fields(dec, 2, |dec, field| {
        match field {
            0 => name = dec.read_string()?,
            _ => {
                dec.read_int()?;
            }
        }
        Ok(())
    })?;
    Ok(name)
}

fn read_type_ref(dec: &mut GobDecoder) -> Result<TypeId, GobError> {
    type_id_from(dec.read_int()?)
}

/// Parses the `wireType` body of a type definition message for `id`.
pub fn read_wire_type(dec: &mut GobDecoder, id: TypeId) -> Result<WireType, GobError> {
    let mut parsed: Option<(String, WireKind)> = None;
    read_fields(dec, WIRE_TYPE_FIELDS, |dec, field| {
        if parsed.is_some() {
            return Err(GobError::malformed(format!(
                "type definition for id {id} declares more than one kind"
            )));
        }
        parsed = Some(match field {
            0 => {
                let (mut name, mut elem, mut len) = (String::new(), 0, 0i64);
                read_fields(dec, 3, |dec, field| {
                    match field {
                        0 => name = read_common(dec)?,
                        1 => elem = read_type_ref(dec)?,
                        _ => len = dec.read_int()?,
                    }
                    Ok(())
                })?;
                let len = usize::try_from(len)
                    .map_err(|_| GobError::malformed(format!("negative array length {len}")))?;
                (name, WireKind::Array { elem, len })
            }
            1 => {
                let (mut name, mut elem) = (String::new(), 0);
                read_fields(dec, 2, |dec, field| {
                    match field {
                        0 => name = read_common(dec)?,
                        _ => elem = read_type_ref(dec)?,
                    }
                    Ok(())
                })?;
                (name, WireKind::Slice { elem })
            }
            2 => {
                let (mut name, mut fields) = (String::new(), Vec::new());
                read_fields(dec, 2, |dec, field| {
                    match field {
                        0 => name = read_common(dec)?,
                        _ => fields = read_field_list(dec)?,
                    }
                    Ok(())
                })?;
                (name, WireKind::Struct { fields })
            }
            3 => {
                let (mut name, mut key, mut elem) = (String::new(), 0, 0);
                read_fields(dec, 3, |dec, field| {
                    match field {
                        0 => name = read_common(dec)?,
                        1 => key = read_type_ref(dec)?,
                        _ => elem = read_type_ref(dec)?,
                    }
                    Ok(())
                })?;
                (name, WireKind::Map { key, elem })
            }
            n => {
                let flavor = match n {
                    4 => OpaqueFlavor::GobEncoder,
                    5 => OpaqueFlavor::BinaryMarshaler,
                    _ => OpaqueFlavor::TextMarshaler,
                };
                let mut name = String::new();
                read_fields(dec, 1, |dec, _| {
                    name = read_common(dec)?;
                    Ok(())
                })?;
                (name, WireKind::Opaque(flavor))
            }
        });
        Ok(())
    })?;
    let (name, kind) = parsed.ok_or_else(|| {
        GobError::malformed(format!("type definition for id {id} declares no kind"))
    })?;
    Ok(WireType { id, name, kind })
}

/// `[]*fieldType` where `fieldType { Name string; Id typeId }`.
fn read_field_list(dec: &mut GobDecoder) -> Result<Vec<WireField>, GobError> {
    let count = dec.read_len()?;
    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        let mut field = WireField {
            name: String::new(),
            id: 0,
        };
        read_fields(dec, 2, |dec, n| {
            match n {
                0 => field.name = dec.read_string()?,
                _ => field.id = read_type_ref(dec)?,
            }
            Ok(())
        })?;
        fields.push(field);
    }
    Ok(fields)
}

fn write_common(enc: &mut GobEncoder, wire: &WireType) {
    let mut deltas = FieldDeltas::default();
    if !wire.name.is_empty() {
        deltas.field(enc, 0);
        enc.write_string(&wire.name);
    }
    deltas.field(enc, 1);
    enc.write_int(i64::from(wire.id));
    deltas.end(enc);
}

fn write_type_ref(enc: &mut GobEncoder, deltas: &mut FieldDeltas, index: usize, id: TypeId) {
    if id != 0 {
        deltas.field(enc, index);
        enc.write_int(i64::from(id));
    }
}

/// Writes the `wireType` body describing `wire`.
pub fn write_wire_type(enc: &mut GobEncoder, wire: &WireType) {
    let mut outer = FieldDeltas::default();
    let slot = match &wire.kind {
        WireKind::Array { .. } => 0,
        WireKind::Slice { .. } => 1,
        WireKind::Struct { .. } => 2,
        WireKind::Map { .. } => 3,
        WireKind::Opaque(flavor) => flavor.field_number(),
    };
    outer.field(enc, slot);
    let mut inner = FieldDeltas::default();
    inner.field(enc, 0);
    write_common(enc, wire);
    match &wire.kind {
        WireKind::Array { elem, len } => {
            write_type_ref(enc, &mut inner, 1, *elem);
            if *len != 0 {
                inner.field(enc, 2);
                enc.write_int(*len as i64);
            }
        }
        WireKind::Slice { elem } => write_type_ref(enc, &mut inner, 1, *elem),
        WireKind::Struct { fields } => {
            if !fields.is_empty() {
                inner.field(enc, 1);
                enc.write_uint(fields.len() as u64);
                for field in fields {
                    let mut deltas = FieldDeltas::default();
                    if !field.name.is_empty() {
                        deltas.field(enc, 0);
                        enc.write_string(&field.name);
                    }
                    write_type_ref(enc, &mut deltas, 1, field.id);
                    deltas.end(enc);
                }
            }
        }
        WireKind::Map { key, elem } => {
            write_type_ref(enc, &mut inner, 1, *key);
            write_type_ref(enc, &mut inner, 2, *elem);
        }
        WireKind::Opaque(_) => {}
    }
    inner.end(enc);
    outer.end(enc);
}
