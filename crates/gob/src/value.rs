//! Typed value decoding on top of the primitive decoder.

use std::any;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Read};
use std::rc::Rc;

use tracing::trace;

use crate::catalog::{read_wire_type, type_id_from, WireTypeCatalog};
use crate::decoder::{advance_field, read_uint_from};
use crate::dynamic::Dynamic;
use crate::record::Record;
use crate::types::{Builtin, Descriptor, TypeId, WireKind, WireType};
use crate::{DecodeLimits, GobDecoder, GobError};

type PlanKey = (TypeId, any::TypeId);

struct PlannedField {
    name: String,
    /// Index into [`Record::FIELDS`], or `None` for a field the record lacks.
    slot: Option<usize>,
    wire: Descriptor,
}

/// How the fields of one wire struct map onto one record type.
pub(crate) struct FieldPlan {
    fields: Vec<PlannedField>,
}

/// Decoding state shared by every value of one stream.
pub struct Session {
    catalog: WireTypeCatalog,
    plans: HashMap<PlanKey, Rc<FieldPlan>>,
    compiling: HashSet<PlanKey>,
    limits: DecodeLimits,
}

impl Session {
    pub fn new(limits: DecodeLimits) -> Self {
        Self {
            catalog: WireTypeCatalog::new(),
            plans: HashMap::new(),
            compiling: HashSet::new(),
            limits,
        }
    }

    pub fn catalog(&self) -> &WireTypeCatalog {
        &self.catalog
    }

    pub(crate) fn catalog_mut(&mut self) -> &mut WireTypeCatalog {
        &mut self.catalog
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// Verifies that `wire` can be decoded into `T`, building the field plan
    /// used for every later value of that pair.
    pub fn check_record<T: Record>(&mut self, wire: &Descriptor) -> Result<(), GobError> {
        let wire_type = match wire {
            Descriptor::Defined(wire) if wire.struct_fields().is_some() => Rc::clone(wire),
            other => {
                return Err(GobError::mismatch(
                    format!("struct {}", T::NAME),
                    other.describe(),
                ))
            }
        };
        let key = (wire_type.id, any::TypeId::of::<T>());
        // A record reachable from itself is already being checked further up.
        if self.plans.contains_key(&key) || self.compiling.contains(&key) {
            return Ok(());
        }
        self.compiling.insert(key);
        let plan = self.compile::<T>(&wire_type);
        self.compiling.remove(&key);
        self.plans.insert(key, Rc::new(plan?));
        Ok(())
    }

    fn compile<T: Record>(&mut self, wire: &WireType) -> Result<FieldPlan, GobError> {
        let declared = wire.struct_fields().unwrap_or_default();
        let mut fields = Vec::with_capacity(declared.len());
        let mut matched = 0usize;
        for field in declared {
            let desc = self.catalog.resolve(field.id)?;
            let slot = T::FIELDS.iter().position(|name| *name == field.name);
            if let Some(slot) = slot {
                T::check_field(slot, self, &desc).map_err(|e| e.within(&field.name))?;
                matched += 1;
            }
            fields.push(PlannedField {
                name: field.name.clone(),
                slot,
                wire: desc,
            });
        }
        if matched == 0 && !declared.is_empty() && !T::FIELDS.is_empty() {
            return Err(GobError::mismatch(
                format!("struct {}", T::NAME),
                format!("struct {} with no matching fields", wire.name),
            ));
        }
        Ok(FieldPlan { fields })
    }

    fn plan<T: Record>(&mut self, wire: &Descriptor) -> Result<Rc<FieldPlan>, GobError> {
        self.check_record::<T>(wire)?;
        let Descriptor::Defined(wire_type) = wire else {
            return Err(GobError::mismatch(format!("struct {}", T::NAME), wire.describe()));
        };
        self.plans
            .get(&(wire_type.id, any::TypeId::of::<T>()))
            .cloned()
            .ok_or_else(|| {
                GobError::malformed(format!("{} is reachable from itself by value", T::NAME))
            })
    }
}

pub(crate) fn unexpected_eof(what: &str) -> GobError {
    GobError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, what.to_string()))
}

/// Reads the next length-prefixed message, or `None` at a clean end of input.
pub(crate) fn next_message(
    source: &mut dyn Read,
    limits: &DecodeLimits,
) -> Result<Option<Vec<u8>>, GobError> {
    let Some(len) = read_uint_from(source)? else {
        return Ok(None);
    };
    if len > limits.max_message_len as u64 {
        return Err(GobError::malformed(format!(
            "message of {len} bytes exceeds the limit of {}",
            limits.max_message_len
        )));
    }
    let mut body = Vec::new();
    Read::take(&mut *source, len).read_to_end(&mut body)?;
    if (body.len() as u64) < len {
        return Err(unexpected_eof("message truncated"));
    }
    Ok(Some(body))
}

/// Reads type definitions until a value id shows up. Inside an interface
/// value each definition may be followed by the byte count of the delimited
/// value, and the definitions may end the current message.
pub(crate) fn read_type_sequence(
    dec: &mut GobDecoder,
    session: &mut Session,
    source: &mut dyn Read,
    in_interface: bool,
) -> Result<TypeId, GobError> {
    loop {
        if dec.is_empty() {
            let body = next_message(source, &session.limits)?
                .ok_or_else(|| unexpected_eof("stream ended before a value"))?;
            dec.refill(body);
        }
        let raw = dec.read_int()?;
        if raw >= 0 {
            return type_id_from(raw);
        }
        let id = type_id_from(raw)?
            .checked_neg()
            .ok_or_else(|| GobError::malformed(format!("type id {raw} out of range")))?;
        let wire = read_wire_type(dec, id)?;
        session.catalog_mut().define(wire)?;
        if !dec.is_empty() {
            if !in_interface {
                return Err(GobError::malformed(format!(
                    "extra data after the definition of type {id}"
                )));
            }
            dec.read_uint()?;
        }
    }
}

/// Decodes values against the wire types of one stream.
pub struct ValueDecoder<'s> {
    dec: &'s mut GobDecoder,
    session: &'s mut Session,
    source: &'s mut dyn Read,
    depth: usize,
}

impl<'s> ValueDecoder<'s> {
    pub(crate) fn new(
        dec: &'s mut GobDecoder,
        session: &'s mut Session,
        source: &'s mut dyn Read,
        depth: usize,
    ) -> Self {
        Self {
            dec,
            session,
            source,
            depth,
        }
    }

    pub fn read_uint(&mut self) -> Result<u64, GobError> {
        self.dec.read_uint()
    }

    pub fn read_int(&mut self) -> Result<i64, GobError> {
        self.dec.read_int()
    }

    pub fn read_bool(&mut self) -> Result<bool, GobError> {
        self.dec.read_bool()
    }

    pub fn read_float(&mut self) -> Result<f64, GobError> {
        self.dec.read_float()
    }

    pub fn read_bytes(&mut self) -> Result<&[u8], GobError> {
        self.dec.read_bytes()
    }

    pub fn read_string(&mut self) -> Result<String, GobError> {
        self.dec.read_string()
    }

    /// Element count of a slice, array or map.
    pub fn read_count(&mut self) -> Result<usize, GobError> {
        let count = self.dec.read_uint()?;
        usize::try_from(count)
            .map_err(|_| GobError::malformed(format!("element count {count} out of range")))
    }

    /// Capacity hint for `count` elements that never exceeds the bytes at hand.
    pub fn capacity_for(&self, count: usize) -> usize {
        count.min(self.dec.remaining())
    }

    pub fn catalog(&self) -> &WireTypeCatalog {
        &self.session.catalog
    }

    pub fn limits(&self) -> DecodeLimits {
        self.session.limits
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Runs `f` one nesting level deeper.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, GobError>,
    ) -> Result<T, GobError> {
        let max = self.session.limits.max_depth;
        if self.depth >= max {
            return Err(GobError::malformed(format!(
                "value nesting exceeds the limit of {max}"
            )));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    /// Reads the `0` delta that precedes a non-struct value at the top of a
    /// message or inside an interface.
    pub fn expect_singleton(&mut self) -> Result<(), GobError> {
        match self.read_uint()? {
            0 => Ok(()),
            delta => Err(GobError::malformed(format!(
                "non-zero delta {delta} before a non-struct value"
            ))),
        }
    }

    pub fn decode_record<T: Record>(&mut self, wire: &Descriptor) -> Result<T, GobError> {
        let plan = self.session.plan::<T>(wire)?;
        self.nested(|values| {
            let mut record = T::default();
            let mut last = -1i64;
            loop {
                let delta = values.read_uint()?;
                if delta == 0 {
                    return Ok(record);
                }
                let index = advance_field(last, delta, plan.fields.len())?;
                last = index as i64;
                let field = &plan.fields[index];
                match field.slot {
                    Some(slot) => record
                        .decode_field(slot, values, &field.wire)
                        .map_err(|e| e.within(&field.name))?,
                    None => {
                        trace!(record = T::NAME, field = %field.name, "skipping unknown field");
                        values.skip_value(&field.wire)?;
                    }
                }
            }
        })
    }

    /// Reads and discards one value of type `wire`.
    pub fn skip_value(&mut self, wire: &Descriptor) -> Result<(), GobError> {
        let wire = match wire {
            Descriptor::Builtin(builtin) => {
                match builtin {
                    Builtin::Bool | Builtin::Int | Builtin::Uint | Builtin::Float => {
                        self.read_uint()?;
                    }
                    Builtin::Complex => {
                        self.read_uint()?;
                        self.read_uint()?;
                    }
                    Builtin::Bytes | Builtin::String => self.dec.skip_bytes()?,
                    Builtin::Interface => self.skip_interface()?,
                }
                return Ok(());
            }
            Descriptor::Defined(wire) => Rc::clone(wire),
        };
        self.nested(|values| match &wire.kind {
            WireKind::Struct { fields } => {
                let mut last = -1i64;
                loop {
                    let delta = values.read_uint()?;
                    if delta == 0 {
                        return Ok(());
                    }
                    let index = advance_field(last, delta, fields.len())?;
                    last = index as i64;
                    let field = values.catalog().resolve(fields[index].id)?;
                    values.skip_value(&field)?;
                }
            }
            WireKind::Slice { elem } => {
                let count = values.read_count()?;
                let elem = values.catalog().resolve(*elem)?;
                (0..count).try_for_each(|_| values.skip_value(&elem))
            }
            WireKind::Array { elem, len } => {
                let count = values.read_array_len(*len)?;
                let elem = values.catalog().resolve(*elem)?;
                (0..count).try_for_each(|_| values.skip_value(&elem))
            }
            WireKind::Map { key, elem } => {
                let count = values.read_count()?;
                let key = values.catalog().resolve(*key)?;
                let elem = values.catalog().resolve(*elem)?;
                (0..count).try_for_each(|_| {
                    values.skip_value(&key)?;
                    values.skip_value(&elem)
                })
            }
            WireKind::Opaque(_) => values.dec.skip_bytes(),
        })
    }

    fn read_array_len(&mut self, len: usize) -> Result<usize, GobError> {
        let count = self.read_count()?;
        if count != len {
            return Err(GobError::malformed(format!(
                "array of length {len} carries {count} elements"
            )));
        }
        Ok(count)
    }

    /// Reads the concrete type of an interface value, or `None` for nil.
    fn interface_type(&mut self) -> Result<Option<Descriptor>, GobError> {
        let name = self.read_string()?;
        if name.is_empty() {
            return Ok(None);
        }
        let id = read_type_sequence(
            &mut *self.dec,
            &mut *self.session,
            &mut *self.source,
            true,
        )?;
        self.session.catalog.resolve(id).map(Some)
    }

    /// Decodes an interface value into its dynamic form.
    pub fn read_interface(&mut self) -> Result<Dynamic, GobError> {
        let Some(wire) = self.interface_type()? else {
            return Ok(Dynamic::Nil);
        };
        // Byte count of the concrete value; only needed to skip it.
        self.read_uint()?;
        self.nested(|values| {
            if !wire.is_struct() {
                values.expect_singleton()?;
            }
            values.read_dynamic(&wire)
        })
    }

    fn skip_interface(&mut self) -> Result<(), GobError> {
        if self.interface_type()?.is_none() {
            return Ok(());
        }
        let len = self.dec.read_len()?;
        self.dec.skip(len)
    }

    /// Decodes one value of type `wire` without a target type.
    pub fn read_dynamic(&mut self, wire: &Descriptor) -> Result<Dynamic, GobError> {
        let wire = match wire {
            Descriptor::Builtin(builtin) => {
                return Ok(match builtin {
                    Builtin::Bool => Dynamic::Bool(self.read_bool()?),
                    Builtin::Int => Dynamic::Int(self.read_int()?),
                    Builtin::Uint => Dynamic::Uint(self.read_uint()?),
                    Builtin::Float => Dynamic::Float(self.read_float()?),
                    Builtin::Complex => Dynamic::Complex(self.read_float()?, self.read_float()?),
                    Builtin::Bytes => Dynamic::Bytes(self.read_bytes()?.to_vec()),
                    Builtin::String => Dynamic::String(self.read_string()?),
                    Builtin::Interface => self.read_interface()?,
                });
            }
            Descriptor::Defined(wire) => Rc::clone(wire),
        };
        self.nested(|values| match &wire.kind {
            WireKind::Struct { fields } => {
                let mut out = BTreeMap::new();
                let mut last = -1i64;
                loop {
                    let delta = values.read_uint()?;
                    if delta == 0 {
                        return Ok(Dynamic::Struct {
                            name: wire.name.clone(),
                            fields: out,
                        });
                    }
                    let index = advance_field(last, delta, fields.len())?;
                    last = index as i64;
                    let field = &fields[index];
                    let desc = values.catalog().resolve(field.id)?;
                    let value = values
                        .read_dynamic(&desc)
                        .map_err(|e| e.within(&field.name))?;
                    out.insert(field.name.clone(), value);
                }
            }
            WireKind::Slice { elem } => {
                let count = values.read_count()?;
                values.read_dynamic_list(*elem, count)
            }
            WireKind::Array { elem, len } => {
                let count = values.read_array_len(*len)?;
                values.read_dynamic_list(*elem, count)
            }
            WireKind::Map { key, elem } => {
                let key = values.catalog().resolve(*key)?;
                if !matches!(key, Descriptor::Builtin(Builtin::String)) {
                    return Err(GobError::mismatch("string map key", key.describe()));
                }
                let elem = values.catalog().resolve(*elem)?;
                let count = values.read_count()?;
                let mut out = BTreeMap::new();
                for _ in 0..count {
                    let key = values.read_string()?;
                    let value = values
                        .read_dynamic(&elem)
                        .map_err(|e| e.within(&format!("[{key:?}]")))?;
                    if out.contains_key(&key) {
                        return Err(GobError::malformed(format!("duplicate map key {key:?}")));
                    }
                    out.insert(key, value);
                }
                Ok(Dynamic::Map(out))
            }
            WireKind::Opaque(_) => Ok(Dynamic::Opaque(values.read_bytes()?.to_vec())),
        })
    }

    fn read_dynamic_list(&mut self, elem: TypeId, count: usize) -> Result<Dynamic, GobError> {
        let elem = self.catalog().resolve(elem)?;
        let mut items = Vec::with_capacity(self.capacity_for(count));
        for i in 0..count {
            let item = self
                .read_dynamic(&elem)
                .map_err(|e| e.within(&format!("[{i}]")))?;
            items.push(item);
        }
        Ok(Dynamic::List(items))
    }
}
