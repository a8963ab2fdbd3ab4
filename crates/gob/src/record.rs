//! Target-side traits and the implementations for standard types.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::encoder::FieldDeltas;
use crate::registry::{TypeRegistry, ValueEncoder};
use crate::types::{Builtin, Descriptor, TypeId, WireKind};
use crate::value::{Session, ValueDecoder};
use crate::{GobError, WireTypeCatalog};

/// A type that can be filled from a wire value.
pub trait Decode: Sized + 'static {
    /// Checks that values of wire type `wire` can be stored in `Self`.
    fn check_wire(session: &mut Session, wire: &Descriptor) -> Result<(), GobError>;

    /// Decodes one value. `wire` has already passed [`Decode::check_wire`].
    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError>;
}

/// A type that can be written as a wire value.
pub trait Encode: 'static {
    /// Registers the wire type of `Self`, returning its id.
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError>;

    /// Zero values are omitted from structs.
    fn is_zero(&self) -> bool {
        false
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError>;
}

/// A struct target whose fields are matched to wire fields by name.
///
/// Usually implemented through [`record!`](crate::record!).
pub trait Record: Default + 'static {
    /// Wire name of the struct.
    const NAME: &'static str;
    /// Wire names of the fields, in field-number order.
    const FIELDS: &'static [&'static str];

    fn check_field(index: usize, session: &mut Session, wire: &Descriptor)
        -> Result<(), GobError>;

    fn decode_field(
        &mut self,
        index: usize,
        values: &mut ValueDecoder<'_>,
        wire: &Descriptor,
    ) -> Result<(), GobError>;

    /// Wire type ids of the fields, in field-number order.
    fn field_wire_types(registry: &mut TypeRegistry) -> Result<Vec<TypeId>, GobError>;

    fn encode_fields(
        &self,
        values: &mut ValueEncoder<'_>,
        deltas: &mut FieldDeltas,
    ) -> Result<(), GobError>;
}

/// Declares a record struct together with its [`Record`], [`Decode`] and
/// [`Encode`] implementations.
///
/// ```
/// tfplan_gob::record! {
///     pub struct Point as "Point" {
///         pub x: i64 => "X",
///         pub y: i64 => "Y",
///     }
/// }
///
/// let bytes = tfplan_gob::to_bytes(&Point { x: 22, y: 33 }).unwrap();
/// let point: Point = tfplan_gob::from_slice(&bytes).unwrap();
/// assert_eq!(point.y, 33);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident as $wire:literal {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty => $wire_field:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            const NAME: &'static str = $wire;
            const FIELDS: &'static [&'static str] = &[$($wire_field),*];

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn check_field(
                index: usize,
                session: &mut $crate::Session,
                wire: &$crate::Descriptor,
            ) -> ::core::result::Result<(), $crate::GobError> {
                let mut at = 0usize;
                $(
                    if index == at {
                        return <$ty as $crate::Decode>::check_wire(session, wire);
                    }
                    at += 1;
                )*
                Err($crate::record::no_such_field($wire, index))
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn decode_field(
                &mut self,
                index: usize,
                values: &mut $crate::ValueDecoder<'_>,
                wire: &$crate::Descriptor,
            ) -> ::core::result::Result<(), $crate::GobError> {
                let mut at = 0usize;
                $(
                    if index == at {
                        self.$field = <$ty as $crate::Decode>::decode(values, wire)?;
                        return Ok(());
                    }
                    at += 1;
                )*
                Err($crate::record::no_such_field($wire, index))
            }

            #[allow(unused_variables)]
            fn field_wire_types(
                registry: &mut $crate::TypeRegistry,
            ) -> ::core::result::Result<::std::vec::Vec<$crate::TypeId>, $crate::GobError> {
                Ok(::std::vec![$(<$ty as $crate::Encode>::wire_type(registry)?),*])
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn encode_fields(
                &self,
                values: &mut $crate::ValueEncoder<'_>,
                deltas: &mut $crate::FieldDeltas,
            ) -> ::core::result::Result<(), $crate::GobError> {
                let mut at = 0usize;
                $(
                    values.encode_field(deltas, at, &self.$field)?;
                    at += 1;
                )*
                Ok(())
            }
        }

        impl $crate::Decode for $name {
            fn check_wire(
                session: &mut $crate::Session,
                wire: &$crate::Descriptor,
            ) -> ::core::result::Result<(), $crate::GobError> {
                session.check_record::<Self>(wire)
            }

            fn decode(
                values: &mut $crate::ValueDecoder<'_>,
                wire: &$crate::Descriptor,
            ) -> ::core::result::Result<Self, $crate::GobError> {
                values.decode_record::<Self>(wire)
            }
        }

        impl $crate::Encode for $name {
            fn wire_type(
                registry: &mut $crate::TypeRegistry,
            ) -> ::core::result::Result<$crate::TypeId, $crate::GobError> {
                registry.record::<Self>()
            }

            fn encode(
                &self,
                values: &mut $crate::ValueEncoder<'_>,
            ) -> ::core::result::Result<(), $crate::GobError> {
                values.encode_record(self)
            }
        }
    };
}

#[doc(hidden)]
pub fn no_such_field(record: &str, index: usize) -> GobError {
    GobError::malformed(format!("{record} has no field number {index}"))
}

/// Fails unless `wire` is the predefined type `expected`.
pub fn expect_builtin(wire: &Descriptor, expected: Builtin) -> Result<(), GobError> {
    match wire {
        Descriptor::Builtin(builtin) if *builtin == expected => Ok(()),
        other => Err(GobError::mismatch(expected.name(), other.describe())),
    }
}

/// Element type of a slice wire type.
pub fn slice_elem(catalog: &WireTypeCatalog, wire: &Descriptor) -> Result<Descriptor, GobError> {
    match wire {
        Descriptor::Defined(defined) => match defined.kind {
            WireKind::Slice { elem } => catalog.resolve(elem),
            _ => Err(GobError::mismatch("slice", wire.describe())),
        },
        Descriptor::Builtin(_) => Err(GobError::mismatch("slice", wire.describe())),
    }
}

/// Key and element types of a map wire type.
pub fn map_types(
    catalog: &WireTypeCatalog,
    wire: &Descriptor,
) -> Result<(Descriptor, Descriptor), GobError> {
    match wire {
        Descriptor::Defined(defined) => match defined.kind {
            WireKind::Map { key, elem } => Ok((catalog.resolve(key)?, catalog.resolve(elem)?)),
            _ => Err(GobError::mismatch("map", wire.describe())),
        },
        Descriptor::Builtin(_) => Err(GobError::mismatch("map", wire.describe())),
    }
}

macro_rules! signed {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
                expect_builtin(wire, Builtin::Int)
            }

            fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
                let raw = values.read_int()?;
                <$ty>::try_from(raw).map_err(|_| {
                    GobError::malformed(format!("value {raw} overflows {}", stringify!($ty)))
                })
            }
        }

        impl Encode for $ty {
            fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
                Ok(Builtin::Int.id())
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
                values.write_int(i64::from(*self));
                Ok(())
            }
        }
    )*};
}

macro_rules! unsigned {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
                expect_builtin(wire, Builtin::Uint)
            }

            fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
                let raw = values.read_uint()?;
                <$ty>::try_from(raw).map_err(|_| {
                    GobError::malformed(format!("value {raw} overflows {}", stringify!($ty)))
                })
            }
        }

        impl Encode for $ty {
            fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
                Ok(Builtin::Uint.id())
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
                values.write_uint(u64::from(*self));
                Ok(())
            }
        }
    )*};
}

signed!(i8, i16, i32, i64);
unsigned!(u8, u16, u32, u64);

impl Decode for bool {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        expect_builtin(wire, Builtin::Bool)
    }

    fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
        values.read_bool()
    }
}

impl Encode for bool {
    fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(Builtin::Bool.id())
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_bool(*self);
        Ok(())
    }
}

impl Decode for f64 {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        expect_builtin(wire, Builtin::Float)
    }

    fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
        values.read_float()
    }
}

impl Encode for f64 {
    fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(Builtin::Float.id())
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_float(*self);
        Ok(())
    }
}

impl Decode for f32 {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        expect_builtin(wire, Builtin::Float)
    }

    fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
        let raw = values.read_float()?;
        if raw.is_finite() && raw.abs() > f64::from(f32::MAX) {
            return Err(GobError::malformed(format!("value {raw} overflows f32")));
        }
        Ok(raw as f32)
    }
}

impl Encode for f32 {
    fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(Builtin::Float.id())
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_float(f64::from(*self));
        Ok(())
    }
}

impl Decode for String {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        expect_builtin(wire, Builtin::String)
    }

    fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
        values.read_string()
    }
}

impl Encode for String {
    fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(Builtin::String.id())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_string(self);
        Ok(())
    }
}

/// A Go `[]byte`, which travels as the predefined bytes type rather than as
/// a slice of unsigned integers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl Decode for Bytes {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        expect_builtin(wire, Builtin::Bytes)
    }

    fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
        Ok(Bytes(values.read_bytes()?.to_vec()))
    }
}

impl Encode for Bytes {
    fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(Builtin::Bytes.id())
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_bytes(&self.0);
        Ok(())
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn check_wire(session: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        let elem = slice_elem(session.catalog(), wire)?;
        T::check_wire(session, &elem).map_err(|e| e.within("[]"))
    }

    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
        let elem = slice_elem(values.catalog(), wire)?;
        let count = values.read_count()?;
        values.nested(|values| {
            let mut items = Vec::with_capacity(values.capacity_for(count));
            for i in 0..count {
                let item = T::decode(values, &elem).map_err(|e| e.within(&format!("[{i}]")))?;
                items.push(item);
            }
            Ok(items)
        })
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
        let elem = T::wire_type(registry)?;
        Ok(registry.slice(elem))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_uint(self.len() as u64);
        self.iter().try_for_each(|item| item.encode(values))
    }
}

/// Pointer slots: absent on the wire leaves `None`.
impl<T: Decode> Decode for Option<T> {
    fn check_wire(session: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        T::check_wire(session, wire)
    }

    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
        T::decode(values, wire).map(Some)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
        T::wire_type(registry)
    }

    fn is_zero(&self) -> bool {
        self.as_ref().map_or(true, Encode::is_zero)
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        match self {
            Some(value) => value.encode(values),
            None => Err(GobError::Unencodable("nil pointer".to_string())),
        }
    }
}

impl<K, V> Decode for BTreeMap<K, V>
where
    K: Decode + Ord + Debug,
    V: Decode,
{
    fn check_wire(session: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        let (key, elem) = map_types(session.catalog(), wire)?;
        K::check_wire(session, &key).map_err(|e| e.within("[key]"))?;
        V::check_wire(session, &elem).map_err(|e| e.within("[]"))
    }

    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
        let (key_wire, elem_wire) = map_types(values.catalog(), wire)?;
        let count = values.read_count()?;
        values.nested(|values| {
            let mut map = BTreeMap::new();
            for _ in 0..count {
                let key = K::decode(values, &key_wire)?;
                let value =
                    V::decode(values, &elem_wire).map_err(|e| e.within(&format!("[{key:?}]")))?;
                if map.contains_key(&key) {
                    return Err(GobError::malformed(format!("duplicate map key {key:?}")));
                }
                map.insert(key, value);
            }
            Ok(map)
        })
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
        let key = K::wire_type(registry)?;
        let elem = V::wire_type(registry)?;
        Ok(registry.map(key, elem))
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_uint(self.len() as u64);
        self.iter().try_for_each(|(key, value)| {
            key.encode(values)?;
            value.encode(values)
        })
    }
}
