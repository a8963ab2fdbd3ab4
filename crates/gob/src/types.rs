//! Wire type descriptors.
//!
//! Ids 1 through 8 name the predefined types; every other id used by a
//! stream is declared by a type definition message before the first value
//! that needs it is decoded.

use std::rc::Rc;

/// Stream-local type identifier.
pub type TypeId = i32;

/// Ids below this value are reserved for predefined and bootstrap types.
pub const FIRST_USER_ID: TypeId = 64;

/// Predefined primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Int,
    Uint,
    Float,
    Bytes,
    String,
    Complex,
    Interface,
}

impl Builtin {
    pub const fn id(self) -> TypeId {
        match self {
            Builtin::Bool => 1,
            Builtin::Int => 2,
            Builtin::Uint => 3,
            Builtin::Float => 4,
            Builtin::Bytes => 5,
            Builtin::String => 6,
            Builtin::Complex => 7,
            Builtin::Interface => 8,
        }
    }

    pub fn from_id(id: TypeId) -> Option<Self> {
        Some(match id {
            1 => Builtin::Bool,
            2 => Builtin::Int,
            3 => Builtin::Uint,
            4 => Builtin::Float,
            5 => Builtin::Bytes,
            6 => Builtin::String,
            7 => Builtin::Complex,
            8 => Builtin::Interface,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Bool => "bool",
            Builtin::Int => "int",
            Builtin::Uint => "uint",
            Builtin::Float => "float",
            Builtin::Bytes => "[]byte",
            Builtin::String => "string",
            Builtin::Complex => "complex",
            Builtin::Interface => "interface",
        }
    }
}

/// One named field of a struct wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField {
    pub name: String,
    pub id: TypeId,
}

/// Which custom marshalling interface produced an opaque value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueFlavor {
    GobEncoder,
    BinaryMarshaler,
    TextMarshaler,
}

impl OpaqueFlavor {
    /// Field number of this flavor inside the `wireType` bootstrap struct.
    pub(crate) const fn field_number(self) -> usize {
        match self {
            OpaqueFlavor::GobEncoder => 4,
            OpaqueFlavor::BinaryMarshaler => 5,
            OpaqueFlavor::TextMarshaler => 6,
        }
    }
}

/// Structural shape of a user-defined wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireKind {
    Array { elem: TypeId, len: usize },
    Slice { elem: TypeId },
    Struct { fields: Vec<WireField> },
    Map { key: TypeId, elem: TypeId },
    /// A value that marshalled itself into a byte blob.
    Opaque(OpaqueFlavor),
}

impl WireKind {
    pub const fn label(&self) -> &'static str {
        match self {
            WireKind::Array { .. } => "array",
            WireKind::Slice { .. } => "slice",
            WireKind::Struct { .. } => "struct",
            WireKind::Map { .. } => "map",
            WireKind::Opaque(_) => "opaque",
        }
    }
}

/// A type definition received from (or sent to) a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireType {
    pub id: TypeId,
    pub name: String,
    pub kind: WireKind,
}

impl WireType {
    /// Field list when this is a struct type.
    pub fn struct_fields(&self) -> Option<&[WireField]> {
        match &self.kind {
            WireKind::Struct { fields } => Some(fields),
            _ => None,
        }
    }
}

/// What a type id resolves to within one stream.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Builtin(Builtin),
    Defined(Rc<WireType>),
}

impl Descriptor {
    pub fn is_struct(&self) -> bool {
        matches!(self, Descriptor::Defined(wire) if wire.struct_fields().is_some())
    }

    /// Human-readable summary used in mismatch diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Descriptor::Builtin(builtin) => builtin.name().to_string(),
            Descriptor::Defined(wire) if wire.name.is_empty() => wire.kind.label().to_string(),
            Descriptor::Defined(wire) => format!("{} {}", wire.kind.label(), wire.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_ids_roundtrip() {
        for id in 1..=8 {
            let builtin = Builtin::from_id(id).expect("predefined id");
            assert_eq!(builtin.id(), id);
        }
        assert_eq!(Builtin::from_id(0), None);
        assert_eq!(Builtin::from_id(9), None);
        assert_eq!(Builtin::from_id(FIRST_USER_ID + 1), None);
    }

    #[test]
    fn describe_names_kind_and_type() {
        let wire = WireType {
            id: 65,
            name: "Plan".to_string(),
            kind: WireKind::Struct { fields: Vec::new() },
        };
        let desc = Descriptor::Defined(Rc::new(wire));
        assert!(desc.is_struct());
        assert_eq!(desc.describe(), "struct Plan");
        assert_eq!(Descriptor::Builtin(Builtin::String).describe(), "string");
    }
}
