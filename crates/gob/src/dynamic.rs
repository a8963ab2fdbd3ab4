//! Values of Go `interface{}` slots.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::{expect_builtin, Decode, Encode};
use crate::registry::{TypeRegistry, ValueEncoder};
use crate::types::{Builtin, Descriptor, TypeId};
use crate::value::{Session, ValueDecoder};
use crate::GobError;

/// A value whose shape is only known from the stream.
///
/// The shape comes from the concrete wire type announced by the interface
/// value; the producer's registered type name is only used to tell `nil`
/// apart from everything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Dynamic {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<Dynamic>),
    Map(BTreeMap<String, Dynamic>),
    /// Struct value; fields the producer omitted as zero are absent.
    Struct {
        name: String,
        fields: BTreeMap<String, Dynamic>,
    },
    /// A value that marshalled itself; only the blob is kept.
    Opaque(Vec<u8>),
}

impl Dynamic {
    pub fn is_nil(&self) -> bool {
        matches!(self, Dynamic::Nil)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Dynamic::Int(i) => Some(*i),
            Dynamic::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Dynamic::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Dynamic>> {
        match self {
            Dynamic::Map(map) => Some(map),
            Dynamic::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Looks up `key` in a map or struct value.
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Name a Go producer registers for the concrete type of this value.
    pub(crate) fn concrete_name(&self) -> Option<&str> {
        Some(match self {
            Dynamic::Nil | Dynamic::Opaque(_) => return None,
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Uint(_) => "uint",
            Dynamic::Float(_) => "float64",
            Dynamic::Complex(..) => "complex128",
            Dynamic::Bytes(_) => "[]uint8",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "[]interface {}",
            Dynamic::Map(_) => "map[string]interface {}",
            Dynamic::Struct { name, .. } => name,
        })
    }
}

impl Decode for Dynamic {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        expect_builtin(wire, Builtin::Interface)
    }

    fn decode(values: &mut ValueDecoder<'_>, _: &Descriptor) -> Result<Self, GobError> {
        values.read_interface()
    }
}

impl Encode for Dynamic {
    fn wire_type(_: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(Builtin::Interface.id())
    }

    fn is_zero(&self) -> bool {
        self.is_nil()
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        values.write_interface(self)
    }
}

impl From<bool> for Dynamic {
    fn from(b: bool) -> Self {
        Dynamic::Bool(b)
    }
}

impl From<i64> for Dynamic {
    fn from(i: i64) -> Self {
        Dynamic::Int(i)
    }
}

impl From<f64> for Dynamic {
    fn from(f: f64) -> Self {
        Dynamic::Float(f)
    }
}

impl From<&str> for Dynamic {
    fn from(s: &str) -> Self {
        Dynamic::String(s.to_string())
    }
}

impl From<String> for Dynamic {
    fn from(s: String) -> Self {
        Dynamic::String(s)
    }
}

impl From<Vec<Dynamic>> for Dynamic {
    fn from(items: Vec<Dynamic>) -> Self {
        Dynamic::List(items)
    }
}

impl From<BTreeMap<String, Dynamic>> for Dynamic {
    fn from(map: BTreeMap<String, Dynamic>) -> Self {
        Dynamic::Map(map)
    }
}

impl From<Value> for Dynamic {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Dynamic::Nil,
            Value::Bool(b) => Dynamic::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Dynamic::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Dynamic::Uint(u)
                } else {
                    Dynamic::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Dynamic::String(s),
            Value::Array(items) => Dynamic::List(items.into_iter().map(Dynamic::from).collect()),
            Value::Object(map) => Dynamic::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Dynamic::from(value)))
                    .collect(),
            ),
        }
    }
}
