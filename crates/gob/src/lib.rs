//! Decoder and encoder for the Go `encoding/gob` stream format.
//!
//! A gob stream describes its own types: composite shapes are sent as type
//! definitions before the first value that uses them, and struct values are
//! sequences of field-number deltas. Targets are matched against those
//! definitions by field name, so fields unknown to the target are skipped and
//! fields missing from the stream keep their zero value.

mod catalog;
mod decoder;
mod dynamic;
mod encoder;
mod error;
pub mod hook;
mod limits;
pub mod record;
mod registry;
mod stream;
mod types;
mod value;

pub use catalog::{read_wire_type, write_wire_type, WireTypeCatalog};
pub use decoder::{read_uint_from, GobDecoder};
pub use dynamic::Dynamic;
pub use encoder::{FieldDeltas, GobEncoder};
pub use error::GobError;
pub use hook::OpaqueCodec;
pub use limits::DecodeLimits;
pub use record::{Bytes, Decode, Encode, Record};
pub use registry::{TypeRegistry, ValueEncoder};
pub use stream::{from_slice, to_bytes, GobStreamDecoder, GobStreamEncoder};
pub use types::{
    Builtin, Descriptor, OpaqueFlavor, TypeId, WireField, WireKind, WireType, FIRST_USER_ID,
};
pub use value::{Session, ValueDecoder};
