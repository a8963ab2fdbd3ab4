//! Key-only stand-in for a configuration expression.

use tfplan_gob::hook::{self, OpaqueCodec};
use tfplan_gob::{
    record, Decode, Descriptor, Encode, GobError, GobStreamDecoder, GobStreamEncoder, Session,
    TypeId, TypeRegistry, ValueDecoder, ValueEncoder,
};

/// A reference to a raw configuration block.
///
/// Producers may embed the expression map next to the key; it is read and
/// dropped, only the key survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    key: String,
}

impl RawConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

record! {
    struct RawConfigFields as "gobRawConfig" {
        key: String => "Key",
    }
}

impl OpaqueCodec for RawConfig {
    const NAME: &'static str = "RawConfig";

    fn decode_blob(stream: &mut GobStreamDecoder<&[u8]>) -> Result<Self, GobError> {
        let fields: RawConfigFields = stream.decode()?;
        Ok(RawConfig { key: fields.key })
    }

    fn encode_blob(&self, stream: &mut GobStreamEncoder<Vec<u8>>) -> Result<(), GobError> {
        stream.encode(&RawConfigFields {
            key: self.key.clone(),
        })
    }
}

impl Decode for RawConfig {
    fn check_wire(_: &mut Session, wire: &Descriptor) -> Result<(), GobError> {
        hook::check_opaque::<Self>(wire)
    }

    fn decode(values: &mut ValueDecoder<'_>, wire: &Descriptor) -> Result<Self, GobError> {
        hook::decode_opaque(values, wire)
    }
}

impl Encode for RawConfig {
    fn wire_type(registry: &mut TypeRegistry) -> Result<TypeId, GobError> {
        Ok(hook::opaque_wire_type::<Self>(registry))
    }

    fn encode(&self, values: &mut ValueEncoder<'_>) -> Result<(), GobError> {
        hook::encode_opaque(self, values)
    }
}
