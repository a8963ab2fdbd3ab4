//! Entities that bypass field-by-field decoding.
//!
//! A hooked entity travels as an opaque blob holding a complete gob stream
//! of its own, with a fresh type catalog. The target type picks the hook in
//! its [`Decode`](crate::Decode)/[`Encode`](crate::Encode) implementation by
//! delegating to the helpers here.

use crate::registry::{TypeRegistry, ValueEncoder};
use crate::stream::{GobStreamDecoder, GobStreamEncoder};
use crate::types::{Descriptor, OpaqueFlavor, TypeId, WireKind};
use crate::value::ValueDecoder;
use crate::{DecodeLimits, GobError};

/// Byte-blob codec for a hooked entity.
pub trait OpaqueCodec: Sized + 'static {
    /// Name the entity is registered under on the wire.
    const NAME: &'static str;

    fn decode_blob(stream: &mut GobStreamDecoder<&[u8]>) -> Result<Self, GobError>;

    fn encode_blob(&self, stream: &mut GobStreamEncoder<Vec<u8>>) -> Result<(), GobError>;
}

/// Hooked entities only accept the opaque wire kinds.
pub fn check_opaque<T: OpaqueCodec>(wire: &Descriptor) -> Result<(), GobError> {
    match wire {
        Descriptor::Defined(defined) if matches!(defined.kind, WireKind::Opaque(_)) => Ok(()),
        other => Err(GobError::mismatch(
            format!("opaque {}", T::NAME),
            other.describe(),
        )),
    }
}

pub fn decode_opaque<T: OpaqueCodec>(
    values: &mut ValueDecoder<'_>,
    wire: &Descriptor,
) -> Result<T, GobError> {
    check_opaque::<T>(wire)?;
    let depth = values.depth() + 1;
    let limits = values.limits();
    let blob = values.read_bytes()?.to_vec();
    decode_blob_at(&blob, limits, depth)
}

fn decode_blob_at<T: OpaqueCodec>(
    blob: &[u8],
    limits: DecodeLimits,
    depth: usize,
) -> Result<T, GobError> {
    let mut stream = GobStreamDecoder::nested(blob, limits, depth)?;
    T::decode_blob(&mut stream)
}

pub fn encode_opaque<T: OpaqueCodec>(
    value: &T,
    values: &mut ValueEncoder<'_>,
) -> Result<(), GobError> {
    values.write_bytes(&encode_blob(value)?);
    Ok(())
}

pub fn opaque_wire_type<T: OpaqueCodec>(registry: &mut TypeRegistry) -> TypeId {
    registry.opaque::<T>(T::NAME, OpaqueFlavor::GobEncoder)
}

/// Decodes a standalone blob, as found inside an opaque value.
pub fn decode_blob<T: OpaqueCodec>(blob: &[u8]) -> Result<T, GobError> {
    decode_blob_at(blob, DecodeLimits::default(), 0)
}

/// Produces the blob an opaque value carries for `value`.
pub fn encode_blob<T: OpaqueCodec>(value: &T) -> Result<Vec<u8>, GobError> {
    let mut stream = GobStreamEncoder::new(Vec::new());
    value.encode_blob(&mut stream)?;
    Ok(stream.into_inner())
}
