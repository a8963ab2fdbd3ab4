//! Stream-level decoder and encoder.

use std::io::{Read, Write};

use tracing::trace;

use crate::catalog::write_wire_type;
use crate::record::{Decode, Encode};
use crate::registry::{TypeRegistry, ValueEncoder};
use crate::types::{Descriptor, TypeId};
use crate::value::{read_type_sequence, Session, ValueDecoder};
use crate::{DecodeLimits, GobDecoder, GobEncoder, GobError, WireTypeCatalog};

/// Reads values from a gob stream.
///
/// Each decoder owns the type catalog of its stream; ids are meaningless
/// outside of it.
pub struct GobStreamDecoder<R> {
    source: R,
    dec: GobDecoder,
    session: Session,
    base_depth: usize,
}

impl<R: Read> GobStreamDecoder<R> {
    pub fn new(source: R) -> Self {
        Self::with_limits(source, DecodeLimits::default())
    }

    pub fn with_limits(source: R, limits: DecodeLimits) -> Self {
        Self {
            source,
            dec: GobDecoder::default(),
            session: Session::new(limits),
            base_depth: 0,
        }
    }

    /// A decoder for a stream embedded `depth` levels deep in another one.
    pub fn nested(source: R, limits: DecodeLimits, depth: usize) -> Result<Self, GobError> {
        if depth > limits.max_depth {
            return Err(GobError::malformed(format!(
                "value nesting exceeds the limit of {}",
                limits.max_depth
            )));
        }
        let mut stream = Self::with_limits(source, limits);
        stream.base_depth = depth;
        Ok(stream)
    }

    fn next_value(&mut self) -> Result<Descriptor, GobError> {
        // Whatever is left of the previous message is dropped.
        self.dec.refill(Vec::new());
        let id: TypeId =
            read_type_sequence(&mut self.dec, &mut self.session, &mut self.source, false)?;
        trace!(id, "value follows");
        self.session.catalog().resolve(id)
    }

    /// Reads type definitions up to the next value and decodes it into `T`.
    pub fn decode<T: Decode>(&mut self) -> Result<T, GobError> {
        let wire = self.next_value()?;
        let root = match &wire {
            Descriptor::Defined(defined) => defined.name.clone(),
            Descriptor::Builtin(_) => String::new(),
        };
        let located = |e: GobError| if root.is_empty() { e } else { e.within(&root) };
        T::check_wire(&mut self.session, &wire).map_err(located)?;
        let mut values = ValueDecoder::new(
            &mut self.dec,
            &mut self.session,
            &mut self.source,
            self.base_depth,
        );
        if !wire.is_struct() {
            values.expect_singleton()?;
        }
        T::decode(&mut values, &wire).map_err(located)
    }

    /// Reads and discards the next value.
    pub fn skip_value(&mut self) -> Result<(), GobError> {
        let wire = self.next_value()?;
        let mut values = ValueDecoder::new(
            &mut self.dec,
            &mut self.session,
            &mut self.source,
            self.base_depth,
        );
        if !wire.is_struct() {
            values.expect_singleton()?;
        }
        values.skip_value(&wire)
    }

    pub fn catalog(&self) -> &WireTypeCatalog {
        self.session.catalog()
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Writes values as a gob stream.
///
/// Every value message is preceded by the definitions of the types it
/// introduces; types already sent on this stream are not repeated.
pub struct GobStreamEncoder<W> {
    sink: W,
    registry: TypeRegistry,
}

impl<W: Write> GobStreamEncoder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            registry: TypeRegistry::new(),
        }
    }

    pub fn encode<T: Encode>(&mut self, value: &T) -> Result<(), GobError> {
        let id = T::wire_type(&mut self.registry)?;
        let mut values = ValueEncoder::new(&mut self.registry);
        values.write_int(i64::from(id));
        if !values.registry().is_struct(id) {
            values.write_uint(0);
        }
        value.encode(&mut values)?;
        let body = values.finish();
        for wire in self.registry.take_pending()? {
            let mut enc = GobEncoder::new();
            enc.write_int(-i64::from(wire.id));
            write_wire_type(&mut enc, &wire);
            self.write_message(&enc.writer.flush())?;
        }
        self.write_message(&body)
    }

    fn write_message(&mut self, body: &[u8]) -> Result<(), GobError> {
        let mut frame = GobEncoder::new();
        frame.write_uint(body.len() as u64);
        self.sink.write_all(frame.writer.as_slice())?;
        self.sink.write_all(body)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Encodes `value` as a complete single-value stream.
pub fn to_bytes<T: Encode>(value: &T) -> Result<Vec<u8>, GobError> {
    let mut stream = GobStreamEncoder::new(Vec::new());
    stream.encode(value)?;
    Ok(stream.into_inner())
}

/// Decodes the first value of a stream held in memory.
pub fn from_slice<T: Decode>(bytes: &[u8]) -> Result<T, GobError> {
    GobStreamDecoder::new(bytes).decode()
}
