//! Gob primitive decoder (no type information).
//!
//! Encoding rules:
//! - uint: values below 128 in one byte, otherwise a byte holding the
//!   negated length followed by the big-endian bytes
//! - int: `i << 1` for non-negative values, `(!i << 1) | 1` otherwise, as uint
//! - bool: uint 0 or 1
//! - float: IEEE 754 float64 bits, byte-reversed, as uint
//! - bytes/string: uint length + raw bytes

use std::io::{self, Read};

use tfplan_buffers::{BufferError, Reader};

use crate::GobError;

/// Gob primitive decoder over the current message body.
///
/// A value normally lives in one message, but a producer that has to define
/// a type from inside an interface value flushes the partial value first, so
/// the buffer can be swapped for the next message with [`GobDecoder::refill`].
#[derive(Debug, Default)]
pub struct GobDecoder {
    data: Vec<u8>,
    x: usize,
}

impl GobDecoder {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, x: 0 }
    }

    /// Replaces the exhausted buffer with the next message body.
    pub fn refill(&mut self, data: Vec<u8>) {
        self.data = data;
        self.x = 0;
    }

    /// Bytes left in the message.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.x
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read<T>(
        &mut self,
        f: impl FnOnce(&mut Reader<'_>) -> Result<T, BufferError>,
    ) -> Result<T, GobError> {
        let mut reader = Reader {
            uint8: &self.data,
            x: self.x,
        };
        let out = f(&mut reader)?;
        self.x = reader.x;
        Ok(out)
    }

    pub fn read_uint(&mut self) -> Result<u64, GobError> {
        let first = self.read(|r| r.try_u8())?;
        if first <= 0x7f {
            return Ok(u64::from(first));
        }
        let width = uint_width(first)?;
        self.read(|r| r.try_be_uint(width))
    }

    pub fn read_int(&mut self) -> Result<i64, GobError> {
        Ok(unzigzag(self.read_uint()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, GobError> {
        Ok(self.read_uint()? != 0)
    }

    pub fn read_float(&mut self) -> Result<f64, GobError> {
        Ok(f64::from_bits(self.read_uint()?.swap_bytes()))
    }

    /// Reads the length of a byte string. The bytes always follow in the same
    /// message, so a length larger than the rest of the message can only come
    /// from a corrupt prefix.
    pub fn read_len(&mut self) -> Result<usize, GobError> {
        let len = self.read_uint()?;
        let remaining = self.remaining();
        if len > remaining as u64 {
            return Err(GobError::malformed(format!(
                "length prefix {len} exceeds the {remaining} bytes left in the message"
            )));
        }
        Ok(len as usize)
    }

    pub fn read_bytes(&mut self) -> Result<&[u8], GobError> {
        let len = self.read_len()?;
        let start = self.x;
        self.read(|r| r.try_skip(len))?;
        Ok(&self.data[start..start + len])
    }

    pub fn read_string(&mut self) -> Result<String, GobError> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| GobError::malformed("invalid UTF-8 in string"))
    }

    pub fn skip_bytes(&mut self) -> Result<(), GobError> {
        let len = self.read_len()?;
        self.skip(len)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), GobError> {
        self.read(|r| r.try_skip(len))
    }
}

/// Number of payload bytes announced by a multi-byte uint prefix.
fn uint_width(first: u8) -> Result<usize, GobError> {
    let width = usize::from((first as i8).unsigned_abs());
    if width > 8 {
        return Err(GobError::malformed(format!(
            "invalid unsigned integer length byte 0x{first:02x}"
        )));
    }
    Ok(width)
}

pub(crate) fn unzigzag(x: u64) -> i64 {
    let i = (x >> 1) as i64;
    if x & 1 != 0 {
        !i
    } else {
        i
    }
}

/// Reads one uint straight from a byte source.
///
/// Returns `None` when the source is exhausted before the first byte.
pub fn read_uint_from<R: Read + ?Sized>(source: &mut R) -> Result<Option<u64>, GobError> {
    let mut first = [0u8; 1];
    loop {
        match source.read(&mut first) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if first[0] <= 0x7f {
        return Ok(Some(u64::from(first[0])));
    }
    let width = uint_width(first[0])?;
    let mut buf = [0u8; 8];
    source.read_exact(&mut buf[..width])?;
    Ok(Some(
        buf[..width]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
    ))
}

/// Moves from field number `last` by `delta`, checking the result against
/// the number of fields the struct declares.
pub(crate) fn advance_field(last: i64, delta: u64, count: usize) -> Result<usize, GobError> {
    let next = i64::try_from(delta)
        .ok()
        .and_then(|delta| last.checked_add(delta))
        .filter(|next| (0..count as i64).contains(next))
        .ok_or_else(|| {
            GobError::malformed(format!(
                "field delta {delta} after field {last} is out of range for a struct with {count} fields"
            ))
        })?;
    Ok(next as usize)
}
