//! Gob primitive encoder (no type information).

use tfplan_buffers::Writer;

/// Gob primitive encoder.
#[derive(Debug, Default)]
pub struct GobEncoder {
    pub writer: Writer,
}

impl GobEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_uint(&mut self, x: u64) {
        if x <= 0x7f {
            self.writer.u8(x as u8);
            return;
        }
        let bytes = x.to_be_bytes();
        let skip = (x.leading_zeros() / 8) as usize;
        let width = (bytes.len() - skip) as i8;
        self.writer.u8(width.wrapping_neg() as u8);
        self.writer.buf(&bytes[skip..]);
    }

    pub fn write_int(&mut self, i: i64) {
        let x = if i < 0 {
            ((!i as u64) << 1) | 1
        } else {
            (i as u64) << 1
        };
        self.write_uint(x);
    }

    pub fn write_bool(&mut self, b: bool) {
        self.write_uint(u64::from(b));
    }

    pub fn write_float(&mut self, f: f64) {
        self.write_uint(f.to_bits().swap_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.write_uint(data.len() as u64);
        self.writer.buf(data);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }
}

/// Tracks the previous field number while writing one struct value.
#[derive(Debug, Clone, Copy)]
pub struct FieldDeltas {
    last: i64,
}

impl Default for FieldDeltas {
    fn default() -> Self {
        Self { last: -1 }
    }
}

impl FieldDeltas {
    /// Writes the delta that moves to field `index`. Fields must be
    /// announced in increasing order.
    pub fn field(&mut self, enc: &mut GobEncoder, index: usize) {
        let index = index as i64;
        enc.write_uint((index - self.last) as u64);
        self.last = index;
    }

    /// Writes the struct terminator.
    pub fn end(self, enc: &mut GobEncoder) {
        enc.write_uint(0);
    }
}
