//! Binary buffer writer with auto-growing capacity.

/// An append-only binary buffer.
///
/// # Example
///
/// ```
/// use tfplan_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.buf(&[0x02, 0x03]);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x02, 0x03]);
/// assert!(writer.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    uint8: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.uint8.is_empty()
    }

    /// Bytes written since the last flush.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    /// Returns the written data and empties the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn buf(&mut self, data: &[u8]) {
        self.uint8.extend_from_slice(data);
    }
}
