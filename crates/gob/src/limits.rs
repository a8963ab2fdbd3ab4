//! Resource bounds applied while decoding untrusted streams.

/// Limits applied to a single decode call.
///
/// Nesting depth counts structs, collections, interface values and nested
/// opaque blobs together, so a deeply nested configuration tree is bounded
/// the same way as a deeply nested map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Largest accepted message body, in bytes.
    pub max_message_len: usize,
    /// Deepest accepted value nesting.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_message_len: 1 << 30,
            max_depth: 128,
        }
    }
}

impl DecodeLimits {
    pub fn with_max_message_len(mut self, max_message_len: usize) -> Self {
        self.max_message_len = max_message_len;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
