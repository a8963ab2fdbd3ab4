//! Byte buffers for the plan codecs.
//!
//! [`Reader`] is a cursor over a borrowed slice whose reads fail with
//! [`BufferError::EndOfBuffer`] instead of panicking, and [`Writer`] is an
//! append-only buffer that hands its contents out with [`Writer::flush`].

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error type for buffer reads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
}
