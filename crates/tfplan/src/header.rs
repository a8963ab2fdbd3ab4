//! Fixed plan file prefix.

use std::io::{self, Read};

use crate::LoadError;

/// The six bytes every plan file starts with.
pub const PLAN_MAGIC: &[u8; 6] = b"tfplan";

/// The header of a plan file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEnvelope {
    /// Always [`PLAN_MAGIC`] once read.
    pub magic: [u8; 6],
    pub version: u8,
}

/// Reads until `buf` is full or the source is exhausted.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match source.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(read) => n += read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}

/// Consumes the magic and the version byte from `source`.
pub fn read_header<R: Read>(source: &mut R) -> Result<PlanEnvelope, LoadError> {
    let mut magic = [0u8; 6];
    let n = read_full(source, &mut magic)?;
    if n < magic.len() || &magic != PLAN_MAGIC {
        return Err(LoadError::BadMagic);
    }
    let mut version = [0u8; 1];
    if read_full(source, &mut version)? == 0 {
        return Err(LoadError::TruncatedHeader);
    }
    Ok(PlanEnvelope {
        magic,
        version: version[0],
    })
}
