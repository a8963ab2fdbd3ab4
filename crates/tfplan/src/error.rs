//! Failures reported while loading a plan.

use std::io;

use tfplan_gob::GobError;
use thiserror::Error;

/// Error type for [`load`](crate::load).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("not a valid plan file")]
    BadMagic,
    #[error("plan file ends before the version byte")]
    TruncatedHeader,
    #[error("unsupported plan file version {byte}")]
    UnsupportedVersion { byte: u8 },
    #[error("malformed plan stream: {0}")]
    MalformedStream(String),
    #[error("plan does not match the expected schema at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },
}

impl From<GobError> for LoadError {
    fn from(err: GobError) -> Self {
        match err {
            GobError::Io(e) => LoadError::Io(e),
            GobError::Malformed(msg) | GobError::Unencodable(msg) => LoadError::MalformedStream(msg),
            GobError::SchemaMismatch {
                path,
                expected,
                found,
            } => LoadError::SchemaMismatch {
                path,
                expected,
                found,
            },
        }
    }
}
