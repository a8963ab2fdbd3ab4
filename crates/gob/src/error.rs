//! Gob codec error type.

use std::io;

use tfplan_buffers::BufferError;
use thiserror::Error;

/// Error type for gob stream decoding and encoding.
#[derive(Debug, Error)]
pub enum GobError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed gob stream: {0}")]
    Malformed(String),
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    SchemaMismatch {
        /// Dotted path from the top-level value to the offending field.
        path: String,
        expected: String,
        found: String,
    },
    #[error("cannot encode value: {0}")]
    Unencodable(String),
}

impl From<BufferError> for GobError {
    fn from(_: BufferError) -> Self {
        GobError::Malformed("unexpected end of message".to_string())
    }
}

impl GobError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        GobError::Malformed(msg.into())
    }

    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        GobError::SchemaMismatch {
            path: String::new(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Prefixes the path of a schema mismatch with `segment`.
    ///
    /// Other variants pass through untouched.
    pub fn within(self, segment: &str) -> Self {
        match self {
            GobError::SchemaMismatch {
                path,
                expected,
                found,
            } => {
                let path = if path.is_empty() {
                    segment.to_string()
                } else if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                GobError::SchemaMismatch {
                    path,
                    expected,
                    found,
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_builds_dotted_paths() {
        let err = GobError::mismatch("int", "string")
            .within("Version")
            .within("[2]")
            .within("Modules")
            .within("State");
        match err {
            GobError::SchemaMismatch { path, .. } => assert_eq!(path, "State.Modules[2].Version"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn within_ignores_other_variants() {
        let err = GobError::malformed("bad").within("Field");
        assert!(matches!(err, GobError::Malformed(ref m) if m == "bad"));
    }
}
