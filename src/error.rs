//! Error Types
//!
//! All fallible operations in this crate return [`RnnError`]. The variants
//! map onto four failure classes with different recovery policies:
//!
//! - **Configuration** (`Config`, `CorpusTooShort`): fatal, reported before
//!   any work starts. A zero-sized hidden layer or a corpus shorter than one
//!   training sequence cannot produce a usable model.
//! - **Input validation** (`IndexOutOfRange`): scoped to a single step. The
//!   trainer logs and skips the offending step; standalone `forward`/
//!   `backward` calls fail.
//! - **Persistence mismatch** (`ShapeMismatch`, `Io`, `Json`): recoverable.
//!   Loading incompatible weights leaves the live parameters untouched, and
//!   the error carries expected vs. found shapes so the mismatch can be
//!   diagnosed without reading source.
//! - **Divergence** is not an error variant: training that exceeds the loss
//!   threshold stops early and reports it in the training summary.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RnnError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("symbol index {index} out of range [0, {vocab_size})")]
    IndexOutOfRange { index: usize, vocab_size: usize },

    #[error("weight shape mismatch for {tensor}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        tensor: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("corpus too short: {len} symbols, need at least {needed}")]
    CorpusTooShort { len: usize, needed: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RnnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RnnError::IndexOutOfRange {
            index: 9,
            vocab_size: 4,
        };
        assert!(err.to_string().contains("out of range [0, 4)"));

        let err = RnnError::ShapeMismatch {
            tensor: "wxh",
            expected: vec![16, 42],
            found: vec![16, 40],
        };
        assert!(err.to_string().contains("wxh"));
        assert!(err.to_string().contains("[16, 42]"));

        let err = RnnError::CorpusTooShort { len: 5, needed: 17 };
        assert!(err.to_string().contains("need at least 17"));
    }
}
