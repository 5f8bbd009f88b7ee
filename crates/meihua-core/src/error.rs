//! Error types for derivation, knowledge-base construction and the data store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while deriving a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DivinationError {
    /// One of the three inputs is zero or negative.
    #[error("input #{index} must be a positive integer, got {value}")]
    InvalidInput { index: usize, value: i64 },

    /// A trigram selector outside 1..=8 reached the trigram table.
    #[error("trigram selector {0} is outside 1..=8")]
    InvalidSelector(u64),

    /// A line position outside 1..=6 reached the line flip.
    #[error("line position {0} is outside 1..=6")]
    InvalidLinePosition(u64),

    /// A hexagram code that is not six '0'/'1' characters.
    #[error("malformed hexagram code {0:?}")]
    MalformedCode(String),

    #[error("no hexagram with binary code {0}")]
    HexagramNotFound(String),

    #[error("no line {line} on hexagram #{hexagram}")]
    LineNotFound { hexagram: u8, line: u8 },
}

/// Integrity violations found while building a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnowledgeBaseError {
    #[error("hexagram {id} has ordinal position {position}, expected 1..=64")]
    PositionOutOfRange { id: String, position: u8 },

    #[error("hexagram {id} has malformed binary code {code:?}")]
    MalformedCode { id: String, code: String },

    #[error("binary code {code} is used by both {first} and {second}")]
    DuplicateCode {
        code: String,
        first: String,
        second: String,
    },

    #[error("ordinal position {position} is used by both {first} and {second}")]
    DuplicatePosition {
        position: u8,
        first: String,
        second: String,
    },

    #[error("line {id} has position {position}, expected 1..=6 (7 only on uniform hexagrams)")]
    LinePositionOutOfRange { id: String, position: u8 },

    #[error("line {id} belongs to hexagram #{hexagram}, which does not exist")]
    OrphanLine { id: String, hexagram: u8 },

    #[error("line {line} of hexagram #{hexagram} is defined by both {first} and {second}")]
    DuplicateLine {
        hexagram: u8,
        line: u8,
        first: String,
        second: String,
    },
}

/// Errors from reading or writing the reference-data directory.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Integrity(#[from] KnowledgeBaseError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

pub type DivinationResult<T> = Result<T, DivinationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = DivinationError::InvalidInput { index: 1, value: -3 };
        assert_eq!(err.to_string(), "input #1 must be a positive integer, got -3");

        let err = DivinationError::HexagramNotFound("010101".into());
        assert_eq!(err.to_string(), "no hexagram with binary code 010101");

        let err = DivinationError::LineNotFound {
            hexagram: 12,
            line: 4,
        };
        assert_eq!(err.to_string(), "no line 4 on hexagram #12");
    }

    #[test]
    fn integrity_errors_pass_through_store_error() {
        let err: StoreError = KnowledgeBaseError::OrphanLine {
            id: "yao-1".into(),
            hexagram: 65,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "line yao-1 belongs to hexagram #65, which does not exist"
        );
    }
}
