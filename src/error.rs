//! Error types for dicoterm

use thiserror::Error;

/// Main error type for dictionary storage and term resolution
#[derive(Error, Debug)]
pub enum DicoError {
    #[error("Store not initialized or opened in the wrong mode")]
    NotInitialized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Corrupt store: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Invalid shard key: {0}")]
    InvalidShardKey(String),

    #[error("Broken chain: walk from {from} stopped at missing node {at}")]
    BrokenChain { from: String, at: String },

    #[error("Hop limit exceeded: walk from {from} to {to} exceeded {limit} hops")]
    HopLimitExceeded {
        from: String,
        to: String,
        limit: usize,
    },

    #[error("Cycle detected in ontology graph at {0}")]
    CycleDetected(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation aborted")]
    Aborted,
}

/// Result type alias for dicoterm operations
pub type Result<T> = std::result::Result<T, DicoError>;

impl From<rmp_serde::encode::Error> for DicoError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        DicoError::Codec(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for DicoError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        DicoError::Codec(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DicoError::NotInitialized.to_string(),
            "Store not initialized or opened in the wrong mode"
        );
        assert_eq!(
            DicoError::NotFound("o42".to_string()).to_string(),
            "Not found: o42"
        );
        assert_eq!(
            DicoError::CycleDetected("GO:0000001".to_string()).to_string(),
            "Cycle detected in ontology graph at GO:0000001"
        );

        let broken = DicoError::BrokenChain {
            from: "o9606".to_string(),
            at: "o9605".to_string(),
        };
        assert!(broken.to_string().contains("o9605"));

        let hops = DicoError::HopLimitExceeded {
            from: "o2".to_string(),
            to: "o1".to_string(),
            limit: 64,
        };
        assert!(hops.to_string().contains("64 hops"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: DicoError = io_err.into();

        match err {
            DicoError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }
}
