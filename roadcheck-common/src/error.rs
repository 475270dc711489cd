//! Error types for the roadcheck toolkit
//!
//! Only structural problems surface as errors: an inconsistent snapshot, an
//! unreadable configuration, or a lookup for an element that is not in the
//! graph. Bad tag data on otherwise valid elements is reported as a finding by
//! the analyzers, never as an `Error`.

use thiserror::Error;

/// Main error type for roadcheck operations
#[derive(Error, Debug)]
pub enum Error {
    /// A node id was requested that the graph does not contain
    #[error("Node {0} is not part of the snapshot")]
    UnknownNode(i64),

    /// A way id was requested that the graph does not contain
    #[error("Way {0} is not part of the snapshot")]
    UnknownWay(i64),

    /// The snapshot handed over by the host is internally inconsistent
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for roadcheck operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors caused by the caller asking about elements that do not
    /// exist, as opposed to bad input data.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Error::UnknownNode(_) | Error::UnknownWay(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::UnknownNode(42).to_string(),
            "Node 42 is not part of the snapshot"
        );
        assert_eq!(
            Error::InvalidSnapshot("way 7 references missing node 3".to_string()).to_string(),
            "Invalid snapshot: way 7 references missing node 3"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.toml");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(!err.is_lookup_failure());
        assert!(Error::UnknownWay(1).is_lookup_failure());
    }
}
