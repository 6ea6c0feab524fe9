//! Error types shared across the workspace.

use thiserror::Error;

/// Result alias using the Rulegauge [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the Rulegauge engine.
///
/// Configuration errors are fatal and reported immediately. A pattern
/// that simply yields no candidates is a normal outcome and never
/// surfaces here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid caller-supplied configuration, e.g. a corrupted variable
    /// that is not an endpoint of the head atom.
    #[error("configuration error: {0}")]
    Config(String),
    /// Internal consistency violation. These indicate programming bugs,
    /// never valid statistical outcomes.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("corrupted variable ?3 not found in head");
        assert!(err.to_string().contains("configuration error"));

        let err = Error::internal("duplicate code entry");
        assert!(err.to_string().contains("internal error"));
    }
}
