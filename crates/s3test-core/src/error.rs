// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types for target resolution and run configuration.

use thiserror::Error;

/// A specialized `Result` type for s3test-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a run before any case executes.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed target spec, missing profile or invalid configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// A quirk name that is not part of the registry.
    #[error("unknown quirk: {0}")]
    UnknownQuirk(String),

    /// An include or exclude pattern that is not a valid regular expression.
    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        /// The pattern as given on the command line.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if this error came from a malformed target or configuration.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UnknownQuirk(_) | Self::InvalidPattern { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing bucket");
        assert_eq!(err.to_string(), "configuration error: missing bucket");
        assert!(err.is_configuration());

        let err = Error::UnknownQuirk("NOPE".to_string());
        assert_eq!(err.to_string(), "unknown quirk: NOPE");
    }

    #[test]
    fn test_io_error_is_not_configuration() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!err.is_configuration());
    }
}
