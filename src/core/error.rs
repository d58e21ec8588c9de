//! Error types for the testlens library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using testlens's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading a source file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source file does not exist.
    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Source could not be parsed as Python.
    #[error("Syntax error in {path}: {message}")]
    InputSyntaxInvalid { path: PathBuf, message: String },

    /// Internal failure while scoring. Never escapes the score entry points;
    /// it is folded into a degraded outcome there.
    #[error("Computation degraded: {message}")]
    ComputationDegraded { message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a syntax error for the given path.
    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InputSyntaxInvalid {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a degraded computation error.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self::ComputationDegraded {
            message: message.into(),
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::degraded("metric accuracy is NaN");
        assert_eq!(
            err.to_string(),
            "Computation degraded: metric accuracy is NaN"
        );

        let err = Error::InputNotFound {
            path: PathBuf::from("missing.py"),
        };
        assert_eq!(err.to_string(), "Input not found: missing.py");
    }

    #[test]
    fn test_syntax_error() {
        let err = Error::syntax("bad.py", "unexpected token at line 3");
        match err {
            Error::InputSyntaxInvalid { path, message } => {
                assert_eq!(path, PathBuf::from("bad.py"));
                assert_eq!(message, "unexpected token at line 3");
            }
            _ => panic!("Expected InputSyntaxInvalid"),
        }
    }
}
