//! Error types for merkledoc.
//!
//! The core distinguishes four failure kinds:
//! - malformed input (documents the front-end parser rejects)
//! - invalid arguments (out-of-range proof parameters and similar)
//! - lookups that miss (proving a path the document does not contain)
//! - internal invariant violations
//!
//! Verification mismatches are not errors: verifiers return `false`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type MerkledocResult<T> = Result<T, MerkledocError>;

#[derive(Debug, Error)]
pub enum MerkledocError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl MerkledocError {
    pub fn malformed_input(msg: impl Into<String>) -> Self {
        MerkledocError::MalformedInput(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        MerkledocError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        MerkledocError::NotFound(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        MerkledocError::Invariant(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_kind() {
        let e = MerkledocError::not_found("path $.a");
        assert!(e.to_string().contains("not found"));
        let e = MerkledocError::invalid_argument("old_size out of range");
        assert!(e.to_string().contains("invalid argument"));
    }
}
