//! Error types for enumeration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("Invalid arity {arity} for operator '{name}': must be >= 1")]
    InvalidArity { name: String, arity: usize },
    #[error("Invalid base {base}: must be >= 1")]
    InvalidBase { base: u32 },
    #[error("{what} {value} out of range (bound: {bound})")]
    OutOfRange {
        what: &'static str,
        value: String,
        bound: String,
    },
    #[error("Unsupported primitive set: {reason}")]
    Unsupported { reason: String },
    #[error("Primitive '{name}' is already registered as {kind}")]
    DuplicatePrimitive { name: String, kind: String },
    #[error("Arithmetic overflow while computing {what}")]
    Overflow { what: &'static str },
    #[error("Cannot parse '{input}' at position {position}: {reason}")]
    Parse {
        input: String,
        position: usize,
        reason: String,
    },
    #[error("Unknown {kind} '{name}'")]
    UnknownPrimitive { name: String, kind: String },
    #[error("Snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EnumerationError {
    pub(crate) fn out_of_range(
        what: &'static str,
        value: impl ToString,
        bound: impl ToString,
    ) -> Self {
        EnumerationError::OutOfRange {
            what,
            value: value.to_string(),
            bound: bound.to_string(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        EnumerationError::Unsupported { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, EnumerationError>;
