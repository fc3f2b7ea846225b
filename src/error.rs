//! Error types for building, importing and driving DDG trees.

use thiserror::Error;

/// Broad category of a [`FldrError`].
///
/// Everything is detected synchronously while a tree is built or imported;
/// sampling itself has no error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-domain input.
    InvalidArgument,
    /// A real weight has no exact finite binary expansion.
    Domain,
    /// An arithmetic consistency check failed inside the builder. This is a
    /// defect, not a user error; do not retry.
    InternalInvariant,
    /// A serialized structure could not be read back.
    Format,
}

#[derive(Debug, Error)]
pub enum FldrError {
    #[error("weights slice is empty")]
    Empty,

    #[error("weight at index {index} is zero")]
    ZeroWeight { index: usize },

    #[error("weight at index {index} is not positive: {value}")]
    NonPositive { index: usize, value: f64 },

    #[error("total weight overflows u64")]
    Overflow,

    #[error("bits per word must be in 1..=32, got {0}")]
    WordBits(u32),

    #[error("weight at index {index} is not exactly representable: {value}")]
    Domain { index: usize, value: f64 },

    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),

    #[error("malformed structure at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FldrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FldrError::Empty
            | FldrError::ZeroWeight { .. }
            | FldrError::NonPositive { .. }
            | FldrError::Overflow
            | FldrError::WordBits(_) => ErrorKind::InvalidArgument,
            FldrError::Domain { .. } => ErrorKind::Domain,
            FldrError::Invariant(_) => ErrorKind::InternalInvariant,
            FldrError::Parse { .. } | FldrError::Io(_) => ErrorKind::Format,
        }
    }

    /// Attach the weight's position to a per-weight error.
    pub(crate) fn with_index(self, at: usize) -> Self {
        match self {
            FldrError::ZeroWeight { .. } => FldrError::ZeroWeight { index: at },
            FldrError::NonPositive { value, .. } => FldrError::NonPositive { index: at, value },
            FldrError::Domain { value, .. } => FldrError::Domain { index: at, value },
            other => other,
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        FldrError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, FldrError>;
