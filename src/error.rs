//! Error types for tempora.

use tempora_types::TypeError;
use tempora_types::time::Timestamp;
use tempora_types::value::BaseKind;
use thiserror::Error;

/// Result type alias using tempora's error.
pub type Result<T> = std::result::Result<T, TemporalError>;

/// Main error type for temporal value construction and algebra.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemporalError {
    /// A collection was built from no elements.
    #[error("cannot build a temporal value from an empty input")]
    EmptyInput,

    /// Timestamps are not strictly increasing where they must be.
    #[error("timestamps must be strictly increasing: {prev} is not before {next}")]
    UnorderedTimestamps { prev: Timestamp, next: Timestamp },

    /// Two instants at the same time carry different values.
    #[error("conflicting instant at same time {0}")]
    ConflictingInstant(Timestamp),

    /// Bound flags are inconsistent with the instants.
    #[error("inconsistent bounds: {0}")]
    InconsistentBounds(String),

    /// A value failed base-type validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Instants of one collection disagree on base kind, SRID, z or geodetic flag.
    #[error("mixed dimensionality: {0}")]
    MixedDimensions(String),

    /// Sequences of a sequence set overlap in time.
    #[error("sequences overlap in time at {0}")]
    OverlappingSequences(Timestamp),

    /// The operation requires operands that agree on interpolation or base kind.
    #[error("incompatible operands: {0}")]
    IncompatibleOperands(String),

    /// The value's base kind is not supported by the operation.
    #[error("operation not defined for base kind {0}")]
    UnsupportedKind(BaseKind),

    /// Invalid argument built from the primitive types.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Binary data does not follow the packed layout.
    #[error("invalid binary layout: {0}")]
    InvalidFormat(String),

    /// Binary data ended before the value was complete.
    #[error("unexpected end of data")]
    UnexpectedEof,

    /// Serde-based snapshot encoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration did not pass validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
