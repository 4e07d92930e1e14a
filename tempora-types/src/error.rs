use thiserror::Error;

/// Errors raised while building or combining the primitive types of this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error("empty {0}")]
    Empty(&'static str),

    #[error("operands share no dimension")]
    NoSharedDimension,

    #[error("spatial reference mismatch: SRID {0} vs {1}")]
    SridMismatch(i32, i32),

    #[error("cannot mix geodetic and planar coordinates")]
    GeodeticMismatch,

    #[error("cannot combine {0} and {1} boxes")]
    IncompatibleBoxes(&'static str, &'static str),
}
