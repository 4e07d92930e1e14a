//! An algebra of temporal values: base values annotated with their evolution over time.
//!
//! ```rust
//! use tempora::{Instant, Interpolation, NumericRange, Sequence, Temporal, Timestamp, Value};
//!
//! let t = Timestamp::from_secs;
//! let temperature = Temporal::from(Sequence::make(
//!     vec![Instant::new(2.0, t(0))?, Instant::new(8.0, t(60))?],
//!     true,
//!     true,
//!     Interpolation::Linear,
//!     true,
//! )?);
//!
//! // when was it between 4 and 6 degrees?
//! let mild = temperature.at_range(&NumericRange::closed(4.0, 6.0).unwrap()).unwrap();
//! assert_eq!(mild.start_timestamp(), t(20));
//! assert_eq!(mild.end_timestamp(), t(40));
//! assert_eq!(mild.value_at(t(30)), Some(Value::Float(5.0)));
//! # Ok::<(), tempora::TemporalError>(())
//! ```

pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod storage;
pub mod temporal;
pub mod validation;

pub use config::Config;
pub use error::{Result, TemporalError};

pub use temporal::instant::Instant;
pub use temporal::instant_set::InstantSet;
pub use temporal::sequence::Sequence;
pub use temporal::sequence_set::SequenceSet;
pub use temporal::{Granularity, Interpolation, Temporal};

pub use compute::lifting::{LiftedFunction, lift_base, lift_temporal, map_values};
pub use compute::ops::{ArithmeticOp, Comparison};
pub use compute::restrict::NumericRange;
pub use compute::sync::synchronize;

pub use index::TemporalIndex;
pub use validation::{ConfigValidator, DefaultValidator, ValueValidator};

pub use tempora_types::TypeError;
pub use tempora_types::bbox::{BoundingBox, STBox, SpaceExtent, Span, TBox, TimeSpan};
pub use tempora_types::point::GeoPoint;
pub use tempora_types::time::{Period, PeriodSet, Timestamp, TimestampSet};
pub use tempora_types::value::{BaseKind, Value};

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Result, TemporalError};

    pub use crate::{Granularity, Instant, InstantSet, Interpolation, Sequence, SequenceSet, Temporal};

    pub use crate::{BaseKind, GeoPoint, Value};

    pub use crate::{Period, PeriodSet, Timestamp, TimestampSet};

    pub use crate::{BoundingBox, STBox, TBox};

    pub use crate::compute::ops::{ArithmeticOp, Comparison};
    pub use crate::{LiftedFunction, NumericRange, synchronize};

    pub use crate::{Config, ConfigValidator, ValueValidator};
}
