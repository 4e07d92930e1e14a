//! Temporal values: a base value varying over time at one of four granularities.
//!
//! # Examples
//!
//! ```
//! use tempora::{Instant, Interpolation, Sequence, Temporal, Timestamp, Value};
//!
//! let t = Timestamp::from_secs;
//! let speed = Temporal::from(Sequence::make(
//!     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
//!     true,
//!     true,
//!     Interpolation::Linear,
//!     true,
//! )?);
//! assert_eq!(speed.value_at(t(5)), Some(Value::Float(5.0)));
//! assert_eq!(speed.num_instants(), 2);
//! # Ok::<(), tempora::TemporalError>(())
//! ```

pub mod instant;
pub mod instant_set;
pub(crate) mod segment;
pub mod sequence;
pub mod sequence_set;

use crate::error::{Result, TemporalError};
use instant::Instant;
use instant_set::InstantSet;
use rustc_hash::FxHasher;
use sequence::Sequence;
use sequence_set::SequenceSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use tempora_types::bbox::BoundingBox;
use tempora_types::time::{Period, PeriodSet, Timestamp};
use tempora_types::value::{BaseKind, Value};

/// How values evolve between consecutive instants of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Constant until the next instant
    Step,
    /// Straight line to the next instant
    Linear,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Step => write!(f, "step"),
            Interpolation::Linear => write!(f, "linear"),
        }
    }
}

/// The structural shape of a temporal value, ordered from least to most general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Instant,
    InstantSet,
    Sequence,
    SequenceSet,
}

impl Granularity {
    pub fn tag(self) -> u8 {
        match self {
            Granularity::Instant => 1,
            Granularity::InstantSet => 2,
            Granularity::Sequence => 3,
            Granularity::SequenceSet => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Granularity::Instant),
            2 => Some(Granularity::InstantSet),
            3 => Some(Granularity::Sequence),
            4 => Some(Granularity::SequenceSet),
            _ => None,
        }
    }

    /// Values are defined over intervals, not only at isolated timestamps.
    pub fn is_continuous(self) -> bool {
        matches!(self, Granularity::Sequence | Granularity::SequenceSet)
    }
}

/// A temporal value of any granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Temporal {
    Instant(Instant),
    InstantSet(InstantSet),
    Sequence(Sequence),
    SequenceSet(SequenceSet),
}

impl From<Instant> for Temporal {
    fn from(inst: Instant) -> Self {
        Temporal::Instant(inst)
    }
}

impl From<InstantSet> for Temporal {
    fn from(set: InstantSet) -> Self {
        Temporal::InstantSet(set)
    }
}

impl From<Sequence> for Temporal {
    fn from(seq: Sequence) -> Self {
        Temporal::Sequence(seq)
    }
}

impl From<SequenceSet> for Temporal {
    fn from(set: SequenceSet) -> Self {
        Temporal::SequenceSet(set)
    }
}

impl Temporal {
    /// Wraps restriction or lifting pieces: one piece stays a sequence unless
    /// a sequence set is requested.
    pub(crate) fn from_pieces(pieces: Vec<Sequence>, as_set: bool) -> Option<Temporal> {
        match pieces.len() {
            0 => None,
            1 if !as_set => pieces.into_iter().next().map(Temporal::Sequence),
            _ => Some(Temporal::SequenceSet(SequenceSet::build(pieces, true))),
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Temporal::Instant(_) => Granularity::Instant,
            Temporal::InstantSet(_) => Granularity::InstantSet,
            Temporal::Sequence(_) => Granularity::Sequence,
            Temporal::SequenceSet(_) => Granularity::SequenceSet,
        }
    }

    pub fn kind(&self) -> BaseKind {
        match self {
            Temporal::Instant(i) => i.kind(),
            Temporal::InstantSet(s) => s.kind(),
            Temporal::Sequence(s) => s.kind(),
            Temporal::SequenceSet(s) => s.kind(),
        }
    }

    /// Interpolation of continuous values; discrete values have none.
    pub fn interpolation(&self) -> Option<Interpolation> {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => None,
            Temporal::Sequence(s) => Some(s.interpolation()),
            Temporal::SequenceSet(s) => Some(s.interpolation()),
        }
    }

    pub fn is_linear(&self) -> bool {
        self.interpolation() == Some(Interpolation::Linear)
    }

    pub fn bbox(&self) -> BoundingBox {
        match self {
            Temporal::Instant(i) => i.bbox(),
            Temporal::InstantSet(s) => *s.bbox(),
            Temporal::Sequence(s) => *s.bbox(),
            Temporal::SequenceSet(s) => *s.bbox(),
        }
    }

    pub fn num_instants(&self) -> usize {
        match self {
            Temporal::Instant(_) => 1,
            Temporal::InstantSet(s) => s.num_instants(),
            Temporal::Sequence(s) => s.num_instants(),
            Temporal::SequenceSet(s) => s.num_instants(),
        }
    }

    pub fn instant_n(&self, n: usize) -> Option<&Instant> {
        match self {
            Temporal::Instant(i) => (n == 0).then_some(i),
            Temporal::InstantSet(s) => s.instant_n(n),
            Temporal::Sequence(s) => s.instant_n(n),
            Temporal::SequenceSet(s) => s.instant_n(n),
        }
    }

    /// All stored instants in time order.
    pub fn instants(&self) -> Vec<&Instant> {
        match self {
            Temporal::Instant(i) => vec![i],
            Temporal::InstantSet(s) => s.instants().iter().collect(),
            Temporal::Sequence(s) => s.instants().iter().collect(),
            Temporal::SequenceSet(s) => s.instants().collect(),
        }
    }

    pub fn start_instant(&self) -> &Instant {
        match self {
            Temporal::Instant(i) => i,
            Temporal::InstantSet(s) => s.start_instant(),
            Temporal::Sequence(s) => s.start_instant(),
            Temporal::SequenceSet(s) => s.start_instant(),
        }
    }

    pub fn end_instant(&self) -> &Instant {
        match self {
            Temporal::Instant(i) => i,
            Temporal::InstantSet(s) => s.end_instant(),
            Temporal::Sequence(s) => s.end_instant(),
            Temporal::SequenceSet(s) => s.end_instant(),
        }
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.start_instant().timestamp()
    }

    pub fn end_timestamp(&self) -> Timestamp {
        self.end_instant().timestamp()
    }

    /// Distinct timestamps of the stored instants, ascending.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        match self {
            Temporal::Instant(i) => vec![i.timestamp()],
            Temporal::InstantSet(s) => s.timestamps(),
            Temporal::Sequence(s) => s.timestamps(),
            Temporal::SequenceSet(s) => s.timestamps(),
        }
    }

    /// Distinct stored base values, ascending.
    pub fn values(&self) -> Vec<Value> {
        let mut values: Vec<Value> = self.instants().into_iter().map(Instant::value_copy).collect();
        values.sort();
        values.dedup();
        values
    }

    pub fn min_value(&self) -> &Value {
        self.instants()
            .into_iter()
            .map(Instant::value)
            .min()
            .unwrap_or_else(|| self.start_instant().value())
    }

    pub fn max_value(&self) -> &Value {
        self.instants()
            .into_iter()
            .map(Instant::value)
            .max()
            .unwrap_or_else(|| self.start_instant().value())
    }

    /// The set of times at which the value is defined.
    pub fn time(&self) -> PeriodSet {
        match self {
            Temporal::Instant(i) => PeriodSet::from_period(i.period()),
            Temporal::InstantSet(s) => s.time(),
            Temporal::Sequence(s) => s.time(),
            Temporal::SequenceSet(s) => s.time(),
        }
    }

    /// Bounding period of the definition time.
    pub fn period(&self) -> Period {
        match self {
            Temporal::Instant(i) => i.period(),
            Temporal::InstantSet(s) => s.period(),
            Temporal::Sequence(s) => s.period(),
            Temporal::SequenceSet(s) => s.period(),
        }
    }

    /// Total duration in microseconds; zero for discrete values.
    pub fn duration(&self) -> i64 {
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => 0,
            Temporal::Sequence(s) => s.duration(),
            Temporal::SequenceSet(s) => s.duration(),
        }
    }

    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        match self {
            Temporal::Instant(i) => (i.timestamp() == t).then(|| i.value_copy()),
            Temporal::InstantSet(s) => s.value_at(t).cloned(),
            Temporal::Sequence(s) => s.value_at(t),
            Temporal::SequenceSet(s) => s.value_at(t),
        }
    }

    /// The sequences of a continuous value; empty for discrete values.
    pub fn sequences(&self) -> &[Sequence] {
        match self {
            Temporal::Sequence(s) => std::slice::from_ref(s),
            Temporal::SequenceSet(s) => s.sequences(),
            _ => &[],
        }
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences().len()
    }

    pub fn shift(&self, delta_micros: i64) -> Temporal {
        match self {
            Temporal::Instant(i) => Temporal::Instant(i.shift(delta_micros)),
            Temporal::InstantSet(s) => Temporal::InstantSet(s.shift(delta_micros)),
            Temporal::Sequence(s) => Temporal::Sequence(s.shift(delta_micros)),
            Temporal::SequenceSet(s) => Temporal::SequenceSet(s.shift(delta_micros)),
        }
    }

    /// Converts to an instant; only single-instant values qualify.
    pub fn to_instant(&self) -> Result<Instant> {
        if self.num_instants() != 1 || self.duration() != 0 {
            return Err(TemporalError::IncompatibleOperands(format!(
                "a {:?} value with {} instants cannot become an instant",
                self.granularity(),
                self.num_instants()
            )));
        }
        Ok(self.start_instant().clone())
    }

    /// Converts to an instant set; continuous values qualify when every
    /// sequence is instantaneous.
    pub fn to_instant_set(&self) -> Result<InstantSet> {
        match self {
            Temporal::Instant(i) => Ok(InstantSet::from_sorted(vec![i.clone()])),
            Temporal::InstantSet(s) => Ok(s.clone()),
            _ => {
                if self.sequences().iter().any(|s| s.num_instants() != 1) {
                    return Err(TemporalError::IncompatibleOperands(
                        "only instantaneous sequences convert to an instant set".to_string(),
                    ));
                }
                let instants = self.instants().into_iter().cloned().collect();
                Ok(InstantSet::from_sorted(instants))
            }
        }
    }

    /// Converts to a single sequence with the given interpolation for
    /// discrete inputs.
    pub fn to_sequence(&self, interp: Interpolation) -> Result<Sequence> {
        match self {
            Temporal::Instant(i) => Sequence::make(vec![i.clone()], true, true, interp, false),
            Temporal::InstantSet(s) if s.num_instants() == 1 => {
                Sequence::make(s.instants().to_vec(), true, true, interp, false)
            }
            Temporal::Sequence(s) => Ok(s.clone()),
            Temporal::SequenceSet(s) if s.num_sequences() == 1 => Ok(s.start_sequence().clone()),
            _ => Err(TemporalError::IncompatibleOperands(format!(
                "a {:?} value with {} instants cannot become one sequence",
                self.granularity(),
                self.num_instants()
            ))),
        }
    }

    /// Converts to a sequence set; instant sets become one instantaneous
    /// sequence per instant.
    pub fn to_sequence_set(&self, interp: Interpolation) -> Result<SequenceSet> {
        match self {
            Temporal::Instant(_) => Ok(SequenceSet::build(vec![self.to_sequence(interp)?], false)),
            Temporal::InstantSet(s) => {
                let sequences = s
                    .instants()
                    .iter()
                    .map(|i| Sequence::make(vec![i.clone()], true, true, interp, false))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SequenceSet::build(sequences, false))
            }
            Temporal::Sequence(s) => Ok(SequenceSet::build(vec![s.clone()], false)),
            Temporal::SequenceSet(s) => Ok(s.clone()),
        }
    }

    /// Converts a continuous value to step interpolation.
    pub fn to_step(&self) -> Result<Temporal> {
        match self {
            Temporal::Sequence(s) => Ok(Temporal::Sequence(s.to_step()?)),
            Temporal::SequenceSet(s) => Ok(Temporal::SequenceSet(s.to_step()?)),
            _ => Ok(self.clone()),
        }
    }

    /// Converts a continuous value to linear interpolation.
    ///
    /// A step sequence generally becomes a sequence set, one constant piece
    /// per step.
    pub fn to_linear(&self) -> Result<Temporal> {
        match self {
            Temporal::Sequence(s) => {
                let pieces = s.to_linear()?;
                Temporal::from_pieces(pieces, false).ok_or(TemporalError::EmptyInput)
            }
            Temporal::SequenceSet(s) => Ok(Temporal::SequenceSet(s.to_linear()?)),
            _ => Ok(self.clone()),
        }
    }

    /// 32-bit hash of the value, stable for equal values.
    pub fn hash_value(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }

    fn bound_flags(&self) -> Vec<(Period, usize)> {
        self.sequences()
            .iter()
            .map(|s| (s.period(), s.num_instants()))
            .collect()
    }
}

impl Hash for Temporal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.granularity().hash(state);
        match self {
            Temporal::Instant(i) => i.hash(state),
            Temporal::InstantSet(s) => s.instants().hash(state),
            Temporal::Sequence(s) => s.hash(state),
            Temporal::SequenceSet(s) => s.hash(state),
        }
    }
}

impl PartialOrd for Temporal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order: bounding period, then instants lexicographically, then
/// granularity, then interpolation and per-sequence bounds.
impl Ord for Temporal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.period()
            .cmp(&other.period())
            .then_with(|| self.instants().cmp(&other.instants()))
            .then_with(|| self.granularity().cmp(&other.granularity()))
            .then_with(|| {
                let interp = |t: &Temporal| t.interpolation().map(|i| i == Interpolation::Linear);
                interp(self).cmp(&interp(other))
            })
            .then_with(|| self.bound_flags().cmp(&other.bound_flags()))
    }
}
