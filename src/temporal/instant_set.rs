use super::instant::{Instant, bbox_of, check_compatible, check_homogeneous};
use crate::error::{Result, TemporalError};
use crate::validation::{DefaultValidator, ValueValidator};
use log::trace;
use serde::{Deserialize, Serialize};
use tempora_types::bbox::BoundingBox;
use tempora_types::time::{Period, PeriodSet, Timestamp};
use tempora_types::value::{BaseKind, Value};

/// A finite set of instants with strictly increasing timestamps.
///
/// Between instants the value is undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantSet {
    instants: Vec<Instant>,
    bbox: BoundingBox,
}

impl Eq for InstantSet {}

impl InstantSet {
    /// Builds an instant set from instants in any order.
    ///
    /// Instants are sorted by timestamp. Repeated identical instants collapse.
    /// Two instants at the same timestamp with different values keep the first
    /// one given when `merge_duplicates` is set, and are an error otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora::{Instant, InstantSet, Timestamp};
    ///
    /// let t = Timestamp::from_secs;
    /// let set = InstantSet::make(
    ///     vec![Instant::new(3, t(3))?, Instant::new(1, t(1))?, Instant::new(2, t(2))?],
    ///     false,
    /// )?;
    /// assert_eq!(set.start_timestamp(), t(1));
    /// assert_eq!(set.num_instants(), 3);
    /// # Ok::<(), tempora::TemporalError>(())
    /// ```
    pub fn make(instants: Vec<Instant>, merge_duplicates: bool) -> Result<Self> {
        Self::make_with(instants, merge_duplicates, &DefaultValidator)
    }

    pub fn make_with(
        mut instants: Vec<Instant>,
        merge_duplicates: bool,
        validator: &dyn ValueValidator,
    ) -> Result<Self> {
        check_homogeneous(&instants)?;
        validator.validate_count(instants.len())?;
        for inst in &instants {
            validator.validate(inst.value())?;
        }

        // stable, so the first instant given for a timestamp stays first
        instants.sort_by_key(Instant::timestamp);
        let mut kept: Vec<Instant> = Vec::with_capacity(instants.len());
        for inst in instants {
            match kept.last() {
                Some(last) if last.timestamp() == inst.timestamp() => {
                    if last.value() != inst.value() && !merge_duplicates {
                        return Err(TemporalError::ConflictingInstant(inst.timestamp()));
                    }
                    trace!("dropping duplicate instant at {}", inst.timestamp());
                }
                _ => kept.push(inst),
            }
        }
        Ok(Self::from_sorted(kept))
    }

    /// Builds a set from instants already sorted, distinct and homogeneous.
    pub(crate) fn from_sorted(instants: Vec<Instant>) -> Self {
        debug_assert!(!instants.is_empty());
        debug_assert!(
            instants
                .windows(2)
                .all(|w| w[0].timestamp() < w[1].timestamp())
        );
        let bbox = bbox_of(&instants);
        Self { instants, bbox }
    }

    /// A new set with `inst` added after the last instant.
    pub fn append(&self, inst: Instant) -> Result<InstantSet> {
        self.append_with(inst, &DefaultValidator)
    }

    pub fn append_with(&self, inst: Instant, validator: &dyn ValueValidator) -> Result<InstantSet> {
        check_compatible(self.instants[0].value(), inst.value())?;
        validator.validate_count(self.instants.len() + 1)?;
        validator.validate(inst.value())?;
        let end = self.end_timestamp();
        if inst.timestamp() <= end {
            return Err(TemporalError::UnorderedTimestamps {
                prev: end,
                next: inst.timestamp(),
            });
        }
        let mut bbox = self.bbox;
        bbox.merge(&inst.bbox());
        let mut instants = self.instants.clone();
        instants.push(inst);
        Ok(Self { instants, bbox })
    }

    /// Binary search by timestamp: `Ok(index)` on a hit, `Err(insertion point)` otherwise.
    pub fn find_timestamp(&self, t: Timestamp) -> std::result::Result<usize, usize> {
        self.instants.binary_search_by_key(&t, Instant::timestamp)
    }

    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    pub fn num_instants(&self) -> usize {
        self.instants.len()
    }

    pub fn instant_n(&self, n: usize) -> Option<&Instant> {
        self.instants.get(n)
    }

    pub fn start_instant(&self) -> &Instant {
        &self.instants[0]
    }

    pub fn end_instant(&self) -> &Instant {
        &self.instants[self.instants.len() - 1]
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.start_instant().timestamp()
    }

    pub fn end_timestamp(&self) -> Timestamp {
        self.end_instant().timestamp()
    }

    pub fn kind(&self) -> BaseKind {
        self.instants[0].kind()
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Bounding period `[start, end]`.
    pub fn period(&self) -> Period {
        // timestamps are increasing, so bounds are ordered
        Period::new(self.start_timestamp(), self.end_timestamp(), true, true)
            .unwrap_or_else(|_| Period::instant(self.start_timestamp()))
    }

    /// One instantaneous period per instant.
    pub fn time(&self) -> PeriodSet {
        let periods = self.instants.iter().map(Instant::period).collect();
        PeriodSet::from_periods(periods).unwrap_or_else(|| PeriodSet::from_period(self.period()))
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.instants.iter().map(Instant::timestamp).collect()
    }

    pub fn value_at(&self, t: Timestamp) -> Option<&Value> {
        self.find_timestamp(t).ok().map(|i| self.instants[i].value())
    }

    pub fn shift(&self, delta_micros: i64) -> InstantSet {
        Self {
            instants: self.instants.iter().map(|i| i.shift(delta_micros)).collect(),
            bbox: self.bbox.shift(delta_micros),
        }
    }
}
