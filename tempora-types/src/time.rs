//! Timestamps, periods, and the set types used as restriction arguments.
//!
//! All time values are microseconds since the Unix epoch. A [`Period`] is an
//! interval with independently inclusive or exclusive bounds; a [`PeriodSet`]
//! is always kept normalized (sorted, no overlap, no adjacency) so that set
//! operations can be computed with a single merge pass.

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point in time, in microseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const MIN: Timestamp = Timestamp(i64::MIN);
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis * 1_000)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000_000)
    }

    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Convert from wall-clock time. Times before the epoch map to negative values.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self(d.as_micros() as i64),
            Err(e) => Self(-(e.duration().as_micros() as i64)),
        }
    }

    pub fn to_system_time(&self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_micros(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_micros(self.0.unsigned_abs())
        }
    }

    /// Move the timestamp by a signed number of microseconds, saturating at the limits.
    #[inline]
    pub fn shift(self, delta_micros: i64) -> Self {
        Self(self.0.saturating_add(delta_micros))
    }

    /// Signed number of microseconds from `earlier` to `self`.
    #[inline]
    pub fn micros_since(self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order two lower bounds: at the same timestamp an inclusive bound starts earlier.
pub fn cmp_lower_bounds(t1: Timestamp, inc1: bool, t2: Timestamp, inc2: bool) -> Ordering {
    t1.cmp(&t2).then_with(|| match (inc1, inc2) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    })
}

/// Order two upper bounds: at the same timestamp an inclusive bound ends later.
pub fn cmp_upper_bounds(t1: Timestamp, inc1: bool, t2: Timestamp, inc2: bool) -> Ordering {
    t1.cmp(&t2).then_with(|| match (inc1, inc2) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    })
}

#[inline]
fn lower_before_upper(lower: Timestamp, lower_inc: bool, upper: Timestamp, upper_inc: bool) -> bool {
    lower < upper || (lower == upper && lower_inc && upper_inc)
}

/// A time interval with inclusive or exclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    lower: Timestamp,
    upper: Timestamp,
    lower_inc: bool,
    upper_inc: bool,
}

impl Period {
    /// Create a validated period.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora_types::time::{Period, Timestamp};
    ///
    /// let p = Period::new(Timestamp::from_secs(0), Timestamp::from_secs(10), true, false)?;
    /// assert!(p.contains_timestamp(Timestamp::from_secs(0)));
    /// assert!(!p.contains_timestamp(Timestamp::from_secs(10)));
    ///
    /// assert!(Period::new(Timestamp::from_secs(5), Timestamp::from_secs(5), true, false).is_err());
    /// # Ok::<(), tempora_types::TypeError>(())
    /// ```
    pub fn new(
        lower: Timestamp,
        upper: Timestamp,
        lower_inc: bool,
        upper_inc: bool,
    ) -> Result<Self, TypeError> {
        if lower > upper {
            return Err(TypeError::InvalidPeriod(format!(
                "lower bound {} is after upper bound {}",
                lower, upper
            )));
        }
        if lower == upper && !(lower_inc && upper_inc) {
            return Err(TypeError::InvalidPeriod(format!(
                "instantaneous period at {} must have inclusive bounds",
                lower
            )));
        }
        Ok(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// The closed period `[t, t]`.
    pub fn instant(t: Timestamp) -> Self {
        Self {
            lower: t,
            upper: t,
            lower_inc: true,
            upper_inc: true,
        }
    }

    pub fn lower(&self) -> Timestamp {
        self.lower
    }

    pub fn upper(&self) -> Timestamp {
        self.upper
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn is_instantaneous(&self) -> bool {
        self.lower == self.upper
    }

    /// Length of the period in microseconds.
    pub fn duration(&self) -> i64 {
        self.upper.micros_since(self.lower)
    }

    pub fn contains_timestamp(&self, t: Timestamp) -> bool {
        (self.lower < t || (self.lower == t && self.lower_inc))
            && (t < self.upper || (t == self.upper && self.upper_inc))
    }

    pub fn contains(&self, other: &Period) -> bool {
        cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc)
            != Ordering::Greater
            && cmp_upper_bounds(self.upper, self.upper_inc, other.upper, other.upper_inc)
                != Ordering::Less
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        lower_before_upper(self.lower, self.lower_inc, other.upper, other.upper_inc)
            && lower_before_upper(other.lower, other.lower_inc, self.upper, self.upper_inc)
    }

    /// Two periods are adjacent when they share a bound that exactly one of them includes.
    pub fn adjacent(&self, other: &Period) -> bool {
        (self.upper == other.lower && self.upper_inc != other.lower_inc)
            || (other.upper == self.lower && other.upper_inc != self.lower_inc)
    }

    /// True when every instant of `self` is strictly before every instant of `other`.
    pub fn before(&self, other: &Period) -> bool {
        self.upper < other.lower || (self.upper == other.lower && !(self.upper_inc && other.lower_inc))
    }

    pub fn after(&self, other: &Period) -> bool {
        other.before(self)
    }

    pub fn intersection(&self, other: &Period) -> Option<Period> {
        let (lower, lower_inc) =
            if cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc)
                == Ordering::Less
            {
                (other.lower, other.lower_inc)
            } else {
                (self.lower, self.lower_inc)
            };
        let (upper, upper_inc) =
            if cmp_upper_bounds(self.upper, self.upper_inc, other.upper, other.upper_inc)
                == Ordering::Greater
            {
                (other.upper, other.upper_inc)
            } else {
                (self.upper, self.upper_inc)
            };
        lower_before_upper(lower, lower_inc, upper, upper_inc).then_some(Period {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// Smallest period covering both operands.
    pub fn expand(&self, other: &Period) -> Period {
        let (lower, lower_inc) =
            if cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc)
                == Ordering::Greater
            {
                (other.lower, other.lower_inc)
            } else {
                (self.lower, self.lower_inc)
            };
        let (upper, upper_inc) =
            if cmp_upper_bounds(self.upper, self.upper_inc, other.upper, other.upper_inc)
                == Ordering::Less
            {
                (other.upper, other.upper_inc)
            } else {
                (self.upper, self.upper_inc)
            };
        Period {
            lower,
            upper,
            lower_inc,
            upper_inc,
        }
    }

    /// The part of `self` not covered by `other`: zero, one, or two periods.
    pub fn minus(&self, other: &Period) -> Vec<Period> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut result = Vec::with_capacity(2);
        if cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc)
            == Ordering::Less
        {
            result.push(Period {
                lower: self.lower,
                lower_inc: self.lower_inc,
                upper: other.lower,
                upper_inc: !other.lower_inc,
            });
        }
        if cmp_upper_bounds(self.upper, self.upper_inc, other.upper, other.upper_inc)
            == Ordering::Greater
        {
            result.push(Period {
                lower: other.upper,
                lower_inc: !other.upper_inc,
                upper: self.upper,
                upper_inc: self.upper_inc,
            });
        }
        result
    }

    pub fn shift(&self, delta_micros: i64) -> Period {
        Period {
            lower: self.lower.shift(delta_micros),
            upper: self.upper.shift(delta_micros),
            ..*self
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc).then_with(
            || cmp_upper_bounds(self.upper, self.upper_inc, other.upper, other.upper_inc),
        )
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lower_inc { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inc { ']' } else { ')' }
        )
    }
}

/// A non-empty, sorted, duplicate-free set of timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimestampSet {
    timestamps: Vec<Timestamp>,
}

impl TimestampSet {
    pub fn new(mut timestamps: Vec<Timestamp>) -> Result<Self, TypeError> {
        if timestamps.is_empty() {
            return Err(TypeError::Empty("timestamp set"));
        }
        timestamps.sort_unstable();
        timestamps.dedup();
        Ok(Self { timestamps })
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn start(&self) -> Timestamp {
        self.timestamps[0]
    }

    pub fn end(&self) -> Timestamp {
        self.timestamps[self.timestamps.len() - 1]
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.timestamps.binary_search(&t).is_ok()
    }

    /// Bounding period `[start, end]`.
    pub fn period(&self) -> Period {
        Period {
            lower: self.start(),
            upper: self.end(),
            lower_inc: true,
            upper_inc: true,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.timestamps.iter().copied()
    }

    /// The timestamps as a set of instantaneous periods.
    pub fn to_period_set(&self) -> PeriodSet {
        PeriodSet {
            periods: self.timestamps.iter().map(|&t| Period::instant(t)).collect(),
        }
    }
}

/// A non-empty set of periods kept sorted, disjoint and non-adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodSet {
    periods: Vec<Period>,
}

impl PeriodSet {
    /// Create a period set, merging overlapping and adjacent periods.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora_types::time::{Period, PeriodSet, Timestamp};
    ///
    /// let t = Timestamp::from_secs;
    /// let ps = PeriodSet::new(vec![
    ///     Period::new(t(5), t(8), true, true)?,
    ///     Period::new(t(0), t(5), true, false)?,
    /// ])?;
    /// assert_eq!(ps.len(), 1);
    /// # Ok::<(), tempora_types::TypeError>(())
    /// ```
    pub fn new(periods: Vec<Period>) -> Result<Self, TypeError> {
        if periods.is_empty() {
            return Err(TypeError::Empty("period set"));
        }
        Ok(Self {
            periods: normalize_periods(periods),
        })
    }

    /// Like [`PeriodSet::new`] but yields `None` for an empty input.
    pub fn from_periods(periods: Vec<Period>) -> Option<Self> {
        if periods.is_empty() {
            None
        } else {
            Some(Self {
                periods: normalize_periods(periods),
            })
        }
    }

    pub fn from_period(period: Period) -> Self {
        Self {
            periods: vec![period],
        }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Bounding period of the whole set.
    pub fn period(&self) -> Period {
        let first = self.periods[0];
        let last = self.periods[self.periods.len() - 1];
        Period {
            lower: first.lower,
            lower_inc: first.lower_inc,
            upper: last.upper,
            upper_inc: last.upper_inc,
        }
    }

    /// Sum of the durations of the component periods, in microseconds.
    pub fn duration(&self) -> i64 {
        self.periods.iter().map(Period::duration).sum()
    }

    /// Binary search for the period containing `t`.
    pub fn find_timestamp(&self, t: Timestamp) -> Option<usize> {
        let idx = self.periods.partition_point(|p| {
            p.upper < t || (p.upper == t && !p.upper_inc)
        });
        (idx < self.periods.len() && self.periods[idx].contains_timestamp(t)).then_some(idx)
    }

    pub fn contains_timestamp(&self, t: Timestamp) -> bool {
        self.find_timestamp(t).is_some()
    }

    pub fn overlaps_period(&self, period: &Period) -> bool {
        self.periods.iter().any(|p| p.overlaps(period))
    }

    pub fn union(&self, other: &PeriodSet) -> PeriodSet {
        let mut all = Vec::with_capacity(self.len() + other.len());
        all.extend_from_slice(&self.periods);
        all.extend_from_slice(&other.periods);
        PeriodSet {
            periods: normalize_periods(all),
        }
    }

    pub fn intersection(&self, other: &PeriodSet) -> Option<PeriodSet> {
        let (mut i, mut j) = (0, 0);
        let mut result = Vec::new();
        while i < self.periods.len() && j < other.periods.len() {
            let (p, q) = (&self.periods[i], &other.periods[j]);
            if let Some(inter) = p.intersection(q) {
                result.push(inter);
            }
            if cmp_upper_bounds(p.upper, p.upper_inc, q.upper, q.upper_inc) == Ordering::Less {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::from_periods(result)
    }

    pub fn intersection_period(&self, period: &Period) -> Option<PeriodSet> {
        self.intersection(&PeriodSet::from_period(*period))
    }

    /// The part of `self` not covered by `other`.
    pub fn minus(&self, other: &PeriodSet) -> Option<PeriodSet> {
        let mut result = Vec::new();
        let mut j = 0;
        for p in &self.periods {
            let mut pieces = vec![*p];
            while j < other.periods.len() && other.periods[j].before(p) {
                j += 1;
            }
            let mut k = j;
            while k < other.periods.len() && !p.before(&other.periods[k]) {
                let q = &other.periods[k];
                pieces = pieces.iter().flat_map(|piece| piece.minus(q)).collect();
                k += 1;
            }
            result.extend(pieces);
        }
        Self::from_periods(result)
    }

    pub fn shift(&self, delta_micros: i64) -> PeriodSet {
        PeriodSet {
            periods: self.periods.iter().map(|p| p.shift(delta_micros)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter()
    }
}

impl From<Period> for PeriodSet {
    fn from(period: Period) -> Self {
        Self::from_period(period)
    }
}

fn normalize_periods(mut periods: Vec<Period>) -> Vec<Period> {
    periods.sort();
    let mut result: Vec<Period> = Vec::with_capacity(periods.len());
    for p in periods {
        match result.last_mut() {
            Some(last) if last.overlaps(&p) || last.adjacent(&p) => *last = last.expand(&p),
            _ => result.push(p),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn p(lower: i64, upper: i64, lower_inc: bool, upper_inc: bool) -> Period {
        Period::new(t(lower), t(upper), lower_inc, upper_inc).unwrap()
    }

    #[test]
    fn test_period_validation() {
        assert!(Period::new(t(10), t(0), true, true).is_err());
        assert!(Period::new(t(3), t(3), true, false).is_err());
        assert!(Period::new(t(3), t(3), true, true).is_ok());
    }

    #[test]
    fn test_period_overlap_respects_bounds() {
        assert!(!p(0, 5, true, false).overlaps(&p(5, 10, true, true)));
        assert!(p(0, 5, true, true).overlaps(&p(5, 10, true, true)));
        assert!(p(0, 5, true, false).adjacent(&p(5, 10, true, true)));
        assert!(!p(0, 5, true, false).adjacent(&p(5, 10, false, true)));
    }

    #[test]
    fn test_period_minus_splits() {
        let parts = p(0, 10, true, true).minus(&p(3, 6, true, true));
        assert_eq!(parts, vec![p(0, 3, true, false), p(6, 10, false, true)]);

        let parts = p(0, 10, true, true).minus(&Period::instant(t(10)));
        assert_eq!(parts, vec![p(0, 10, true, false)]);
    }

    #[test]
    fn test_timestamp_system_time_conversion() {
        let ts = Timestamp::from_micros(1_640_995_200_000_000);
        assert_eq!(Timestamp::from_system_time(ts.to_system_time()), ts);
        let before_epoch = Timestamp::from_secs(-5);
        assert_eq!(
            Timestamp::from_system_time(before_epoch.to_system_time()),
            before_epoch
        );
    }

    #[test]
    fn test_period_set_normalization() {
        let ps = PeriodSet::new(vec![p(6, 8, true, true), p(0, 3, true, false), p(3, 5, true, true)])
            .unwrap();
        assert_eq!(ps.periods(), &[p(0, 5, true, true), p(6, 8, true, true)]);
        assert_eq!(ps.duration(), 7_000_000);
    }

    #[test]
    fn test_period_set_algebra() {
        let a = PeriodSet::new(vec![p(0, 10, true, true)]).unwrap();
        let b = PeriodSet::new(vec![p(2, 3, true, true), p(5, 6, false, false)]).unwrap();

        let inter = a.intersection(&b).unwrap();
        assert_eq!(inter, b);

        let diff = a.minus(&b).unwrap();
        assert_eq!(
            diff.periods(),
            &[p(0, 2, true, false), p(3, 5, false, true), p(6, 10, true, true)]
        );
        assert_eq!(diff.union(&b), a);
        assert!(a.minus(&a).is_none());
    }

    #[test]
    fn test_period_set_find_timestamp() {
        let ps = PeriodSet::new(vec![p(0, 2, true, false), p(4, 6, false, true)]).unwrap();
        assert_eq!(ps.find_timestamp(t(1)), Some(0));
        assert_eq!(ps.find_timestamp(t(2)), None);
        assert_eq!(ps.find_timestamp(t(4)), None);
        assert_eq!(ps.find_timestamp(t(6)), Some(1));
    }
}
