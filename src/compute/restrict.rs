//! Restriction of temporal values to values or to time.
//!
//! Every `at_*` operation keeps the part of a temporal value matching its
//! argument and returns `None` when nothing is left. Every `minus_*`
//! operation keeps the complementary part, computed as the restriction to the
//! value's own time minus the time selected by `at_*`, so that the two parts
//! always partition the original.

use crate::temporal::instant::Instant;
use crate::temporal::instant_set::InstantSet;
use crate::temporal::segment;
use crate::temporal::sequence::Sequence;
use crate::temporal::sequence_set::SequenceSet;
use crate::temporal::{Interpolation, Temporal};
use log::trace;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tempora_types::time::{Period, PeriodSet, Timestamp, TimestampSet};
use tempora_types::value::Value;

/// A numeric range with inclusive or exclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    lower: f64,
    upper: f64,
    lower_inc: bool,
    upper_inc: bool,
}

impl NumericRange {
    /// Returns `None` for an empty range or non-finite bounds.
    pub fn new(lower: f64, upper: f64, lower_inc: bool, upper_inc: bool) -> Option<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return None;
        }
        match lower.partial_cmp(&upper) {
            Some(Ordering::Less) => {}
            Some(Ordering::Equal) if lower_inc && upper_inc => {}
            _ => return None,
        }
        Some(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// The closed range `[lower, upper]`.
    pub fn closed(lower: f64, upper: f64) -> Option<Self> {
        Self::new(lower, upper, true, true)
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, x: f64) -> bool {
        let above = if self.lower_inc {
            x >= self.lower
        } else {
            x > self.lower
        };
        let below = if self.upper_inc {
            x <= self.upper
        } else {
            x < self.upper
        };
        above && below
    }

    fn contains_value(&self, value: &Value) -> bool {
        value.as_f64().is_some_and(|x| self.contains(x))
    }

    fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.lower, self.upper)
    }
}

/// What a value restriction selects.
enum Selector<'a> {
    Value(&'a Value),
    Values(&'a [Value]),
    Range(&'a NumericRange),
}

impl Selector<'_> {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Selector::Value(v) => *v == value,
            Selector::Values(vs) => vs.binary_search(value).is_ok(),
            Selector::Range(r) => r.contains_value(value),
        }
    }

    /// Snaps computed values onto the exact selected values.
    fn snap(&self, value: &Value) -> Value {
        match (self, value) {
            (Selector::Value(v), _) if segment::approx_eq(value, v) => (*v).clone(),
            (Selector::Values(vs), _) => vs
                .iter()
                .find(|v| segment::approx_eq(value, v))
                .cloned()
                .unwrap_or_else(|| value.clone()),
            (Selector::Range(r), Value::Float(x)) => Value::Float(r.clamp(*x)),
            _ => value.clone(),
        }
    }

    /// Times inside the linear segment `a -> b` where the selector holds,
    /// segment endpoints included when they match.
    fn linear_segment_times(&self, a: &Instant, b: &Instant, out: &mut Vec<Period>) {
        let (t1, t2) = (a.timestamp(), b.timestamp());
        match self {
            Selector::Value(v) => value_times(a, b, v, out),
            Selector::Values(vs) => {
                for v in vs.iter() {
                    value_times(a, b, v, out);
                }
            }
            Selector::Range(r) => {
                let (Some(v1), Some(v2)) = (a.value().as_f64(), b.value().as_f64()) else {
                    return;
                };
                if v1 == v2 {
                    if r.contains(v1) {
                        push_period(out, t1, t2, true, true);
                    }
                    return;
                }
                let fraction = |x: f64| (x - v1) / (v2 - v1);
                // bounds of the fraction interval, each with its inclusiveness
                let (mut lo, mut lo_inc, mut hi, mut hi_inc) = if v2 > v1 {
                    (fraction(r.lower), r.lower_inc, fraction(r.upper), r.upper_inc)
                } else {
                    (fraction(r.upper), r.upper_inc, fraction(r.lower), r.lower_inc)
                };
                // an endpoint landing exactly on a range bound keeps the bound's inclusiveness
                if lo < 0.0 {
                    (lo, lo_inc) = (0.0, true);
                }
                if hi > 1.0 {
                    (hi, hi_inc) = (1.0, true);
                }
                if lo > hi {
                    return;
                }
                let start = segment::timestamp_at(t1, t2, lo);
                let end = segment::timestamp_at(t1, t2, hi);
                push_period(out, start, end, lo_inc, hi_inc);
            }
        }
    }
}

fn push_period(out: &mut Vec<Period>, lower: Timestamp, upper: Timestamp, lower_inc: bool, upper_inc: bool) {
    if let Ok(p) = Period::new(lower, upper, lower_inc, upper_inc) {
        out.push(p);
    }
}

fn value_times(a: &Instant, b: &Instant, target: &Value, out: &mut Vec<Period>) {
    let (t1, t2) = (a.timestamp(), b.timestamp());
    if a.value() == b.value() {
        if a.value() == target {
            push_period(out, t1, t2, true, true);
        }
        return;
    }
    if a.value() == target {
        out.push(Period::instant(t1));
    }
    if b.value() == target {
        out.push(Period::instant(t2));
    }
    if let Some(t) = segment::value_crossing(a, b, target) {
        out.push(Period::instant(t));
    }
}

/// Times of a sequence where the selector holds.
fn sequence_time_where(seq: &Sequence, selector: &Selector) -> Option<PeriodSet> {
    let instants = seq.instants();
    if instants.len() == 1 {
        return selector
            .matches(instants[0].value())
            .then(|| PeriodSet::from_period(seq.period()));
    }
    let mut periods = Vec::new();
    for w in instants.windows(2) {
        match seq.interpolation() {
            Interpolation::Step => {
                if selector.matches(w[0].value()) {
                    push_period(&mut periods, w[0].timestamp(), w[1].timestamp(), true, false);
                }
            }
            Interpolation::Linear => selector.linear_segment_times(&w[0], &w[1], &mut periods),
        }
    }
    let last = seq.end_instant();
    if seq.interpolation() == Interpolation::Step && selector.matches(last.value()) {
        periods.push(last.period());
    }
    PeriodSet::from_periods(periods)?.intersection_period(&seq.period())
}

fn time_where(temp: &Temporal, selector: &Selector) -> Option<PeriodSet> {
    let periods: Vec<Period> = temp
        .sequences()
        .iter()
        .filter_map(|s| sequence_time_where(s, selector))
        .flat_map(|ps| ps.periods().to_vec())
        .collect();
    PeriodSet::from_periods(periods)
}

fn filter_instants(temp: &Temporal, keep: impl Fn(&Instant) -> bool) -> Option<Temporal> {
    match temp {
        Temporal::Instant(i) => keep(i).then(|| temp.clone()),
        Temporal::InstantSet(s) => {
            let kept: Vec<Instant> = s.instants().iter().filter(|i| keep(i)).cloned().collect();
            (!kept.is_empty()).then(|| Temporal::InstantSet(InstantSet::from_sorted(kept)))
        }
        _ => None,
    }
}

fn is_discrete(temp: &Temporal) -> bool {
    matches!(temp, Temporal::Instant(_) | Temporal::InstantSet(_))
}

/// Cuts a sequence to a period. Bound values are interpolated.
pub(crate) fn sequence_at_period(seq: &Sequence, period: &Period) -> Option<Sequence> {
    let inter = seq.period().intersection(period)?;
    let (lower, upper) = (inter.lower(), inter.upper());
    if inter.is_instantaneous() {
        return Some(seq.resample(&[lower], true, true));
    }
    let mut times = Vec::with_capacity(seq.num_instants() + 2);
    times.push(lower);
    times.extend(
        seq.instants()
            .iter()
            .map(Instant::timestamp)
            .filter(|&t| t > lower && t < upper),
    );
    times.push(upper);
    Some(seq.resample(&times, inter.lower_inc(), inter.upper_inc()))
}

fn sequence_at_period_set(seq: &Sequence, ps: &PeriodSet, out: &mut Vec<Sequence>) {
    let period = seq.period();
    for p in ps.iter() {
        if p.before(&period) {
            continue;
        }
        if period.before(p) {
            break;
        }
        if let Some(piece) = sequence_at_period(seq, p) {
            out.push(piece);
        }
    }
}

impl Temporal {
    /// Restriction to the times where the value equals `value`.
    ///
    /// A value of another kind never matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora::{Instant, Interpolation, Sequence, Temporal, Timestamp, Value};
    ///
    /// let t = Timestamp::from_secs;
    /// let seq = Temporal::from(Sequence::make(
    ///     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
    ///     true, true, Interpolation::Linear, true,
    /// )?);
    /// let at = seq.at_value(&Value::Float(4.0)).unwrap();
    /// assert_eq!(at.timestamps(), vec![t(4)]);
    /// assert!(seq.at_value(&Value::Float(11.0)).is_none());
    /// # Ok::<(), tempora::TemporalError>(())
    /// ```
    pub fn at_value(&self, value: &Value) -> Option<Temporal> {
        if value.kind() != self.kind() || !self.bbox().may_contain_value(value) {
            return None;
        }
        self.at_selector(&Selector::Value(value))
    }

    pub fn minus_value(&self, value: &Value) -> Option<Temporal> {
        if value.kind() != self.kind() || !self.bbox().may_contain_value(value) {
            return Some(self.clone());
        }
        self.minus_selector(&Selector::Value(value))
    }

    /// Restriction to the times where the value is one of `values`.
    pub fn at_values(&self, values: &[Value]) -> Option<Temporal> {
        let candidates = self.candidate_values(values);
        if candidates.is_empty() {
            return None;
        }
        self.at_selector(&Selector::Values(&candidates))
    }

    pub fn minus_values(&self, values: &[Value]) -> Option<Temporal> {
        let candidates = self.candidate_values(values);
        if candidates.is_empty() {
            return Some(self.clone());
        }
        self.minus_selector(&Selector::Values(&candidates))
    }

    /// Restriction to the times where a numeric value lies in `range`.
    ///
    /// Non-numeric values never match.
    pub fn at_range(&self, range: &NumericRange) -> Option<Temporal> {
        if !self.kind().is_numeric() || !self.range_may_match(range) {
            return None;
        }
        self.at_selector(&Selector::Range(range))
    }

    pub fn minus_range(&self, range: &NumericRange) -> Option<Temporal> {
        if !self.kind().is_numeric() || !self.range_may_match(range) {
            return Some(self.clone());
        }
        self.minus_selector(&Selector::Range(range))
    }

    /// Restriction to the times where the minimum stored value is taken.
    pub fn at_min(&self) -> Option<Temporal> {
        let min = self.min_value().clone();
        self.at_value(&min)
    }

    pub fn minus_min(&self) -> Option<Temporal> {
        let min = self.min_value().clone();
        self.minus_value(&min)
    }

    /// Restriction to the times where the maximum stored value is taken.
    pub fn at_max(&self) -> Option<Temporal> {
        let max = self.max_value().clone();
        self.at_value(&max)
    }

    pub fn minus_max(&self) -> Option<Temporal> {
        let max = self.max_value().clone();
        self.minus_value(&max)
    }

    /// The instant at `t`, if the value is defined there.
    pub fn at_timestamp(&self, t: Timestamp) -> Option<Temporal> {
        self.value_at(t)
            .map(|v| Temporal::Instant(Instant::from_parts(v, t)))
    }

    pub fn minus_timestamp(&self, t: Timestamp) -> Option<Temporal> {
        self.minus_time(&PeriodSet::from_period(Period::instant(t)))
    }

    /// The instants at the given timestamps where the value is defined.
    pub fn at_timestamp_set(&self, ts: &TimestampSet) -> Option<Temporal> {
        if let Temporal::Instant(i) = self {
            return ts.contains(i.timestamp()).then(|| self.clone());
        }
        if !self.period().overlaps(&ts.period()) {
            return None;
        }
        let instants: Vec<Instant> = ts
            .iter()
            .filter_map(|t| self.value_at(t).map(|v| Instant::from_parts(v, t)))
            .collect();
        (!instants.is_empty()).then(|| Temporal::InstantSet(InstantSet::from_sorted(instants)))
    }

    pub fn minus_timestamp_set(&self, ts: &TimestampSet) -> Option<Temporal> {
        self.minus_time(&ts.to_period_set())
    }

    /// Restriction to a period.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora::{Instant, Interpolation, Period, Sequence, Temporal, Timestamp, Value};
    ///
    /// let t = Timestamp::from_secs;
    /// let seq = Temporal::from(Sequence::make(
    ///     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
    ///     true, true, Interpolation::Linear, true,
    /// )?);
    /// let cut = seq.at_period(&Period::new(t(2), t(4), true, false)?).unwrap();
    /// assert_eq!(cut.start_instant().value(), &Value::Float(2.0));
    /// assert_eq!(cut.value_at(t(4)), None);
    /// # Ok::<(), tempora::TemporalError>(())
    /// ```
    pub fn at_period(&self, period: &Period) -> Option<Temporal> {
        if !self.period().overlaps(period) {
            return None;
        }
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => {
                filter_instants(self, |i| period.contains_timestamp(i.timestamp()))
            }
            Temporal::Sequence(s) => sequence_at_period(s, period).map(Temporal::Sequence),
            Temporal::SequenceSet(set) => {
                let pieces: Vec<Sequence> = set
                    .sequences()
                    .iter()
                    .filter_map(|s| sequence_at_period(s, period))
                    .collect();
                Temporal::from_pieces(pieces, true)
            }
        }
    }

    pub fn minus_period(&self, period: &Period) -> Option<Temporal> {
        self.minus_time(&PeriodSet::from_period(*period))
    }

    /// Restriction to a period set.
    pub fn at_period_set(&self, ps: &PeriodSet) -> Option<Temporal> {
        if !self.period().overlaps(&ps.period()) {
            return None;
        }
        match self {
            Temporal::Instant(_) | Temporal::InstantSet(_) => {
                filter_instants(self, |i| ps.contains_timestamp(i.timestamp()))
            }
            Temporal::Sequence(s) => {
                let mut pieces = Vec::new();
                sequence_at_period_set(s, ps, &mut pieces);
                Temporal::from_pieces(pieces, false)
            }
            Temporal::SequenceSet(set) => {
                let mut pieces = Vec::new();
                for s in set.sequences() {
                    sequence_at_period_set(s, ps, &mut pieces);
                }
                Temporal::from_pieces(pieces, true)
            }
        }
    }

    pub fn minus_period_set(&self, ps: &PeriodSet) -> Option<Temporal> {
        self.minus_time(ps)
    }

    fn minus_time(&self, removed: &PeriodSet) -> Option<Temporal> {
        if !self.period().overlaps(&removed.period()) {
            return Some(self.clone());
        }
        let rest = self.time().minus(removed)?;
        self.at_period_set(&rest)
    }

    fn candidate_values(&self, values: &[Value]) -> Vec<Value> {
        let bbox = self.bbox();
        let kind = self.kind();
        let mut candidates: Vec<Value> = values
            .iter()
            .filter(|v| v.kind() == kind && bbox.may_contain_value(v))
            .cloned()
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates
    }

    fn range_may_match(&self, range: &NumericRange) -> bool {
        match self.bbox().value_span() {
            Some(span) => span.max >= range.lower && span.min <= range.upper,
            None => true,
        }
    }

    fn at_selector(&self, selector: &Selector) -> Option<Temporal> {
        if is_discrete(self) {
            return filter_instants(self, |i| selector.matches(i.value()));
        }
        let time = time_where(self, selector)?;
        trace!("value restriction selects {} periods", time.len());
        let result = self.at_period_set(&time)?;
        Some(snap_values(&result, selector))
    }

    fn minus_selector(&self, selector: &Selector) -> Option<Temporal> {
        if is_discrete(self) {
            return filter_instants(self, |i| !selector.matches(i.value()));
        }
        match time_where(self, selector) {
            Some(time) => self.minus_time(&time),
            None => Some(self.clone()),
        }
    }
}

/// Replaces interpolated values that landed within tolerance of the selection.
fn snap_values(temp: &Temporal, selector: &Selector) -> Temporal {
    let snap_seq = |s: &Sequence| {
        let instants = s
            .instants()
            .iter()
            .map(|i| i.with_value(selector.snap(i.value())))
            .collect();
        Sequence::build(instants, s.lower_inc(), s.upper_inc(), s.interpolation(), false)
    };
    match temp {
        Temporal::Sequence(s) => Temporal::Sequence(snap_seq(s)),
        Temporal::SequenceSet(set) => Temporal::SequenceSet(SequenceSet::build(
            set.sequences().iter().map(snap_seq).collect(),
            false,
        )),
        _ => temp.clone(),
    }
}
