use super::Interpolation;
use super::instant::{Instant, check_compatible};
use super::segment;
use super::sequence::Sequence;
use crate::error::{Result, TemporalError};
use crate::validation::{DefaultValidator, ValueValidator};
use log::trace;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use tempora_types::bbox::BoundingBox;
use tempora_types::time::{Period, PeriodSet, Timestamp};
use tempora_types::value::{BaseKind, Value};

/// Non-overlapping sequences ordered by time, sharing one interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceSet {
    sequences: Vec<Sequence>,
    bbox: BoundingBox,
    total_instants: usize,
}

impl Eq for SequenceSet {}

impl Hash for SequenceSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequences.hash(state);
    }
}

impl SequenceSet {
    /// Builds a sequence set, sorting the sequences by period.
    ///
    /// Sequences must share base kind, dimensionality and interpolation and
    /// must not overlap. With `normalize`, adjacent sequences that join into a
    /// single function are merged.
    pub fn make(sequences: Vec<Sequence>, normalize: bool) -> Result<Self> {
        Self::make_with(sequences, normalize, &DefaultValidator)
    }

    /// Like [`SequenceSet::make`], checking every value and the total instant
    /// count with `validator`.
    pub fn make_with(
        mut sequences: Vec<Sequence>,
        normalize: bool,
        validator: &dyn ValueValidator,
    ) -> Result<Self> {
        let first = sequences.first().ok_or(TemporalError::EmptyInput)?;
        validator.validate_count(sequences.iter().map(Sequence::num_instants).sum())?;
        for inst in sequences.iter().flat_map(|s| s.instants()) {
            validator.validate(inst.value())?;
        }
        let interp = first.interpolation();
        let reference = first.start_instant().value_copy();
        for seq in &sequences[1..] {
            check_compatible(&reference, seq.start_instant().value())?;
            if seq.interpolation() != interp {
                return Err(TemporalError::IncompatibleOperands(
                    "sequences of a set must share one interpolation".to_string(),
                ));
            }
        }
        sequences.sort_by_key(Sequence::period);
        for w in sequences.windows(2) {
            if w[0].period().overlaps(&w[1].period()) {
                return Err(TemporalError::OverlappingSequences(w[1].start_timestamp()));
            }
        }
        Ok(Self::build(sequences, normalize))
    }

    /// Builds a set from sequences already sorted, disjoint and homogeneous.
    pub(crate) fn build(sequences: Vec<Sequence>, normalize: bool) -> Self {
        debug_assert!(!sequences.is_empty());
        let sequences = if normalize && sequences.len() > 1 {
            normalize_sequences(sequences)
        } else {
            sequences
        };
        let mut bbox = *sequences[0].bbox();
        for seq in &sequences[1..] {
            bbox.merge(seq.bbox());
        }
        let total_instants = sequences.iter().map(Sequence::num_instants).sum();
        Self {
            sequences,
            bbox,
            total_instants,
        }
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn num_sequences(&self) -> usize {
        self.sequences.len()
    }

    pub fn sequence_n(&self, n: usize) -> Option<&Sequence> {
        self.sequences.get(n)
    }

    pub fn start_sequence(&self) -> &Sequence {
        &self.sequences[0]
    }

    pub fn end_sequence(&self) -> &Sequence {
        &self.sequences[self.sequences.len() - 1]
    }

    /// The sequence whose period contains `t`.
    pub fn sequence_at(&self, t: Timestamp) -> Option<&Sequence> {
        let idx = self.sequences.partition_point(|s| {
            s.end_timestamp() < t || (s.end_timestamp() == t && !s.upper_inc())
        });
        self.sequences
            .get(idx)
            .filter(|s| s.period().contains_timestamp(t))
    }

    pub fn num_instants(&self) -> usize {
        self.total_instants
    }

    /// The `n`-th instant counting across all sequences.
    pub fn instant_n(&self, mut n: usize) -> Option<&Instant> {
        for seq in &self.sequences {
            if n < seq.num_instants() {
                return seq.instant_n(n);
            }
            n -= seq.num_instants();
        }
        None
    }

    pub fn instants(&self) -> impl Iterator<Item = &Instant> {
        self.sequences.iter().flat_map(|s| s.instants().iter())
    }

    pub fn start_instant(&self) -> &Instant {
        self.start_sequence().start_instant()
    }

    pub fn end_instant(&self) -> &Instant {
        self.end_sequence().end_instant()
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.start_sequence().start_timestamp()
    }

    pub fn end_timestamp(&self) -> Timestamp {
        self.end_sequence().end_timestamp()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.sequences[0].interpolation()
    }

    pub fn kind(&self) -> BaseKind {
        self.sequences[0].kind()
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Bounding period from the first lower bound to the last upper bound.
    pub fn period(&self) -> Period {
        let (first, last) = (self.start_sequence(), self.end_sequence());
        Period::new(
            first.start_timestamp(),
            last.end_timestamp(),
            first.lower_inc(),
            last.upper_inc(),
        )
        .unwrap_or_else(|_| first.period())
    }

    pub fn time(&self) -> PeriodSet {
        let periods = self.sequences.iter().map(Sequence::period).collect();
        PeriodSet::from_periods(periods).unwrap_or_else(|| PeriodSet::from_period(self.period()))
    }

    /// Total covered duration in microseconds, gaps excluded.
    pub fn duration(&self) -> i64 {
        self.sequences.iter().map(Sequence::duration).sum()
    }

    /// Distinct timestamps in ascending order.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        let mut result: Vec<Timestamp> = self.instants().map(Instant::timestamp).collect();
        result.dedup();
        result
    }

    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        self.sequence_at(t).and_then(|s| s.value_at(t))
    }

    pub fn shift(&self, delta_micros: i64) -> SequenceSet {
        Self {
            sequences: self.sequences.iter().map(|s| s.shift(delta_micros)).collect(),
            bbox: self.bbox.shift(delta_micros),
            total_instants: self.total_instants,
        }
    }

    pub fn to_step(&self) -> Result<SequenceSet> {
        let sequences = self
            .sequences
            .iter()
            .map(Sequence::to_step)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::build(sequences, true))
    }

    pub fn to_linear(&self) -> Result<SequenceSet> {
        let mut pieces = Vec::with_capacity(self.sequences.len());
        for seq in &self.sequences {
            pieces.extend(seq.to_linear()?);
        }
        Ok(Self::build(pieces, true))
    }
}

/// Joins two adjacent sequences, optionally dropping the last instant of the
/// first and the first instant of the second.
fn join(seq1: &Sequence, seq2: &Sequence, drop_last: bool, drop_first: bool) -> Sequence {
    let n1 = seq1.num_instants() - usize::from(drop_last);
    let mut instants = Vec::with_capacity(n1 + seq2.num_instants());
    instants.extend_from_slice(&seq1.instants()[..n1]);
    instants.extend_from_slice(&seq2.instants()[usize::from(drop_first)..]);
    Sequence::build(
        instants,
        seq1.lower_inc(),
        seq2.upper_inc(),
        seq1.interpolation(),
        false,
    )
}

/// Merges neighbouring sequences that meet at a shared bound and continue the
/// same function across it.
fn normalize_sequences(sequences: Vec<Sequence>) -> Vec<Sequence> {
    let mut iter = sequences.into_iter();
    let mut result = Vec::new();
    let Some(mut current) = iter.next() else {
        return result;
    };
    for next in iter {
        let step = current.interpolation() == Interpolation::Step;
        let adjacent = current.end_timestamp() == next.start_timestamp()
            && (current.upper_inc() || next.lower_inc());
        if !adjacent {
            result.push(std::mem::replace(&mut current, next));
            continue;
        }
        let n1 = current.num_instants();
        let last1 = current.end_instant();
        let last2 = (n1 > 1).then(|| &current.instants()[n1 - 2]);
        let first1 = next.start_instant();
        let first2 = next.instant_n(1);

        let joins_through = match (last2, first2) {
            (Some(last2), Some(first2)) => {
                (step && last2.value() == last1.value() && last1.value() == first1.value())
                    || (last2.value() == last1.value()
                        && last1.value() == first1.value()
                        && first1.value() == first2.value())
                    || (!step
                        && last1.value() == first1.value()
                        && segment::collinear(last2, first1, first2))
            }
            _ => false,
        };
        let merged = if joins_through {
            Some(join(&current, &next, true, true))
        } else if step && !current.upper_inc() {
            Some(join(&current, &next, true, false))
        } else if last1.value() == first1.value() {
            Some(join(&current, &next, false, true))
        } else {
            None
        };
        match merged {
            Some(seq) => {
                trace!("merged sequences meeting at {}", seq.start_timestamp());
                current = seq;
            }
            None => result.push(std::mem::replace(&mut current, next)),
        }
    }
    result.push(current);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn seq(points: &[(f64, i64)], lower_inc: bool, upper_inc: bool, interp: Interpolation) -> Sequence {
        let instants = points
            .iter()
            .map(|&(v, s)| Instant::new(v, t(s)).unwrap())
            .collect();
        Sequence::make(instants, lower_inc, upper_inc, interp, false).unwrap()
    }

    #[test]
    fn test_sorts_and_rejects_overlap() {
        let a = seq(&[(1.0, 0), (2.0, 5)], true, true, Interpolation::Linear);
        let b = seq(&[(3.0, 10), (4.0, 20)], true, true, Interpolation::Linear);
        let set = SequenceSet::make(vec![b.clone(), a.clone()], true).unwrap();
        assert_eq!(set.start_timestamp(), t(0));
        assert_eq!(set.num_sequences(), 2);
        assert_eq!(set.num_instants(), 4);
        assert_eq!(set.value_at(t(7)), None);
        assert_eq!(set.value_at(t(15)), Some(Value::Float(3.5)));
        assert_eq!(set.duration(), 15_000_000);

        let c = seq(&[(1.0, 3), (2.0, 12)], true, true, Interpolation::Linear);
        assert!(matches!(
            SequenceSet::make(vec![a, c], true),
            Err(TemporalError::OverlappingSequences(_))
        ));
    }

    #[test]
    fn test_shared_bound_is_not_overlap() {
        let a = seq(&[(1.0, 0), (2.0, 5)], true, false, Interpolation::Linear);
        let b = seq(&[(7.0, 5), (8.0, 10)], true, true, Interpolation::Linear);
        let set = SequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(set.num_sequences(), 2);
        assert_eq!(set.value_at(t(5)), Some(Value::Float(7.0)));
        assert_eq!(set.time().len(), 1);
    }

    #[test]
    fn test_merges_continuous_linear_join() {
        let a = seq(&[(0.0, 0), (5.0, 5)], true, false, Interpolation::Linear);
        let b = seq(&[(5.0, 5), (10.0, 10)], true, true, Interpolation::Linear);
        let set = SequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(set.num_sequences(), 1);
        assert_eq!(set.num_instants(), 2);
        assert_eq!(set.value_at(t(5)), Some(Value::Float(5.0)));
    }

    #[test]
    fn test_merges_step_join() {
        let a = seq(&[(1.0, 0), (1.0, 5)], true, false, Interpolation::Step);
        let b = seq(&[(2.0, 5), (3.0, 10)], true, true, Interpolation::Step);
        let set = SequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(set.num_sequences(), 1);
        assert_eq!(set.value_at(t(4)), Some(Value::Float(1.0)));
        assert_eq!(set.value_at(t(5)), Some(Value::Float(2.0)));
    }

    #[test]
    fn test_step_floats_are_not_joined_as_collinear() {
        let a = seq(&[(1.0, 0), (2.0, 5)], true, true, Interpolation::Step);
        let b = seq(&[(2.0, 5), (3.0, 10)], false, true, Interpolation::Step);
        let set = SequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(set.num_sequences(), 1);
        assert_eq!(set.value_at(t(3)), Some(Value::Float(1.0)));
        assert_eq!(set.value_at(t(7)), Some(Value::Float(2.0)));
    }

    #[test]
    fn test_jump_is_kept() {
        let a = seq(&[(0.0, 0), (5.0, 5)], true, false, Interpolation::Linear);
        let b = seq(&[(9.0, 5), (10.0, 10)], true, true, Interpolation::Linear);
        let set = SequenceSet::make(vec![a, b], true).unwrap();
        assert_eq!(set.num_sequences(), 2);
    }

    #[test]
    fn test_sequence_at_and_instant_n() {
        let a = seq(&[(1.0, 0), (2.0, 5)], true, false, Interpolation::Linear);
        let b = seq(&[(3.0, 10), (4.0, 20)], false, true, Interpolation::Linear);
        let set = SequenceSet::make(vec![a, b], true).unwrap();
        assert!(set.sequence_at(t(5)).is_none());
        assert!(set.sequence_at(t(10)).is_none());
        assert_eq!(set.sequence_at(t(15)).map(Sequence::start_timestamp), Some(t(10)));
        assert_eq!(set.instant_n(2).map(Instant::timestamp), Some(t(10)));
        assert!(set.instant_n(4).is_none());
    }
}
