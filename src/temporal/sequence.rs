use super::Interpolation;
use super::instant::{Instant, bbox_of, check_compatible, check_homogeneous};
use super::segment;
use crate::error::{Result, TemporalError};
use crate::validation::{DefaultValidator, ValueValidator};
use log::debug;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use tempora_types::bbox::BoundingBox;
use tempora_types::time::{Period, PeriodSet, Timestamp};
use tempora_types::value::{BaseKind, Value};

/// A contiguous run of instants over a period, interpolated between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    instants: Vec<Instant>,
    period: Period,
    interp: Interpolation,
    bbox: BoundingBox,
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instants.hash(state);
        self.period.hash(state);
        self.interp.hash(state);
    }
}

impl Sequence {
    /// Builds a sequence from instants with strictly increasing timestamps.
    ///
    /// A single instant always yields an inclusive instantaneous sequence. A
    /// step sequence with an exclusive upper bound must repeat its
    /// penultimate value at the end. With `normalize`, instants that do not
    /// change the represented function are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempora::{Instant, Interpolation, Sequence, Timestamp, Value};
    ///
    /// let t = Timestamp::from_secs;
    /// let seq = Sequence::make(
    ///     vec![Instant::new(0.0, t(0))?, Instant::new(5.0, t(5))?, Instant::new(10.0, t(10))?],
    ///     true,
    ///     true,
    ///     Interpolation::Linear,
    ///     true,
    /// )?;
    /// // the middle instant is collinear with its neighbours
    /// assert_eq!(seq.num_instants(), 2);
    /// assert_eq!(seq.value_at(t(4)), Some(Value::Float(4.0)));
    /// # Ok::<(), tempora::TemporalError>(())
    /// ```
    pub fn make(
        instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
    ) -> Result<Self> {
        Self::make_with(
            instants,
            lower_inc,
            upper_inc,
            interp,
            normalize,
            &DefaultValidator,
        )
    }

    pub fn make_with(
        instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
        validator: &dyn ValueValidator,
    ) -> Result<Self> {
        let kind = check_homogeneous(&instants)?;
        validator.validate_count(instants.len())?;
        for inst in &instants {
            validator.validate(inst.value())?;
        }
        if interp == Interpolation::Linear && !kind.is_continuous() {
            return Err(TemporalError::IncompatibleOperands(format!(
                "linear interpolation is not defined for {} values",
                kind
            )));
        }
        for w in instants.windows(2) {
            if w[0].timestamp() >= w[1].timestamp() {
                return Err(TemporalError::UnorderedTimestamps {
                    prev: w[0].timestamp(),
                    next: w[1].timestamp(),
                });
            }
        }
        let n = instants.len();
        if n == 1 && !(lower_inc && upper_inc) {
            debug!(
                "instantaneous sequence at {} forced to inclusive bounds",
                instants[0].timestamp()
            );
        }
        if n > 1
            && interp == Interpolation::Step
            && !upper_inc
            && instants[n - 1].value() != instants[n - 2].value()
        {
            return Err(TemporalError::InconsistentBounds(format!(
                "step sequence with exclusive upper bound must end with its previous value, got {} after {}",
                instants[n - 1].value(),
                instants[n - 2].value()
            )));
        }
        Ok(Self::build(instants, lower_inc, upper_inc, interp, normalize))
    }

    /// Builds a sequence from instants already known to be valid.
    ///
    /// Enforces the instantaneous and step-upper-bound invariants by
    /// adjusting the input instead of rejecting it.
    pub(crate) fn build(
        mut instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
    ) -> Self {
        debug_assert!(!instants.is_empty());
        let n = instants.len();
        let (lower_inc, upper_inc) = if n == 1 {
            (true, true)
        } else {
            (lower_inc, upper_inc)
        };
        if n > 1 && interp == Interpolation::Step && !upper_inc {
            let prev = instants[n - 2].value_copy();
            if instants[n - 1].value() != &prev {
                instants[n - 1] = instants[n - 1].with_value(prev);
            }
        }
        if normalize && n > 2 {
            instants = normalize_instants(instants, interp);
        }
        let first = instants[0].timestamp();
        let last = instants[instants.len() - 1].timestamp();
        let period = Period::new(first, last, lower_inc, upper_inc)
            .unwrap_or_else(|_| Period::instant(first));
        let bbox = bbox_of(&instants);
        Self {
            instants,
            period,
            interp,
            bbox,
        }
    }

    /// A new sequence with `inst` added after the end, closing the upper bound.
    pub fn append(&self, inst: Instant) -> Result<Sequence> {
        self.append_with(inst, &DefaultValidator)
    }

    pub fn append_with(&self, inst: Instant, validator: &dyn ValueValidator) -> Result<Sequence> {
        check_compatible(self.instants[0].value(), inst.value())?;
        let end = self.end_timestamp();
        if inst.timestamp() <= end {
            return Err(TemporalError::UnorderedTimestamps {
                prev: end,
                next: inst.timestamp(),
            });
        }
        let mut instants = self.instants.clone();
        instants.push(inst);
        Self::make_with(instants, self.lower_inc(), true, self.interp, true, validator)
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
        self.period.lower()
    }

    pub fn end_timestamp(&self) -> Timestamp {
        self.period.upper()
    }

    pub fn lower_inc(&self) -> bool {
        self.period.lower_inc()
    }

    pub fn upper_inc(&self) -> bool {
        self.period.upper_inc()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    pub fn is_linear(&self) -> bool {
        self.interp == Interpolation::Linear
    }

    pub fn kind(&self) -> BaseKind {
        self.instants[0].kind()
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn time(&self) -> PeriodSet {
        PeriodSet::from_period(self.period)
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Duration in microseconds.
    pub fn duration(&self) -> i64 {
        self.period.duration()
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.instants.iter().map(Instant::timestamp).collect()
    }

    /// Distinct stored values in ascending order.
    pub fn values(&self) -> Vec<Value> {
        let mut values: Vec<Value> = self.instants.iter().map(Instant::value_copy).collect();
        values.sort();
        values.dedup();
        values
    }

    pub fn min_value(&self) -> &Value {
        self.instants
            .iter()
            .map(Instant::value)
            .min()
            .unwrap_or_else(|| self.instants[0].value())
    }

    pub fn max_value(&self) -> &Value {
        self.instants
            .iter()
            .map(Instant::value)
            .max()
            .unwrap_or_else(|| self.instants[0].value())
    }

    /// Value at `t`, honouring the bound flags.
    pub fn value_at(&self, t: Timestamp) -> Option<Value> {
        if !self.period.contains_timestamp(t) {
            return None;
        }
        self.value_at_inclusive(t)
    }

    /// Value at `t` treating both bounds as inclusive.
    ///
    /// Used when cutting sequences, where a bound value is needed even if
    /// the original sequence excludes it.
    pub fn value_at_inclusive(&self, t: Timestamp) -> Option<Value> {
        if t < self.start_timestamp() || t > self.end_timestamp() {
            return None;
        }
        match self.instants.binary_search_by_key(&t, Instant::timestamp) {
            Ok(i) => Some(self.instants[i].value_copy()),
            Err(i) => Some(segment::value_at(
                &self.instants[i - 1],
                &self.instants[i],
                self.interp,
                t,
            )),
        }
    }

    /// Same function sampled at `times`, which must lie within the period
    /// and be strictly increasing. No normalization is applied.
    pub(crate) fn resample(&self, times: &[Timestamp], lower_inc: bool, upper_inc: bool) -> Sequence {
        let instants = times
            .iter()
            .filter_map(|&t| {
                self.value_at_inclusive(t)
                    .map(|v| Instant::from_parts(v, t))
            })
            .collect();
        Self::build(instants, lower_inc, upper_inc, self.interp, false)
    }

    pub fn shift(&self, delta_micros: i64) -> Sequence {
        Self {
            instants: self.instants.iter().map(|i| i.shift(delta_micros)).collect(),
            period: self.period.shift(delta_micros),
            interp: self.interp,
            bbox: self.bbox.shift(delta_micros),
        }
    }

    /// Converts to step interpolation; only constant sequences qualify.
    pub fn to_step(&self) -> Result<Sequence> {
        if self.interp == Interpolation::Step {
            return Ok(self.clone());
        }
        let first = self.instants[0].value();
        if self.instants.iter().any(|i| i.value() != first) {
            return Err(TemporalError::IncompatibleOperands(
                "a varying linear sequence has no step equivalent".to_string(),
            ));
        }
        Ok(Self::build(
            self.instants.clone(),
            self.lower_inc(),
            self.upper_inc(),
            Interpolation::Step,
            true,
        ))
    }

    /// Converts to linear interpolation.
    ///
    /// Each step becomes a constant linear piece ending exclusively before the
    /// next change; a differing final value becomes an instantaneous piece.
    pub fn to_linear(&self) -> Result<Vec<Sequence>> {
        let kind = self.kind();
        if !kind.is_continuous() {
            return Err(TemporalError::UnsupportedKind(kind));
        }
        if self.interp == Interpolation::Linear {
            return Ok(vec![self.clone()]);
        }
        let n = self.instants.len();
        if n == 1 {
            return Ok(vec![Self::build(
                self.instants.clone(),
                true,
                true,
                Interpolation::Linear,
                false,
            )]);
        }
        let mut pieces = Vec::with_capacity(n);
        for i in 0..n - 1 {
            let (a, b) = (&self.instants[i], &self.instants[i + 1]);
            let lower_inc = if i == 0 { self.lower_inc() } else { true };
            let last = i == n - 2;
            let closes = last && self.upper_inc() && a.value() == b.value();
            let piece = vec![a.clone(), b.with_value(a.value_copy())];
            pieces.push(Self::build(piece, lower_inc, closes, Interpolation::Linear, false));
            if last && self.upper_inc() && !closes {
                pieces.push(Self::build(vec![b.clone()], true, true, Interpolation::Linear, false));
            }
        }
        Ok(pieces)
    }
}

/// Drops instants that do not change the represented function.
///
/// Step: an instant repeating the previous kept value. Linear: an instant
/// equal to or collinear with its neighbours.
fn normalize_instants(instants: Vec<Instant>, interp: Interpolation) -> Vec<Instant> {
    let n = instants.len();
    let mut iter = instants.into_iter();
    let mut kept: Vec<Instant> = Vec::with_capacity(n);
    let (Some(first), Some(mut middle)) = (iter.next(), iter.next()) else {
        return kept;
    };
    kept.push(first);
    for next in iter {
        let prev = &kept[kept.len() - 1];
        let redundant = match interp {
            Interpolation::Step => prev.value() == middle.value(),
            Interpolation::Linear => {
                (prev.value() == middle.value() && middle.value() == next.value())
                    || segment::collinear(prev, &middle, &next)
            }
        };
        if !redundant {
            kept.push(middle);
        }
        middle = next;
    }
    kept.push(middle);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn floats(points: &[(f64, i64)]) -> Vec<Instant> {
        points
            .iter()
            .map(|&(v, s)| Instant::new(v, t(s)).unwrap())
            .collect()
    }

    #[test]
    fn test_linear_interpolation() {
        let seq = Sequence::make(
            floats(&[(0.0, 0), (10.0, 10)]),
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        assert_eq!(seq.value_at(t(4)), Some(Value::Float(4.0)));
        assert_eq!(seq.value_at(t(11)), None);
        assert_eq!(seq.duration(), 10_000_000);
    }

    #[test]
    fn test_exclusive_bounds() {
        let seq = Sequence::make(
            floats(&[(0.0, 0), (10.0, 10)]),
            false,
            false,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        assert_eq!(seq.value_at(t(0)), None);
        assert_eq!(seq.value_at(t(10)), None);
        assert_eq!(seq.value_at_inclusive(t(10)), Some(Value::Float(10.0)));
    }

    #[test]
    fn test_rejects_unordered_and_linear_ints() {
        assert!(matches!(
            Sequence::make(
                floats(&[(0.0, 5), (1.0, 5)]),
                true,
                true,
                Interpolation::Linear,
                false
            ),
            Err(TemporalError::UnorderedTimestamps { .. })
        ));
        let ints = vec![
            Instant::new(1, t(0)).unwrap(),
            Instant::new(2, t(1)).unwrap(),
        ];
        assert!(matches!(
            Sequence::make(ints, true, true, Interpolation::Linear, false),
            Err(TemporalError::IncompatibleOperands(_))
        ));
    }

    #[test]
    fn test_step_exclusive_end_value() {
        let bad = Sequence::make(
            floats(&[(1.0, 0), (2.0, 10)]),
            true,
            false,
            Interpolation::Step,
            false,
        );
        assert!(matches!(bad, Err(TemporalError::InconsistentBounds(_))));
        let good = Sequence::make(
            floats(&[(1.0, 0), (1.0, 10)]),
            true,
            false,
            Interpolation::Step,
            false,
        )
        .unwrap();
        assert_eq!(good.value_at(t(9)), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_singleton_forces_inclusive() {
        let seq = Sequence::make(floats(&[(1.0, 3)]), false, false, Interpolation::Step, true)
            .unwrap();
        assert!(seq.lower_inc() && seq.upper_inc());
        assert_eq!(seq.value_at(t(3)), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let seq = Sequence::make(
            floats(&[(1.0, 0), (1.0, 1), (1.0, 2), (2.0, 3), (3.0, 4), (1.0, 6)]),
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        assert_eq!(seq.num_instants(), 4);
        let again = Sequence::make(
            seq.instants().to_vec(),
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        assert_eq!(again, seq);

        let step = Sequence::make(
            floats(&[(1.0, 0), (1.0, 1), (2.0, 2), (2.0, 3)]),
            true,
            true,
            Interpolation::Step,
            true,
        )
        .unwrap();
        assert_eq!(step.timestamps(), vec![t(0), t(2), t(3)]);
    }

    #[test]
    fn test_to_linear_from_step() {
        let step = Sequence::make(
            floats(&[(1.0, 0), (2.0, 5), (3.0, 10)]),
            true,
            true,
            Interpolation::Step,
            false,
        )
        .unwrap();
        let pieces = step.to_linear().unwrap();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0].value_at(t(4)), Some(Value::Float(1.0)));
        assert!(!pieces[0].upper_inc());
        assert_eq!(pieces[2].period(), Period::instant(t(10)));
        assert!(step.to_step().is_ok());
        assert!(pieces[1].to_step().is_ok());
    }

    #[test]
    fn test_append() {
        let seq = Sequence::make(
            floats(&[(0.0, 0), (5.0, 5)]),
            true,
            false,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        let longer = seq.append(Instant::new(10.0, t(10)).unwrap()).unwrap();
        assert_eq!(longer.num_instants(), 2);
        assert!(longer.upper_inc());
        assert!(seq.append(Instant::new(1.0, t(5)).unwrap()).is_err());
    }
}
