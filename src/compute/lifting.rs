//! Lifting of base-value functions to temporal values.
//!
//! A [`LiftedFunction`] wraps a function over base values together with the
//! metadata needed to apply it pointwise over time: the result kind, whether
//! the result may be interpolated linearly, whether it can jump where the
//! operands are equal, and an optional hook locating interior extrema.

use super::sync::synchronize;
use crate::error::{Result, TemporalError};
use crate::temporal::instant::Instant;
use crate::temporal::instant_set::InstantSet;
use crate::temporal::segment;
use crate::temporal::sequence::Sequence;
use crate::temporal::{Granularity, Interpolation, Temporal};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tempora_types::time::Timestamp;
use tempora_types::value::{BaseKind, Value};

/// A function of two base values and up to two extra parameters.
pub type BaseFn = dyn Fn(&Value, &Value, &[Value]) -> Value + Send + Sync;

/// Locates an extremum strictly inside two synchronized segments
/// `(a1 -> a2)` and `(b1 -> b2)`.
pub type TurningPointFn =
    dyn Fn(&Instant, &Instant, &Instant, &Instant) -> Option<Timestamp> + Send + Sync;

/// A base function plus the metadata that drives its temporal lifting.
#[derive(Clone)]
pub struct LiftedFunction {
    func: Arc<BaseFn>,
    params: SmallVec<[Value; 2]>,
    result_kind: BaseKind,
    linear: bool,
    discontinuous: bool,
    turning_point: Option<Arc<TurningPointFn>>,
}

impl fmt::Debug for LiftedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiftedFunction")
            .field("arity", &self.arity())
            .field("result_kind", &self.result_kind)
            .field("linear", &self.linear)
            .field("discontinuous", &self.discontinuous)
            .field("turning_point", &self.turning_point.is_some())
            .finish()
    }
}

impl LiftedFunction {
    /// A function producing values of `result_kind`, interpolated with step
    /// semantics and continuous in its arguments.
    pub fn new<F>(result_kind: BaseKind, func: F) -> Self
    where
        F: Fn(&Value, &Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            params: SmallVec::new(),
            result_kind,
            linear: false,
            discontinuous: false,
            turning_point: None,
        }
    }

    /// Adds an extra parameter passed on every call.
    ///
    /// # Panics
    ///
    /// Panics when the function already carries two parameters.
    pub fn with_param(mut self, param: impl Into<Value>) -> Self {
        assert!(self.params.len() < 2, "a lifted function takes at most two parameters");
        self.params.push(param.into());
        self
    }

    /// Linear inputs give a linear result when the result kind is continuous.
    pub fn linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    /// The result may change value exactly where the operands cross.
    pub fn discontinuous(mut self, discontinuous: bool) -> Self {
        self.discontinuous = discontinuous;
        self
    }

    pub fn with_turning_point<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instant, &Instant, &Instant, &Instant) -> Option<Timestamp> + Send + Sync + 'static,
    {
        self.turning_point = Some(Arc::new(hook));
        self
    }

    /// Number of arguments including extra parameters: 2, 3 or 4.
    pub fn arity(&self) -> usize {
        2 + self.params.len()
    }

    pub fn result_kind(&self) -> BaseKind {
        self.result_kind
    }

    pub fn is_linear(&self) -> bool {
        self.linear
    }

    pub fn is_discontinuous(&self) -> bool {
        self.discontinuous
    }

    /// Applies the base function.
    ///
    /// # Panics
    ///
    /// Panics in debug builds when the function returns a value of another
    /// kind than declared.
    pub fn apply(&self, a: &Value, b: &Value) -> Value {
        let result = (self.func)(a, b, &self.params);
        debug_assert_eq!(
            result.kind(),
            self.result_kind,
            "lifted function returned a {} value, declared {}",
            result.kind(),
            self.result_kind
        );
        result
    }
}

/// Applies `func` to every value, keeping timestamps and bounds.
///
/// With `linear` set, `func` is taken to be affine: a linear input of a
/// continuous `result_kind` stays linear. Otherwise the result uses step
/// interpolation, which only holds when the input does not vary between its
/// instants. A linear input with a non-linear map is rejected with
/// [`TemporalError::IncompatibleOperands`], since the times where the mapped
/// value changes are unknown.
pub fn map_values<F>(temp: &Temporal, result_kind: BaseKind, linear: bool, func: F) -> Result<Temporal>
where
    F: Fn(&Value) -> Value,
{
    let keeps_linear = linear && result_kind.is_continuous();
    if temp.is_linear() && !keeps_linear {
        return Err(TemporalError::IncompatibleOperands(format!(
            "a non-linear map to {} cannot follow a linear {} value between instants",
            result_kind,
            temp.kind()
        )));
    }
    let map_instant = |i: &Instant| i.with_value(func(i.value()));
    let map_sequence = |s: &Sequence| {
        let instants = s.instants().iter().map(map_instant).collect();
        Sequence::build(instants, s.lower_inc(), s.upper_inc(), s.interpolation(), true)
    };
    let mapped = match temp {
        Temporal::Instant(i) => Temporal::Instant(map_instant(i)),
        Temporal::InstantSet(s) => {
            Temporal::InstantSet(InstantSet::from_sorted(s.instants().iter().map(map_instant).collect()))
        }
        Temporal::Sequence(s) => Temporal::Sequence(map_sequence(s)),
        Temporal::SequenceSet(set) => {
            let pieces = set.sequences().iter().map(map_sequence).collect();
            Temporal::from_pieces(pieces, true).ok_or(TemporalError::EmptyInput)?
        }
    };
    Ok(mapped)
}

/// Applies a lifted function between a temporal value and a constant.
///
/// With `value_first` the constant is the function's first argument.
/// Returns `None` only when the lifting leaves no piece of the value.
pub fn lift_base(temp: &Temporal, value: &Value, func: &LiftedFunction, value_first: bool) -> Option<Temporal> {
    let apply = |v: &Value| {
        if value_first {
            func.apply(value, v)
        } else {
            func.apply(v, value)
        }
    };
    match temp {
        Temporal::Instant(i) => Some(Temporal::Instant(i.with_value(apply(i.value())))),
        Temporal::InstantSet(s) => Some(Temporal::InstantSet(InstantSet::from_sorted(
            s.instants().iter().map(|i| i.with_value(apply(i.value()))).collect(),
        ))),
        _ => {
            let mut pieces = Vec::new();
            for seq in temp.sequences() {
                pieces.extend(lift_sequence_base(seq, value, func, value_first));
            }
            let as_set = temp.granularity() == Granularity::SequenceSet;
            Temporal::from_pieces(pieces, as_set)
        }
    }
}

/// Applies a lifted function between two temporal values over their common time.
///
/// Returns `None` when they share no time.
///
/// # Examples
///
/// ```
/// use tempora::compute::lifting::{LiftedFunction, lift_temporal};
/// use tempora::{BaseKind, Instant, Interpolation, Sequence, Temporal, Timestamp, Value};
///
/// let t = Timestamp::from_secs;
/// let a = Temporal::from(Sequence::make(
///     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
///     true, true, Interpolation::Linear, true,
/// )?);
/// let larger = LiftedFunction::new(BaseKind::Float, |x, y, _| {
///     Value::Float(x.as_f64().unwrap_or(0.0).max(y.as_f64().unwrap_or(0.0)))
/// })
/// .linear(true);
/// let same = lift_temporal(&a, &a, &larger).unwrap();
/// assert_eq!(same.value_at(t(4)), Some(Value::Float(4.0)));
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn lift_temporal(a: &Temporal, b: &Temporal, func: &LiftedFunction) -> Option<Temporal> {
    let (sa, sb) = synchronize(a, b, func.discontinuous)?;
    match (&sa, &sb) {
        (Temporal::Instant(x), Temporal::Instant(y)) => {
            Some(Temporal::Instant(x.with_value(func.apply(x.value(), y.value()))))
        }
        (Temporal::InstantSet(x), Temporal::InstantSet(y)) => {
            let instants = x
                .instants()
                .iter()
                .zip(y.instants())
                .map(|(i, j)| i.with_value(func.apply(i.value(), j.value())))
                .collect();
            Some(Temporal::InstantSet(InstantSet::from_sorted(instants)))
        }
        _ => {
            let mut pieces = Vec::new();
            for (p, q) in sa.sequences().iter().zip(sb.sequences()) {
                let (p, q) = with_turning_points(p, q, func);
                pieces.extend(lift_synced(&p, &q, func));
            }
            Temporal::from_pieces(pieces, sa.granularity() == Granularity::SequenceSet)
        }
    }
}

fn lift_sequence_base(
    seq: &Sequence,
    value: &Value,
    func: &LiftedFunction,
    value_first: bool,
) -> Vec<Sequence> {
    let mut times: Vec<Timestamp> = Vec::new();
    if func.discontinuous && seq.is_linear() {
        times.extend(
            seq.instants()
                .windows(2)
                .filter_map(|w| segment::value_crossing(&w[0], &w[1], value)),
        );
    }
    let resampled = if times.is_empty() {
        seq.clone()
    } else {
        times.extend(seq.timestamps());
        times.sort_unstable();
        times.dedup();
        seq.resample(&times, seq.lower_inc(), seq.upper_inc())
    };
    let constant = Sequence::build(
        resampled
            .instants()
            .iter()
            .map(|i| i.with_value(value.clone()))
            .collect(),
        resampled.lower_inc(),
        resampled.upper_inc(),
        Interpolation::Step,
        false,
    );
    if value_first {
        let (c, s) = with_turning_points(&constant, &resampled, func);
        lift_synced(&c, &s, func)
    } else {
        let (s, c) = with_turning_points(&resampled, &constant, func);
        lift_synced(&s, &c, func)
    }
}

/// Adds the interior instants reported by the function's turning-point hook.
fn with_turning_points(p: &Sequence, q: &Sequence, func: &LiftedFunction) -> (Sequence, Sequence) {
    let Some(hook) = &func.turning_point else {
        return (p.clone(), q.clone());
    };
    let (pi, qi) = (p.instants(), q.instants());
    let mut times: Vec<Timestamp> = (0..pi.len().saturating_sub(1))
        .filter_map(|k| hook(&pi[k], &pi[k + 1], &qi[k], &qi[k + 1]))
        .filter(|&t| t > p.start_timestamp() && t < p.end_timestamp())
        .collect();
    if times.is_empty() {
        return (p.clone(), q.clone());
    }
    times.extend(p.timestamps());
    times.sort_unstable();
    times.dedup();
    (
        p.resample(&times, p.lower_inc(), p.upper_inc()),
        q.resample(&times, q.lower_inc(), q.upper_inc()),
    )
}

/// Collects result instants into sequences, closing a piece wherever the
/// result jumps.
struct PieceBuilder {
    interp: Interpolation,
    lower_inc: bool,
    current: Vec<Instant>,
    pieces: Vec<Sequence>,
}

impl PieceBuilder {
    fn new(interp: Interpolation, lower_inc: bool) -> Self {
        Self {
            interp,
            lower_inc,
            current: Vec::new(),
            pieces: Vec::new(),
        }
    }

    fn push(&mut self, value: Value, t: Timestamp) {
        if let Some(last) = self.current.last()
            && last.timestamp() == t
        {
            return;
        }
        self.current.push(Instant::from_parts(value, t));
    }

    fn close(&mut self, upper_inc: bool, next_lower_inc: bool) {
        if !self.current.is_empty() {
            let instants = std::mem::take(&mut self.current);
            self.pieces
                .push(Sequence::build(instants, self.lower_inc, upper_inc, self.interp, true));
        }
        self.lower_inc = next_lower_inc;
    }

    fn finish(self) -> Vec<Sequence> {
        self.pieces
    }
}

/// Value of a synchronized sequence halfway through segment `k`.
fn midpoint(seq: &Sequence, k: usize) -> Value {
    let (a, b) = (&seq.instants()[k], &seq.instants()[k + 1]);
    if seq.is_linear() {
        a.value().interpolate(b.value(), 0.5).unwrap_or_else(|| a.value_copy())
    } else {
        a.value_copy()
    }
}

/// Left limit at the end of segment `k`.
fn left_limit(seq: &Sequence, k: usize) -> &Value {
    if seq.is_linear() {
        seq.instants()[k + 1].value()
    } else {
        seq.instants()[k].value()
    }
}

/// Applies `func` over two sequences sharing the same timestamps and bounds.
fn lift_synced(p: &Sequence, q: &Sequence, func: &LiftedFunction) -> Vec<Sequence> {
    let (pi, qi) = (p.instants(), q.instants());
    let n = pi.len();
    let linear = func.linear && func.result_kind.is_continuous() && (p.is_linear() || q.is_linear());
    let interp = if linear {
        Interpolation::Linear
    } else {
        Interpolation::Step
    };
    let mut builder = PieceBuilder::new(interp, p.lower_inc());
    let at = |k: usize| func.apply(pi[k].value(), qi[k].value());

    if n == 1 {
        builder.push(at(0), pi[0].timestamp());
        builder.close(true, true);
        return builder.finish();
    }

    if linear {
        for k in 0..n - 1 {
            let t_next = pi[k + 1].timestamp();
            builder.push(at(k), pi[k].timestamp());
            let limit = func.apply(left_limit(p, k), left_limit(q, k));
            let next = at(k + 1);
            if limit == next {
                builder.push(next, t_next);
                continue;
            }
            builder.push(limit, t_next);
            builder.close(false, true);
            if k == n - 2 && p.upper_inc() {
                builder.push(next, t_next);
                builder.close(true, true);
            }
        }
        builder.close(p.upper_inc(), true);
        return builder.finish();
    }

    let varies_inside = func.discontinuous || p.is_linear() || q.is_linear();
    let inside_of = |k: usize| {
        if varies_inside {
            func.apply(&midpoint(p, k), &midpoint(q, k))
        } else {
            at(k)
        }
    };
    for k in 0..n - 1 {
        let t_k = pi[k].timestamp();
        let value = at(k);
        let inside = inside_of(k);
        if value == inside {
            builder.push(value, t_k);
        } else if k == 0 && !p.lower_inc() {
            builder.push(inside, t_k);
        } else {
            builder.push(value, t_k);
            builder.close(true, false);
            builder.push(inside, t_k);
        }
    }
    let t_end = pi[n - 1].timestamp();
    let inside = inside_of(n - 2);
    let last = at(n - 1);
    if p.upper_inc() && last != inside {
        builder.push(inside, t_end);
        builder.close(false, true);
        builder.push(last, t_end);
        builder.close(true, true);
    } else if p.upper_inc() {
        builder.push(last, t_end);
        builder.close(true, true);
    } else {
        builder.push(inside, t_end);
        builder.close(false, true);
    }
    builder.finish()
}
