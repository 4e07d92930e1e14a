//! Temporal operators built on lifting: arithmetic, comparison, boolean
//! logic, ever/always equality and time-weighted aggregates.

use super::lifting::{LiftedFunction, lift_base, lift_temporal, map_values};
use crate::error::{Result, TemporalError};
use crate::temporal::instant::Instant;
use crate::temporal::segment;
use crate::temporal::{Interpolation, Temporal};
use std::cmp::Ordering;
use tempora_types::time::Timestamp;
use tempora_types::value::{BaseKind, Value};

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Binary arithmetic operators on temporal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Comparison operators producing temporal booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            Comparison::Eq => ord == Ordering::Equal,
            Comparison::Ne => ord != Ordering::Equal,
            Comparison::Lt => ord == Ordering::Less,
            Comparison::Le => ord != Ordering::Greater,
            Comparison::Gt => ord == Ordering::Greater,
            Comparison::Ge => ord != Ordering::Less,
        }
    }

    fn is_ordering(self) -> bool {
        !matches!(self, Comparison::Eq | Comparison::Ne)
    }
}

fn require_numeric(kind: BaseKind) -> Result<()> {
    if kind.is_numeric() {
        Ok(())
    } else {
        Err(TemporalError::UnsupportedKind(kind))
    }
}

fn require_bool(kind: BaseKind) -> Result<()> {
    if kind == BaseKind::Bool {
        Ok(())
    } else {
        Err(TemporalError::UnsupportedKind(kind))
    }
}

fn arithmetic_kind(a: BaseKind, b: BaseKind) -> BaseKind {
    if a == BaseKind::Int && b == BaseKind::Int {
        BaseKind::Int
    } else {
        BaseKind::Float
    }
}

fn number(v: &Value) -> f64 {
    v.as_f64().unwrap_or(0.0)
}

fn apply_arithmetic(op: ArithmeticOp, a: &Value, b: &Value) -> Value {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        return Value::Int(match op {
            ArithmeticOp::Add => x.saturating_add(*y),
            ArithmeticOp::Sub => x.saturating_sub(*y),
            ArithmeticOp::Mul => x.saturating_mul(*y),
            ArithmeticOp::Div => x.checked_div(*y).unwrap_or(0),
        });
    }
    let (x, y) = (number(a), number(b));
    Value::Float(match op {
        ArithmeticOp::Add => x + y,
        ArithmeticOp::Sub => x - y,
        ArithmeticOp::Mul => x * y,
        ArithmeticOp::Div => x / y,
    })
}

/// Halfway between the zeros of two linear segments.
///
/// The product of the segments peaks or bottoms out there. A quotient is
/// monotone on a segment, but it is not linear, so the same instant is added
/// as an exact sample.
fn arithmetic_turning_point(a1: &Instant, a2: &Instant, b1: &Instant, b2: &Instant) -> Option<Timestamp> {
    let (x1, x2, y1, y2) = (number(a1.value()), number(a2.value()), number(b1.value()), number(b2.value()));
    let (dx, dy) = (x2 - x1, y2 - y1);
    // d/df (x1 + f dx)(y1 + f dy) = 0, halfway between the two zeros
    let denom = 2.0 * dx * dy;
    if denom == 0.0 {
        return None;
    }
    let f = -(x1 * dy + y1 * dx) / denom;
    if f <= segment::EPSILON || f >= 1.0 - segment::EPSILON {
        return None;
    }
    let t = segment::timestamp_at(a1.timestamp(), a2.timestamp(), f);
    (t > a1.timestamp() && t < a2.timestamp()).then_some(t)
}

fn arithmetic_function(op: ArithmeticOp, result_kind: BaseKind) -> LiftedFunction {
    let func = LiftedFunction::new(result_kind, move |a, b, _| apply_arithmetic(op, a, b)).linear(true);
    if matches!(op, ArithmeticOp::Mul | ArithmeticOp::Div) {
        func.with_turning_point(arithmetic_turning_point)
    } else {
        func
    }
}

fn is_zero(v: &Value) -> bool {
    v.as_f64() == Some(0.0)
}

fn zero_of(kind: BaseKind) -> Value {
    match kind {
        BaseKind::Int => Value::Int(0),
        _ => Value::Float(0.0),
    }
}

/// Pointwise arithmetic between two temporal numbers over their common time.
///
/// Division fails when the divisor is zero anywhere on the common time.
///
/// # Examples
///
/// ```
/// use tempora::compute::ops::{ArithmeticOp, arithmetic};
/// use tempora::{Instant, Interpolation, Sequence, Temporal, Timestamp, Value};
///
/// let t = Timestamp::from_secs;
/// let a = Temporal::from(Sequence::make(
///     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
///     true, true, Interpolation::Linear, true,
/// )?);
/// let b = Temporal::from(Instant::new(2.0, t(5))?);
/// let sum = arithmetic(&a, &b, ArithmeticOp::Add)?.unwrap();
/// assert_eq!(sum.value_at(t(5)), Some(Value::Float(7.0)));
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn arithmetic(a: &Temporal, b: &Temporal, op: ArithmeticOp) -> Result<Option<Temporal>> {
    require_numeric(a.kind())?;
    require_numeric(b.kind())?;
    let result_kind = arithmetic_kind(a.kind(), b.kind());
    if op == ArithmeticOp::Div {
        let common = a.at_period_set(&b.time()).and_then(|_| b.at_period_set(&a.time()));
        if let Some(divisor) = common
            && divisor.at_value(&zero_of(divisor.kind())).is_some()
        {
            return Err(TemporalError::InvalidValue("division by zero".to_string()));
        }
    }
    Ok(lift_temporal(a, b, &arithmetic_function(op, result_kind)))
}

/// Pointwise arithmetic between a temporal number and a constant.
///
/// With `value_first` the constant is the left operand.
pub fn arithmetic_value(temp: &Temporal, value: &Value, op: ArithmeticOp, value_first: bool) -> Result<Temporal> {
    require_numeric(temp.kind())?;
    require_numeric(value.kind())?;
    if op == ArithmeticOp::Div {
        let divides_by_zero = if value_first {
            temp.at_value(&zero_of(temp.kind())).is_some()
        } else {
            is_zero(value)
        };
        if divides_by_zero {
            return Err(TemporalError::InvalidValue("division by zero".to_string()));
        }
    }
    let result_kind = arithmetic_kind(temp.kind(), value.kind());
    lift_base(temp, value, &arithmetic_function(op, result_kind), value_first).ok_or(TemporalError::EmptyInput)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

fn comparison_function(cmp: Comparison) -> LiftedFunction {
    LiftedFunction::new(BaseKind::Bool, move |a, b, _| {
        Value::Bool(cmp.holds(compare_values(a, b)))
    })
    .discontinuous(true)
}

fn check_comparable(a: BaseKind, b: BaseKind, cmp: Comparison) -> Result<()> {
    if cmp.is_ordering() && (a == BaseKind::Point || b == BaseKind::Point) {
        return Err(TemporalError::UnsupportedKind(BaseKind::Point));
    }
    if a != b && !(a.is_numeric() && b.is_numeric()) {
        return Err(TemporalError::IncompatibleOperands(format!(
            "cannot compare {} with {}",
            a, b
        )));
    }
    Ok(())
}

/// Temporal comparison of two temporal values, true where `a cmp b` holds.
pub fn compare(a: &Temporal, b: &Temporal, cmp: Comparison) -> Result<Option<Temporal>> {
    check_comparable(a.kind(), b.kind(), cmp)?;
    Ok(lift_temporal(a, b, &comparison_function(cmp)))
}

/// Temporal comparison against a constant, true where `temp cmp value` holds.
pub fn compare_value(temp: &Temporal, value: &Value, cmp: Comparison) -> Result<Temporal> {
    check_comparable(temp.kind(), value.kind(), cmp)?;
    lift_base(temp, value, &comparison_function(cmp), false).ok_or(TemporalError::EmptyInput)
}

fn boolean_function(and: bool) -> LiftedFunction {
    LiftedFunction::new(BaseKind::Bool, move |a, b, _| {
        let (x, y) = (a.as_bool().unwrap_or(false), b.as_bool().unwrap_or(false));
        Value::Bool(if and { x && y } else { x || y })
    })
}

pub fn and(a: &Temporal, b: &Temporal) -> Result<Option<Temporal>> {
    require_bool(a.kind())?;
    require_bool(b.kind())?;
    Ok(lift_temporal(a, b, &boolean_function(true)))
}

pub fn or(a: &Temporal, b: &Temporal) -> Result<Option<Temporal>> {
    require_bool(a.kind())?;
    require_bool(b.kind())?;
    Ok(lift_temporal(a, b, &boolean_function(false)))
}

pub fn and_value(temp: &Temporal, value: bool) -> Result<Temporal> {
    require_bool(temp.kind())?;
    lift_base(temp, &Value::Bool(value), &boolean_function(true), false).ok_or(TemporalError::EmptyInput)
}

pub fn or_value(temp: &Temporal, value: bool) -> Result<Temporal> {
    require_bool(temp.kind())?;
    lift_base(temp, &Value::Bool(value), &boolean_function(false), false).ok_or(TemporalError::EmptyInput)
}

pub fn not(temp: &Temporal) -> Result<Temporal> {
    require_bool(temp.kind())?;
    map_values(temp, BaseKind::Bool, false, |v| {
        Value::Bool(!v.as_bool().unwrap_or(false))
    })
}

/// Does the value ever equal `value`?
pub fn ever_eq(temp: &Temporal, value: &Value) -> bool {
    temp.at_value(value).is_some()
}

/// Does the value equal `value` at every time it is defined?
pub fn always_eq(temp: &Temporal, value: &Value) -> bool {
    value.kind() == temp.kind() && temp.minus_value(value).is_none()
}

/// Area under a temporal number, in value-seconds.
///
/// Discrete values and instantaneous sequences have no area.
pub fn integral(temp: &Temporal) -> Result<f64> {
    require_numeric(temp.kind())?;
    let mut total = 0.0;
    for seq in temp.sequences() {
        for w in seq.instants().windows(2) {
            let dt = w[1].timestamp().micros_since(w[0].timestamp()) as f64 / MICROS_PER_SEC;
            let (v1, v2) = (number(w[0].value()), number(w[1].value()));
            total += match seq.interpolation() {
                Interpolation::Step => v1 * dt,
                Interpolation::Linear => (v1 + v2) / 2.0 * dt,
            };
        }
    }
    Ok(total)
}

/// Time-weighted average of a temporal number.
///
/// Values without duration average their instant values.
///
/// # Examples
///
/// ```
/// use tempora::compute::ops::twavg;
/// use tempora::{Instant, Interpolation, Sequence, Temporal, Timestamp};
///
/// let t = Timestamp::from_secs;
/// let seq = Temporal::from(Sequence::make(
///     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
///     true, true, Interpolation::Linear, true,
/// )?);
/// assert_eq!(twavg(&seq)?, 5.0);
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn twavg(temp: &Temporal) -> Result<f64> {
    require_numeric(temp.kind())?;
    let duration = temp.duration();
    if duration == 0 {
        let instants = temp.instants();
        let sum: f64 = instants.iter().map(|i| number(i.value())).sum();
        return Ok(sum / instants.len() as f64);
    }
    Ok(integral(temp)? / (duration as f64 / MICROS_PER_SEC))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::instant_set::InstantSet;
    use crate::temporal::sequence::Sequence;
    use tempora_types::time::Period;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    fn linear(points: &[(f64, i64)]) -> Temporal {
        let instants = points
            .iter()
            .map(|&(v, s)| Instant::new(v, t(s)).unwrap())
            .collect();
        Temporal::Sequence(
            Sequence::make(instants, true, true, Interpolation::Linear, true).unwrap(),
        )
    }

    #[test]
    fn test_add_and_sub() {
        let a = linear(&[(0.0, 0), (10.0, 10)]);
        let b = linear(&[(5.0, 0), (5.0, 10)]);
        let sum = arithmetic(&a, &b, ArithmeticOp::Add).unwrap().unwrap();
        assert_eq!(sum.value_at(t(2)), Some(Value::Float(7.0)));
        let diff = arithmetic_value(&a, &Value::Float(10.0), ArithmeticOp::Sub, true).unwrap();
        assert_eq!(diff.value_at(t(4)), Some(Value::Float(6.0)));
    }

    #[test]
    fn test_integer_arithmetic_stays_integer() {
        let a = Temporal::InstantSet(
            InstantSet::make(
                vec![Instant::new(2, t(1)).unwrap(), Instant::new(3, t(2)).unwrap()],
                false,
            )
            .unwrap(),
        );
        let doubled = arithmetic_value(&a, &Value::Int(2), ArithmeticOp::Mul, false).unwrap();
        assert_eq!(doubled.kind(), BaseKind::Int);
        assert_eq!(doubled.value_at(t(2)), Some(Value::Int(6)));
    }

    #[test]
    fn test_product_turning_point() {
        let a = linear(&[(-1.0, 0), (1.0, 10)]);
        let square = arithmetic(&a, &a, ArithmeticOp::Mul).unwrap().unwrap();
        assert_eq!(square.value_at(t(5)), Some(Value::Float(0.0)));
        assert_eq!(square.min_value(), &Value::Float(0.0));
    }

    #[test]
    fn test_quotient_sampled_between_zeros() {
        // numerator crosses zero at 9s, divisor would at 10.5s
        let a = linear(&[(-9.0, 0), (1.0, 10)]);
        let b = linear(&[(-21.0, 0), (-1.0, 10)]);
        let ratio = arithmetic(&a, &b, ArithmeticOp::Div).unwrap().unwrap();
        let sample = Timestamp::from_micros(9_750_000);
        assert_eq!(ratio.timestamps(), vec![t(0), sample, t(10)]);
        let at_sample = ratio.value_at(sample).and_then(|v| v.as_f64()).unwrap();
        assert!((at_sample + 0.5).abs() < 1e-9);
        assert_eq!(ratio.max_value(), &Value::Float(-9.0 / -21.0));
        assert_eq!(ratio.min_value(), &Value::Float(-1.0));

        // no sample when the zeros fall outside the segment
        let c = linear(&[(1.0, 0), (2.0, 10)]);
        let d = linear(&[(1.0, 0), (4.0, 10)]);
        let ratio = arithmetic(&c, &d, ArithmeticOp::Div).unwrap().unwrap();
        assert_eq!(ratio.timestamps(), vec![t(0), t(10)]);
    }

    #[test]
    fn test_division_by_zero() {
        let a = linear(&[(1.0, 0), (2.0, 10)]);
        let crosses_zero = linear(&[(-1.0, 0), (1.0, 10)]);
        assert!(arithmetic(&a, &crosses_zero, ArithmeticOp::Div).is_err());
        assert!(arithmetic_value(&a, &Value::Float(0.0), ArithmeticOp::Div, false).is_err());
        assert!(arithmetic_value(&crosses_zero, &Value::Float(1.0), ArithmeticOp::Div, true).is_err());
        let half = arithmetic_value(&a, &Value::Float(2.0), ArithmeticOp::Div, false).unwrap();
        assert_eq!(half.value_at(t(10)), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_comparison_at_crossing() {
        let a = linear(&[(0.0, 0), (10.0, 10)]);
        let b = linear(&[(10.0, 0), (0.0, 10)]);
        let le = compare(&a, &b, Comparison::Le).unwrap().unwrap();
        let truth = le.at_value(&Value::Bool(true)).unwrap();
        assert_eq!(truth.period(), Period::new(t(0), t(5), true, true).unwrap());
        let eq = compare(&a, &b, Comparison::Eq).unwrap().unwrap();
        let equal = eq.at_value(&Value::Bool(true)).unwrap();
        assert_eq!(equal.timestamps(), vec![t(5)]);
        assert!(compare(&a, &Temporal::Instant(Instant::new("x", t(1)).unwrap()), Comparison::Eq).is_err());
    }

    #[test]
    fn test_boolean_ops() {
        let instants = vec![
            Instant::new(true, t(0)).unwrap(),
            Instant::new(false, t(5)).unwrap(),
            Instant::new(false, t(10)).unwrap(),
        ];
        let flag = Temporal::Sequence(
            Sequence::make(instants, true, true, Interpolation::Step, true).unwrap(),
        );
        let negated = not(&flag).unwrap();
        assert_eq!(negated.value_at(t(7)), Some(Value::Bool(true)));
        let both = and(&flag, &negated).unwrap().unwrap();
        assert!(always_eq(&both, &Value::Bool(false)));
        let either = or(&flag, &negated).unwrap().unwrap();
        assert!(always_eq(&either, &Value::Bool(true)));
        assert!(ever_eq(&flag, &Value::Bool(false)));
        assert_eq!(and_value(&flag, false).unwrap().values(), vec![Value::Bool(false)]);
        assert!(not(&linear(&[(0.0, 0), (1.0, 1)])).is_err());
    }

    #[test]
    fn test_integral_and_twavg() {
        let a = linear(&[(0.0, 0), (10.0, 10)]);
        assert_eq!(integral(&a).unwrap(), 50.0);
        assert_eq!(twavg(&a).unwrap(), 5.0);
        let inst = Temporal::Instant(Instant::new(4, t(0)).unwrap());
        assert_eq!(twavg(&inst).unwrap(), 4.0);
        assert_eq!(integral(&inst).unwrap(), 0.0);
    }
}
