//! Interpolation math over a single segment (two consecutive instants).
//!
//! Everything here works on pairs of instants and is shared by sequence
//! evaluation, normalization, synchronization and restriction.

use super::Interpolation;
use super::instant::Instant;
use tempora_types::point::GeoPoint;
use tempora_types::time::Timestamp;
use tempora_types::value::Value;

/// Tolerance for collinearity and crossing tests.
pub(crate) const EPSILON: f64 = 1.0e-6;

/// Position of `t` within `[t1, t2]` as a fraction in `[0, 1]`.
#[inline]
pub(crate) fn fraction(t1: Timestamp, t2: Timestamp, t: Timestamp) -> f64 {
    let duration = t2.micros_since(t1);
    if duration == 0 {
        return 0.0;
    }
    t.micros_since(t1) as f64 / duration as f64
}

/// Timestamp at `fraction` of `[t1, t2]`, rounded to the nearest microsecond.
#[inline]
pub(crate) fn timestamp_at(t1: Timestamp, t2: Timestamp, fraction: f64) -> Timestamp {
    let duration = t2.micros_since(t1) as f64;
    t1.shift((duration * fraction).round() as i64)
}

/// Value of the segment `inst1 -> inst2` at `t`, with `inst1.t <= t <= inst2.t`.
///
/// Stored timestamps return the stored value unchanged.
pub(crate) fn value_at(
    inst1: &Instant,
    inst2: &Instant,
    interp: Interpolation,
    t: Timestamp,
) -> Value {
    if t == inst1.timestamp() {
        return inst1.value_copy();
    }
    if t == inst2.timestamp() {
        return inst2.value_copy();
    }
    match interp {
        Interpolation::Step => inst1.value_copy(),
        Interpolation::Linear => {
            let f = fraction(inst1.timestamp(), inst2.timestamp(), t);
            inst1
                .value()
                .interpolate(inst2.value(), f)
                .unwrap_or_else(|| inst1.value_copy())
        }
    }
}

fn float_collinear(x1: f64, x2: f64, x3: f64, ratio: f64) -> bool {
    let expected = x1 + (x3 - x1) * ratio;
    (expected - x2).abs() <= EPSILON
}

/// Does the middle instant lie on the line joining its neighbours?
pub(crate) fn collinear(inst1: &Instant, inst2: &Instant, inst3: &Instant) -> bool {
    let ratio = fraction(inst1.timestamp(), inst3.timestamp(), inst2.timestamp());
    match (inst1.value(), inst2.value(), inst3.value()) {
        (Value::Float(a), Value::Float(b), Value::Float(c)) => float_collinear(*a, *b, *c, ratio),
        (Value::Point(a), Value::Point(b), Value::Point(c)) => {
            let (ca, cb, cc) = (a.coords(), b.coords(), c.coords());
            (0..3).all(|i| float_collinear(ca[i], cb[i], cc[i], ratio))
        }
        _ => false,
    }
}

/// Approximate equality used when snapping computed values onto targets.
pub(crate) fn approx_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => (x - y).abs() <= EPSILON * (1.0 + y.abs()),
        (Value::Point(p), Value::Point(q)) => {
            let (cp, cq) = (p.coords(), q.coords());
            (0..3).all(|i| (cp[i] - cq[i]).abs() <= EPSILON * (1.0 + cq[i].abs()))
        }
        _ => a == b,
    }
}

/// Fraction strictly inside `(0, 1)` at which a point segment passes through `target`.
fn point_crossing_fraction(start: &GeoPoint, end: &GeoPoint, target: &GeoPoint) -> Option<f64> {
    let (s, e, p) = (start.coords(), end.coords(), target.coords());
    let mut fraction = None;
    for i in 0..3 {
        let d = e[i] - s[i];
        if d.abs() > EPSILON {
            fraction = Some((p[i] - s[i]) / d);
            break;
        }
    }
    let f = fraction?;
    if f <= 0.0 || f >= 1.0 {
        return None;
    }
    let reached = start.interpolate(end, f).coords();
    (0..3)
        .all(|i| (reached[i] - p[i]).abs() <= EPSILON)
        .then_some(f)
}

/// Timestamp strictly inside a linear segment where it takes `target`.
///
/// Returns `None` when the segment is constant, when `target` equals an
/// endpoint value, or when the segment never reaches it.
pub(crate) fn value_crossing(start: &Instant, end: &Instant, target: &Value) -> Option<Timestamp> {
    if start.value() == target || end.value() == target {
        return None;
    }
    let f = match (start.value(), end.value()) {
        (Value::Float(v1), Value::Float(v2)) => {
            let x = target.as_f64()?;
            let (min, max) = (v1.min(*v2), v1.max(*v2));
            if x < min || x > max || v1 == v2 {
                return None;
            }
            (x - v1) / (v2 - v1)
        }
        (Value::Point(p1), Value::Point(p2)) => point_crossing_fraction(p1, p2, target.as_point()?)?,
        _ => return None,
    };
    strictly_inside(start.timestamp(), end.timestamp(), f)
}

fn strictly_inside(t1: Timestamp, t2: Timestamp, f: f64) -> Option<Timestamp> {
    if !(f > 0.0 && f < 1.0) {
        return None;
    }
    let t = timestamp_at(t1, t2, f);
    (t > t1 && t < t2).then_some(t)
}

/// Timestamp strictly inside two synchronized linear numeric segments where they are equal.
fn number_crossing(x1: f64, x2: f64, x3: f64, x4: f64) -> Option<f64> {
    // a + f(b - a) = c + f(d - c), solved for f
    let denom = x2 - x1 - x4 + x3;
    if denom == 0.0 {
        return None;
    }
    Some((x3 - x1) / denom)
}

fn point_pair_crossing(s1: &GeoPoint, e1: &GeoPoint, s2: &GeoPoint, e2: &GeoPoint) -> Option<f64> {
    let (a, b, c, d) = (s1.coords(), e1.coords(), s2.coords(), e2.coords());
    let mut fraction = None;
    for i in 0..3 {
        if let Some(f) = number_crossing(a[i], b[i], c[i], d[i]) {
            fraction = Some(f);
            break;
        }
    }
    let f = fraction?;
    let p = s1.interpolate(e1, f).coords();
    let q = s2.interpolate(e2, f).coords();
    (0..3).all(|i| (p[i] - q[i]).abs() <= EPSILON).then_some(f)
}

/// Crossing of two synchronized segments (`start1.t == start2.t`, `end1.t == end2.t`).
///
/// A step side is treated as constant at its start value. Parallel or
/// degenerate segments have no crossing. On success returns the crossing
/// timestamp and the value of each side there.
pub(crate) fn segments_crossing(
    start1: &Instant,
    end1: &Instant,
    linear1: bool,
    start2: &Instant,
    end2: &Instant,
    linear2: bool,
) -> Option<(Timestamp, Value, Value)> {
    let (t1, t2) = (start1.timestamp(), end1.timestamp());
    match (linear1, linear2) {
        (false, false) => None,
        (false, true) => {
            let t = value_crossing(start2, end2, start1.value())?;
            let v2 = value_at(start2, end2, Interpolation::Linear, t);
            Some((t, start1.value_copy(), v2))
        }
        (true, false) => {
            let t = value_crossing(start1, end1, start2.value())?;
            let v1 = value_at(start1, end1, Interpolation::Linear, t);
            Some((t, v1, start2.value_copy()))
        }
        (true, true) => {
            let f = match (start1.value(), end1.value(), start2.value(), end2.value()) {
                (Value::Float(a), Value::Float(b), Value::Float(c), Value::Float(d)) => {
                    number_crossing(*a, *b, *c, *d)?
                }
                (Value::Point(a), Value::Point(b), Value::Point(c), Value::Point(d)) => {
                    point_pair_crossing(a, b, c, d)?
                }
                _ => return None,
            };
            if f < -EPSILON || f > 1.0 + EPSILON {
                return None;
            }
            let t = strictly_inside(t1, t2, f)?;
            Some((
                t,
                value_at(start1, end1, Interpolation::Linear, t),
                value_at(start2, end2, Interpolation::Linear, t),
            ))
        }
    }
}
