//! Synchronization of two temporal values onto a shared time base.
//!
//! After synchronization both values are defined on exactly the same
//! timestamps, so a binary function can be applied instant by instant.
//! Discrete operands reduce the result to their timestamps; two continuous
//! operands are cut to the intersection of their periods and resampled on
//! the merged timestamps of both sides.

use crate::temporal::instant::Instant;
use crate::temporal::instant_set::InstantSet;
use crate::temporal::segment;
use crate::temporal::sequence::Sequence;
use crate::temporal::sequence_set::SequenceSet;
use crate::temporal::{Granularity, Temporal};
use log::trace;
use std::cmp::Ordering;
use tempora_types::time::{Timestamp, cmp_upper_bounds};
use tempora_types::value::BaseKind;

fn crossings_defined(a: BaseKind, b: BaseKind) -> bool {
    (a.is_numeric() && b.is_numeric()) || a == b
}

/// Aligns `a` and `b` on their common time.
///
/// Returns `None` when they share no time. With `add_crossings`, instants are
/// added wherever two continuous segments cross inside their interior, so
/// that a function changing value at equality (such as a comparison) is
/// constant between consecutive instants.
///
/// # Panics
///
/// Panics if crossings are requested for base kinds that cannot be equal,
/// such as a point and a number.
///
/// # Examples
///
/// ```
/// use tempora::compute::sync::synchronize;
/// use tempora::{Instant, Interpolation, Sequence, Temporal, Timestamp, Value};
///
/// let t = Timestamp::from_secs;
/// let rising = Temporal::from(Sequence::make(
///     vec![Instant::new(0.0, t(0))?, Instant::new(10.0, t(10))?],
///     true, true, Interpolation::Linear, true,
/// )?);
/// let falling = Temporal::from(Sequence::make(
///     vec![Instant::new(10.0, t(0))?, Instant::new(0.0, t(10))?],
///     true, true, Interpolation::Linear, true,
/// )?);
/// let (a, b) = synchronize(&rising, &falling, true).unwrap();
/// assert_eq!(a.timestamps(), vec![t(0), t(5), t(10)]);
/// assert_eq!(b.value_at(t(5)), Some(Value::Float(5.0)));
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn synchronize(a: &Temporal, b: &Temporal, add_crossings: bool) -> Option<(Temporal, Temporal)> {
    if add_crossings {
        assert!(
            crossings_defined(a.kind(), b.kind()),
            "crossings between {} and {} values are not defined",
            a.kind(),
            b.kind()
        );
    }
    if !a.period().overlaps(&b.period()) {
        trace!("synchronize: periods {} and {} are disjoint", a.period(), b.period());
        return None;
    }
    match (a, b) {
        (Temporal::Instant(i), other) => sync_instant(i, other),
        (other, Temporal::Instant(i)) => sync_instant(i, other).map(|(x, y)| (y, x)),
        (Temporal::InstantSet(s), other) => sync_instant_set(s, other),
        (other, Temporal::InstantSet(s)) => sync_instant_set(s, other).map(|(x, y)| (y, x)),
        _ => sync_continuous(a, b, add_crossings),
    }
}

fn sync_instant(inst: &Instant, other: &Temporal) -> Option<(Temporal, Temporal)> {
    let t = inst.timestamp();
    let value = other.value_at(t)?;
    Some((
        Temporal::Instant(inst.clone()),
        Temporal::Instant(Instant::from_parts(value, t)),
    ))
}

fn sync_instant_set(set: &InstantSet, other: &Temporal) -> Option<(Temporal, Temporal)> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    match other {
        Temporal::InstantSet(o) => {
            let (xs, ys) = (set.instants(), o.instants());
            let (mut i, mut j) = (0, 0);
            while i < xs.len() && j < ys.len() {
                match xs[i].timestamp().cmp(&ys[j].timestamp()) {
                    Ordering::Less => i += 1,
                    Ordering::Greater => j += 1,
                    Ordering::Equal => {
                        left.push(xs[i].clone());
                        right.push(ys[j].clone());
                        i += 1;
                        j += 1;
                    }
                }
            }
        }
        _ => {
            for inst in set.instants() {
                if let Some(value) = other.value_at(inst.timestamp()) {
                    left.push(inst.clone());
                    right.push(Instant::from_parts(value, inst.timestamp()));
                }
            }
        }
    }
    if left.is_empty() {
        return None;
    }
    Some((
        Temporal::InstantSet(InstantSet::from_sorted(left)),
        Temporal::InstantSet(InstantSet::from_sorted(right)),
    ))
}

fn sync_continuous(a: &Temporal, b: &Temporal, add_crossings: bool) -> Option<(Temporal, Temporal)> {
    let (xs, ys) = (a.sequences(), b.sequences());
    let mut left = Vec::new();
    let mut right = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < xs.len() && j < ys.len() {
        if let Some((x, y)) = sync_sequences(&xs[i], &ys[j], add_crossings) {
            left.push(x);
            right.push(y);
        }
        let (p, q) = (xs[i].period(), ys[j].period());
        if cmp_upper_bounds(p.upper(), p.upper_inc(), q.upper(), q.upper_inc()) == Ordering::Less {
            i += 1;
        } else {
            j += 1;
        }
    }
    if left.is_empty() {
        return None;
    }
    let as_set = a.granularity() == Granularity::SequenceSet
        || b.granularity() == Granularity::SequenceSet;
    if as_set {
        // no normalization: it could drop an instant on one side only
        Some((
            Temporal::SequenceSet(SequenceSet::build(left, false)),
            Temporal::SequenceSet(SequenceSet::build(right, false)),
        ))
    } else {
        Some((
            Temporal::Sequence(left.swap_remove(0)),
            Temporal::Sequence(right.swap_remove(0)),
        ))
    }
}

/// Synchronizes two sequences over the intersection of their periods.
pub(crate) fn sync_sequences(
    s1: &Sequence,
    s2: &Sequence,
    add_crossings: bool,
) -> Option<(Sequence, Sequence)> {
    let inter = s1.period().intersection(&s2.period())?;
    let (lower, upper) = (inter.lower(), inter.upper());
    if inter.is_instantaneous() {
        let times = [lower];
        return Some((s1.resample(&times, true, true), s2.resample(&times, true, true)));
    }

    let mut times: Vec<Timestamp> = s1
        .instants()
        .iter()
        .chain(s2.instants())
        .map(Instant::timestamp)
        .filter(|&t| t > lower && t < upper)
        .collect();
    times.push(lower);
    times.push(upper);
    times.sort_unstable();
    times.dedup();

    let r1 = s1.resample(&times, inter.lower_inc(), inter.upper_inc());
    let r2 = s2.resample(&times, inter.lower_inc(), inter.upper_inc());
    if !add_crossings || !(s1.is_linear() || s2.is_linear()) {
        return Some((r1, r2));
    }

    let (i1, i2) = (r1.instants(), r2.instants());
    let crossings: Vec<Timestamp> = (0..i1.len() - 1)
        .filter_map(|k| {
            segment::segments_crossing(
                &i1[k],
                &i1[k + 1],
                r1.is_linear(),
                &i2[k],
                &i2[k + 1],
                r2.is_linear(),
            )
            .map(|(t, _, _)| t)
        })
        .collect();
    if crossings.is_empty() {
        return Some((r1, r2));
    }
    trace!("synchronize: {} crossings added", crossings.len());
    times.extend(crossings);
    times.sort_unstable();
    times.dedup();
    Some((
        s1.resample(&times, inter.lower_inc(), inter.upper_inc()),
        s2.resample(&times, inter.lower_inc(), inter.upper_inc()),
    ))
}
