//! Serde snapshots of temporal values through bincode.
//!
//! The snapshot carries the cached bounding boxes, but decoding discards them
//! and rebuilds the value through the validating constructors.

use crate::error::{Result, TemporalError};
use crate::temporal::instant::Instant;
use crate::temporal::instant_set::InstantSet;
use crate::temporal::sequence::Sequence;
use crate::temporal::sequence_set::SequenceSet;
use crate::temporal::Temporal;

/// Encodes `temp` as a bincode snapshot.
pub fn to_snapshot(temp: &Temporal) -> Result<Vec<u8>> {
    bincode::serialize(temp).map_err(|e| {
        TemporalError::Serialization(format!("failed to encode {:?} snapshot: {}", temp.granularity(), e))
    })
}

/// Decodes a bincode snapshot and revalidates it.
///
/// # Examples
///
/// ```
/// use tempora::storage::{from_snapshot, to_snapshot};
/// use tempora::{Instant, Interpolation, Sequence, Temporal, Timestamp};
///
/// let t = Timestamp::from_secs;
/// let temp = Temporal::from(Sequence::make(
///     vec![Instant::new(1.5, t(0))?, Instant::new(3.0, t(30))?],
///     true, false, Interpolation::Linear, true,
/// )?);
/// let snapshot = to_snapshot(&temp)?;
/// assert_eq!(from_snapshot(&snapshot)?, temp);
/// # Ok::<(), tempora::TemporalError>(())
/// ```
pub fn from_snapshot(bytes: &[u8]) -> Result<Temporal> {
    let temp: Temporal = bincode::deserialize(bytes)
        .map_err(|e| TemporalError::Serialization(format!("failed to decode snapshot: {}", e)))?;
    revalidate(&temp)
}

fn revalidate_instants(instants: &[Instant]) -> Result<Vec<Instant>> {
    instants
        .iter()
        .map(|inst| Instant::make(inst.value_copy(), inst.timestamp(), inst.kind()))
        .collect()
}

fn revalidate_sequence(seq: &Sequence) -> Result<Sequence> {
    Sequence::make(
        revalidate_instants(seq.instants())?,
        seq.lower_inc(),
        seq.upper_inc(),
        seq.interpolation(),
        false,
    )
}

fn revalidate(temp: &Temporal) -> Result<Temporal> {
    let rebuilt = match temp {
        Temporal::Instant(inst) => {
            Temporal::Instant(Instant::make(inst.value_copy(), inst.timestamp(), inst.kind())?)
        }
        Temporal::InstantSet(set) => {
            Temporal::InstantSet(InstantSet::make(revalidate_instants(set.instants())?, false)?)
        }
        Temporal::Sequence(seq) => Temporal::Sequence(revalidate_sequence(seq)?),
        Temporal::SequenceSet(set) => {
            let sequences = set
                .sequences()
                .iter()
                .map(revalidate_sequence)
                .collect::<Result<Vec<_>>>()?;
            Temporal::SequenceSet(SequenceSet::make(sequences, false)?)
        }
    };
    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Interpolation;
    use tempora_types::point::GeoPoint;
    use tempora_types::time::Timestamp;

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    #[test]
    fn test_snapshot_round_trip() {
        let seq = |a: i64, b: i64| {
            Sequence::make(
                vec![
                    Instant::new(GeoPoint::new(0.0, 0.0), t(a)).unwrap(),
                    Instant::new(GeoPoint::new(1.0, 1.0), t(b)).unwrap(),
                ],
                true,
                false,
                Interpolation::Linear,
                true,
            )
            .unwrap()
        };
        let temp = Temporal::SequenceSet(SequenceSet::make(vec![seq(0, 10), seq(20, 30)], true).unwrap());
        let bytes = to_snapshot(&temp).unwrap();
        assert_eq!(from_snapshot(&bytes).unwrap(), temp);
    }

    #[test]
    fn test_snapshot_garbage() {
        assert!(matches!(
            from_snapshot(&[0xff, 0x01]),
            Err(TemporalError::Serialization(_))
        ));
    }

    #[test]
    fn test_snapshot_revalidates() {
        // a NaN smuggled past the constructors is rejected on decode
        let forged = Temporal::Instant(Instant::from_parts(f64::NAN.into(), t(0)));
        let bytes = to_snapshot(&forged).unwrap();
        assert!(matches!(
            from_snapshot(&bytes),
            Err(TemporalError::InvalidValue(_))
        ));
    }
}
