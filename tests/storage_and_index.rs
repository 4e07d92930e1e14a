use tempora::storage::{decode, encode, packed_size, read_element};
use tempora::{
    BoundingBox, GeoPoint, Instant, Interpolation, NumericRange, Period, STBox, Sequence,
    SequenceSet, SpaceExtent, Span, Temporal, TemporalError, TemporalIndex, TimeSpan, Timestamp,
    Value,
};

fn t(secs: i64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn trip(start: (f64, f64), end: (f64, f64), from: i64, to: i64) -> Sequence {
    Sequence::make(
        vec![
            Instant::new(GeoPoint::new(start.0, start.1).with_srid(4326), t(from)).expect("valid instant"),
            Instant::new(GeoPoint::new(end.0, end.1).with_srid(4326), t(to)).expect("valid instant"),
        ],
        true,
        true,
        Interpolation::Linear,
        true,
    )
    .expect("valid sequence")
}

#[test]
fn test_restriction_result_survives_layout() {
    let _ = env_logger::builder().is_test(true).try_init();

    let seq = Temporal::from(
        Sequence::make(
            vec![
                Instant::new(0.0, t(0)).expect("valid instant"),
                Instant::new(10.0, t(10)).expect("valid instant"),
                Instant::new(0.0, t(20)).expect("valid instant"),
            ],
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .expect("valid sequence"),
    );
    let high = seq
        .minus_range(&NumericRange::closed(0.0, 5.0).expect("valid range"))
        .expect("part above five");

    let bytes = encode(&high).expect("encode");
    assert_eq!(bytes.len(), packed_size(&high));
    let decoded = decode(&bytes).expect("decode");
    assert_eq!(decoded, high);
    assert_eq!(decoded.value_at(t(10)), Some(Value::Float(10.0)));
    assert_eq!(decoded.value_at(t(5)), None);
}

#[test]
fn test_sequence_set_elements_are_addressable() {
    let set = SequenceSet::make(
        vec![
            trip((0.0, 0.0), (1.0, 1.0), 0, 60),
            trip((2.0, 2.0), (3.0, 1.0), 120, 180),
            trip((5.0, 5.0), (6.0, 5.0), 200, 260),
        ],
        true,
    )
    .expect("valid set");
    let temp = Temporal::from(set.clone());
    let bytes = encode(&temp).expect("encode");

    for (n, seq) in set.sequences().iter().enumerate() {
        let element = read_element(&bytes, n).expect("readable").expect("in range");
        assert_eq!(element, Temporal::from(seq.clone()));
    }
    assert!(read_element(&bytes, 3).expect("readable").is_none());

    let truncated = &bytes[..bytes.len() / 2];
    assert_eq!(decode(truncated), Err(TemporalError::UnexpectedEof));
}

#[test]
fn test_index_finds_trips_by_space_and_time() {
    let mut index = TemporalIndex::new();
    index.insert("north", &Temporal::from(trip((0.0, 10.0), (1.0, 11.0), 0, 100)));
    index.insert("south", &Temporal::from(trip((0.0, -10.0), (1.0, -11.0), 0, 100)));
    index.insert("later", &Temporal::from(trip((0.0, 10.0), (1.0, 11.0), 500, 600)));

    let window = BoundingBox::STBox(
        STBox::new(
            Some(SpaceExtent {
                x: Span::new(-1.0, 2.0),
                y: Span::new(9.0, 12.0),
                z: None,
            }),
            Some(TimeSpan::new(t(50), t(150))),
            4326,
            false,
        )
        .expect("valid box"),
    );
    assert_eq!(index.query_overlapping(&window), vec![&"north"]);

    let mut in_morning = index.query_period(&Period::new(t(0), t(200), true, false).expect("valid period"));
    in_morning.sort();
    assert_eq!(in_morning, vec![&"north", &"south"]);

    assert_eq!(index.remove(&"north").map(|b| b.family_name()), Some("stbox"));
    assert!(index.query_overlapping(&window).is_empty());
    assert_eq!(index.len(), 2);
}

#[cfg(feature = "snapshot")]
#[test]
fn test_snapshot_and_layout_agree() {
    use tempora::storage::{from_snapshot, to_snapshot};

    let temp = Temporal::from(trip((0.0, 0.0), (3.0, 4.0), 0, 50));
    let from_bincode = from_snapshot(&to_snapshot(&temp).expect("snapshot")).expect("restore");
    let from_layout = decode(&encode(&temp).expect("encode")).expect("decode");
    assert_eq!(from_bincode, from_layout);
    assert_eq!(from_bincode.hash_value(), temp.hash_value());
}
