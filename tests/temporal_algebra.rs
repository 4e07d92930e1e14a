use tempora::compute::lifting::{LiftedFunction, lift_base};
use tempora::compute::ops::{self, ArithmeticOp, Comparison};
use tempora::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn t(secs: i64) -> Timestamp {
    Timestamp::from_secs(secs)
}

fn float_sequence(points: &[(f64, i64)], interp: Interpolation) -> Temporal {
    let instants = points
        .iter()
        .map(|&(v, s)| Instant::new(v, t(s)).expect("valid instant"))
        .collect();
    Temporal::from(Sequence::make(instants, true, true, interp, true).expect("valid sequence"))
}

/// Checks that `at` and `minus` split `original` into two parts disjoint in
/// time whose union is the original time, agreeing with it on values.
fn assert_partition(original: &Temporal, at: Option<Temporal>, minus: Option<Temporal>) {
    let time = original.time();
    match (&at, &minus) {
        (Some(a), Some(m)) => {
            assert!(a.time().intersection(&m.time()).is_none(), "parts overlap in time");
            assert_eq!(a.time().union(&m.time()), time);
        }
        (Some(part), None) | (None, Some(part)) => assert_eq!(part.time(), time),
        (None, None) => panic!("restriction lost the whole value"),
    }
    for part in at.iter().chain(minus.iter()) {
        // exclusive bounds store a timestamp where the part is not defined
        for ts in part.timestamps() {
            let Some(actual) = part.value_at(ts) else {
                continue;
            };
            let expected = original.value_at(ts).expect("part inside original");
            match (expected.as_f64(), actual.as_f64()) {
                // computed endpoints sit on whole microseconds
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-6, "{} vs {} at {}", x, y, ts),
                _ => assert_eq!(expected, actual),
            }
        }
    }
}

#[test]
fn test_range_restriction_of_linear_sequence() {
    init_logger();
    let seq = float_sequence(&[(0.0, 0), (10.0, 10)], Interpolation::Linear);
    let range = NumericRange::closed(4.0, 6.0).expect("valid range");

    let at = seq.at_range(&range).expect("range is crossed");
    assert_eq!(at.granularity(), Granularity::Sequence);
    assert_eq!(at.num_instants(), 2);
    assert_eq!(at.start_instant().value(), &Value::Float(4.0));
    assert_eq!(at.start_timestamp(), t(4));
    assert_eq!(at.end_instant().value(), &Value::Float(6.0));
    assert_eq!(at.end_timestamp(), t(6));

    assert!(at.bbox().contained(&seq.bbox()).expect("same box family"));
    assert_partition(&seq, Some(at), seq.minus_range(&range));
}

#[test]
fn test_crossing_trajectories_synchronize_at_crossing() {
    init_logger();
    let a = float_sequence(&[(0.0, 0), (10.0, 10)], Interpolation::Linear);
    let b = float_sequence(&[(10.0, 0), (0.0, 10)], Interpolation::Linear);

    let (sa, sb) = synchronize(&a, &b, true).expect("overlapping values");
    assert_eq!(sa.timestamps(), vec![t(0), t(5), t(10)]);
    assert_eq!(sb.timestamps(), sa.timestamps());
    assert_eq!(sa.value_at(t(5)), Some(Value::Float(5.0)));
    assert_eq!(sb.value_at(t(5)), Some(Value::Float(5.0)));

    let (plain_a, _) = synchronize(&a, &b, false).expect("overlapping values");
    assert_eq!(plain_a.timestamps(), vec![t(0), t(10)]);
}

#[test]
fn test_unsorted_instant_set_is_sorted() {
    let v1 = Instant::new(7, t(20)).expect("valid instant");
    let v2 = Instant::new(3, t(10)).expect("valid instant");
    let set = InstantSet::make(vec![v1.clone(), v2.clone(), v1.clone()], false).expect("valid set");
    assert_eq!(set.instants(), &[v2, v1][..]);

    let conflicting = vec![
        Instant::new(1, t(5)).expect("valid instant"),
        Instant::new(2, t(5)).expect("valid instant"),
    ];
    assert!(matches!(
        InstantSet::make(conflicting.clone(), false),
        Err(TemporalError::ConflictingInstant(_))
    ));
    let merged = InstantSet::make(conflicting, true).expect("duplicates merged");
    assert_eq!(merged.instants()[0].value(), &Value::Int(1));
}

#[test]
fn test_normalization_is_idempotent() {
    let points = [(0.0, 0), (5.0, 5), (10.0, 10), (10.0, 15), (10.0, 20), (4.0, 26)];
    let once = float_sequence(&points, Interpolation::Linear);
    assert_eq!(once.timestamps(), vec![t(0), t(10), t(20), t(26)]);

    let again = Sequence::make(
        once.instants().into_iter().cloned().collect(),
        true,
        true,
        Interpolation::Linear,
        true,
    )
    .expect("valid sequence");
    assert_eq!(Temporal::from(again), once);

    let step = float_sequence(&[(1.0, 0), (1.0, 5), (2.0, 8), (2.0, 9)], Interpolation::Step);
    assert_eq!(step.timestamps(), vec![t(0), t(8), t(9)]);
}

#[test]
fn test_synchronization_alignment() {
    let a = float_sequence(&[(1.0, 0), (3.0, 4), (2.0, 9)], Interpolation::Linear);
    let b_instants = vec![
        Sequence::make(
            vec![
                Instant::new(5.0, t(2)).expect("valid instant"),
                Instant::new(0.0, t(6)).expect("valid instant"),
            ],
            true,
            false,
            Interpolation::Linear,
            true,
        )
        .expect("valid sequence"),
        Sequence::make(
            vec![
                Instant::new(4.0, t(7)).expect("valid instant"),
                Instant::new(4.0, t(12)).expect("valid instant"),
            ],
            true,
            true,
            Interpolation::Step,
            true,
        )
        .expect("valid sequence"),
    ];
    // a sequence set needs one interpolation: use the linear form of the step piece
    let pieces: Vec<Sequence> = b_instants
        .into_iter()
        .flat_map(|s| {
            if s.is_linear() {
                vec![s]
            } else {
                s.to_linear().expect("float converts to linear")
            }
        })
        .collect();
    let b = Temporal::from(SequenceSet::make(pieces, true).expect("valid set"));

    let (sa, sb) = synchronize(&a, &b, true).expect("overlapping values");
    assert_eq!(sa.granularity(), Granularity::SequenceSet);
    assert_eq!(sa.timestamps(), sb.timestamps());
    for ts in sa.timestamps() {
        if let Some(v) = sa.value_at(ts) {
            assert_eq!(Some(v), a.value_at(ts), "left value at {}", ts);
        }
        if let Some(v) = sb.value_at(ts) {
            assert_eq!(Some(v), b.value_at(ts), "right value at {}", ts);
        }
    }
    assert_eq!(sa.value_at(t(6)), None);
}

#[test]
fn test_interpolation_boundary_is_exact() {
    let seq = float_sequence(&[(0.1, 0), (0.7, 3), (0.3, 7)], Interpolation::Linear);
    assert_eq!(seq.value_at(t(0)), Some(Value::Float(0.1)));
    assert_eq!(seq.value_at(t(3)), Some(Value::Float(0.7)));
    assert_eq!(seq.value_at(t(7)), Some(Value::Float(0.3)));
}

#[test]
fn test_partition_law_across_granularities() {
    init_logger();
    let linear = float_sequence(&[(3.0, 0), (1.0, 5), (4.0, 10)], Interpolation::Linear);
    let range = NumericRange::new(2.0, 3.5, true, false).expect("valid range");
    assert_partition(&linear, linear.at_range(&range), linear.minus_range(&range));
    assert_partition(&linear, linear.at_value(&Value::Float(2.0)), linear.minus_value(&Value::Float(2.0)));

    let period = Period::new(t(2), t(7), false, true).expect("valid period");
    assert_partition(&linear, linear.at_period(&period), linear.minus_period(&period));

    let steps = Temporal::from(
        SequenceSet::make(
            vec![
                Sequence::make(
                    vec![
                        Instant::new(1, t(0)).expect("valid instant"),
                        Instant::new(2, t(3)).expect("valid instant"),
                        Instant::new(2, t(6)).expect("valid instant"),
                    ],
                    true,
                    false,
                    Interpolation::Step,
                    true,
                )
                .expect("valid sequence"),
                Sequence::make(
                    vec![
                        Instant::new(1, t(8)).expect("valid instant"),
                        Instant::new(3, t(12)).expect("valid instant"),
                    ],
                    true,
                    true,
                    Interpolation::Step,
                    true,
                )
                .expect("valid sequence"),
            ],
            true,
        )
        .expect("valid set"),
    );
    let ones = [Value::Int(1)];
    assert_partition(&steps, steps.at_values(&ones), steps.minus_values(&ones));

    let ts = TimestampSet::new(vec![t(3), t(9)]).expect("valid timestamps");
    assert_partition(&steps, steps.at_timestamp_set(&ts), steps.minus_timestamp_set(&ts));
    assert_eq!(steps.at_timestamp_set(&ts).expect("defined").num_instants(), 2);
}

#[test]
fn test_partition_law_at_stored_values() {
    init_logger();
    let linear = float_sequence(&[(3.0, 0), (1.0, 5), (4.0, 10)], Interpolation::Linear);

    // exclusive lower bound on the minimum, inclusive upper bound on the first value
    let range = NumericRange::new(1.0, 3.0, false, true).expect("valid range");
    let at = linear.at_range(&range);
    let minus = linear.minus_range(&range);
    assert_eq!(at.as_ref().and_then(|a| a.value_at(t(0))), Some(Value::Float(3.0)));
    assert_eq!(at.as_ref().and_then(|a| a.value_at(t(5))), None);
    assert_eq!(minus.as_ref().and_then(|m| m.value_at(t(5))), Some(Value::Float(1.0)));
    assert_eq!(minus.as_ref().and_then(|m| m.value_at(t(0))), None);
    assert_partition(&linear, at, minus);

    // exclusive upper bound on the last value
    let range = NumericRange::new(1.0, 4.0, true, false).expect("valid range");
    let at = linear.at_range(&range);
    let minus = linear.minus_range(&range);
    assert_eq!(at.as_ref().and_then(|a| a.value_at(t(10))), None);
    assert_eq!(at.as_ref().and_then(|a| a.value_at(t(5))), Some(Value::Float(1.0)));
    assert_eq!(minus.as_ref().map(|m| m.timestamps()), Some(vec![t(10)]));
    assert_partition(&linear, at, minus);

    // a value reached only at a stored instant
    let at = linear.at_value(&Value::Float(1.0));
    assert_eq!(at.as_ref().map(|a| a.timestamps()), Some(vec![t(5)]));
    let minus = linear.minus_value(&Value::Float(1.0));
    assert_eq!(minus.as_ref().and_then(|m| m.value_at(t(5))), None);
    assert_eq!(minus.as_ref().map(|m| m.num_sequences()), Some(2));
    assert_partition(&linear, at, minus);
}

#[test]
fn test_lifted_operators() {
    let rising = float_sequence(&[(0.0, 0), (10.0, 10)], Interpolation::Linear);
    let falling = float_sequence(&[(10.0, 0), (0.0, 10)], Interpolation::Linear);

    let lower = ops::compare(&rising, &falling, Comparison::Lt)
        .expect("comparable")
        .expect("overlapping values");
    assert_eq!(lower.kind(), BaseKind::Bool);
    assert_eq!(lower.value_at(t(2)), Some(Value::Bool(true)));
    assert_eq!(lower.value_at(t(5)), Some(Value::Bool(false)));
    assert_eq!(lower.value_at(t(8)), Some(Value::Bool(false)));

    let sum = ops::arithmetic(&rising, &falling, ArithmeticOp::Add)
        .expect("numbers")
        .expect("overlapping values");
    assert!(ops::always_eq(&sum, &Value::Float(10.0)));

    let product = ops::arithmetic(&rising, &falling, ArithmeticOp::Mul)
        .expect("numbers")
        .expect("overlapping values");
    assert_eq!(product.value_at(t(5)), Some(Value::Float(25.0)));
    assert!(ops::ever_eq(&product, &Value::Float(25.0)));

    assert!(matches!(
        ops::arithmetic_value(&rising, &Value::Float(0.0), ArithmeticOp::Div, false),
        Err(TemporalError::InvalidValue(_))
    ));
    assert!(matches!(
        ops::compare_value(&rising, &Value::from("x"), Comparison::Eq),
        Err(TemporalError::IncompatibleOperands(_))
    ));

    // value-seconds under a 0..10 ramp over 10 seconds
    assert_eq!(ops::integral(&rising).expect("numbers"), 50.0);
}

#[test]
fn test_lifted_function_with_parameter() {
    let seq = float_sequence(&[(1.0, 0), (3.0, 10)], Interpolation::Linear);
    let affine = LiftedFunction::new(BaseKind::Float, |x, scale, params| {
        let offset = params[0].as_f64().unwrap_or(0.0);
        Value::Float(x.as_f64().unwrap_or(0.0) * scale.as_f64().unwrap_or(1.0) + offset)
    })
    .with_param(100.0)
    .linear(true);
    assert_eq!(affine.arity(), 3);

    let mapped = lift_base(&seq, &Value::Float(2.0), &affine, false).expect("lifted value");
    assert!(mapped.is_linear());
    assert_eq!(mapped.value_at(t(0)), Some(Value::Float(102.0)));
    assert_eq!(mapped.value_at(t(5)), Some(Value::Float(104.0)));
}

#[test]
fn test_point_sequence_with_config_validator() {
    let config = Config::default().with_ambient_srid(4326);
    let validator = ConfigValidator::new(&config);
    let inside = GeoPoint::new(-74.0, 40.7).with_srid(4326).geodetic();
    let out_of_range = GeoPoint::new(-200.0, 40.7).with_srid(4326).geodetic();
    let wrong_srid = GeoPoint::new(-74.0, 40.7).with_srid(3857);

    assert!(Instant::make_with(inside.into(), t(0), BaseKind::Point, &validator).is_ok());
    assert!(Instant::make_with(out_of_range.into(), t(0), BaseKind::Point, &validator).is_err());
    assert!(matches!(
        Instant::make_with(wrong_srid.into(), t(0), BaseKind::Point, &validator),
        Err(TemporalError::MixedDimensions(_))
    ));

    let mixed = vec![
        Instant::new(GeoPoint::new(0.0, 0.0), t(0)).expect("valid instant"),
        Instant::new(GeoPoint::new_3d(1.0, 1.0, 1.0), t(1)).expect("valid instant"),
    ];
    assert!(matches!(
        Sequence::make(mixed, true, true, Interpolation::Linear, true),
        Err(TemporalError::MixedDimensions(_))
    ));
}

#[test]
fn test_config_validator_guards_append_and_sequence_sets() {
    let config = Config::default().with_max_instants(3).with_ambient_srid(4326);
    let validator = ConfigValidator::new(&config);
    let at = |x: f64, s: i64| Instant::new(GeoPoint::new(x, 0.0).with_srid(4326), t(s)).expect("valid instant");

    let set = InstantSet::make_with(vec![at(0.0, 0), at(1.0, 1), at(2.0, 2)], false, &validator)
        .expect("within the limit");
    assert!(matches!(
        set.append_with(at(3.0, 3), &validator),
        Err(TemporalError::InvalidValue(_))
    ));
    assert_eq!(set.append(at(3.0, 3)).expect("no limit by default").num_instants(), 4);

    let seq = Sequence::make_with(vec![at(0.0, 0), at(1.0, 1)], true, true, Interpolation::Linear, false, &validator)
        .expect("within the limit");
    let foreign = Instant::new(GeoPoint::new(2.0, 0.0).with_srid(3857), t(2)).expect("valid instant");
    assert!(seq.append_with(foreign, &validator).is_err());
    assert!(seq.append_with(at(2.0, 2), &validator).is_ok());

    let pieces = vec![
        Sequence::make(vec![at(0.0, 0), at(1.0, 1)], true, true, Interpolation::Linear, false).expect("valid sequence"),
        Sequence::make(vec![at(5.0, 5), at(6.0, 6)], true, true, Interpolation::Linear, false).expect("valid sequence"),
    ];
    assert!(matches!(
        SequenceSet::make_with(pieces.clone(), false, &validator),
        Err(TemporalError::InvalidValue(_))
    ));
    assert!(SequenceSet::make(pieces.clone(), false).is_ok());

    let loose = ConfigValidator::new(&Config::default().with_ambient_srid(4326));
    assert!(SequenceSet::make_with(pieces, false, &loose).is_ok());
    let planar = vec![Sequence::make(
        vec![Instant::new(GeoPoint::new(0.0, 0.0).with_srid(3857), t(0)).expect("valid instant")],
        true,
        true,
        Interpolation::Linear,
        false,
    )
    .expect("valid sequence")];
    assert!(matches!(
        SequenceSet::make_with(planar, false, &loose),
        Err(TemporalError::MixedDimensions(_))
    ));
}
