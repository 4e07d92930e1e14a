use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tempora::compute::ops::{self, ArithmeticOp, Comparison};
use tempora::storage::{decode, encode};
use tempora::{
    BoundingBox, GeoPoint, Instant, Interpolation, NumericRange, Period, Sequence, TBox, Span,
    Temporal, TemporalIndex, TimeSpan, Timestamp, synchronize,
};

fn wave(len: usize, phase: f64) -> Vec<Instant> {
    (0..len)
        .map(|i| {
            let value = ((i as f64) * 0.1 + phase).sin() * 10.0;
            Instant::new(value, Timestamp::from_secs(i as i64 * 10)).unwrap()
        })
        .collect()
}

fn wave_sequence(len: usize, phase: f64) -> Temporal {
    Temporal::from(Sequence::make(wave(len, phase), true, true, Interpolation::Linear, true).unwrap())
}

fn benchmark_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for len in [100, 1_000, 10_000] {
        let instants = wave(len, 0.0);
        group.bench_with_input(BenchmarkId::new("sequence_normalized", len), &instants, |b, instants| {
            b.iter(|| {
                Sequence::make(black_box(instants.clone()), true, true, Interpolation::Linear, true).unwrap()
            })
        });
    }

    // collinear points collapse to two instants
    let ramp: Vec<Instant> = (0..1_000)
        .map(|i| Instant::new(i as f64, Timestamp::from_secs(i)).unwrap())
        .collect();
    group.bench_function("collinear_ramp_1000", |b| {
        b.iter(|| Sequence::make(black_box(ramp.clone()), true, true, Interpolation::Linear, true).unwrap())
    });

    group.finish();
}

fn benchmark_synchronization(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronization");

    for len in [100, 1_000] {
        let a = wave_sequence(len, 0.0);
        let b_seq = wave_sequence(len, 1.5);
        group.bench_with_input(BenchmarkId::new("with_crossings", len), &len, |b, _| {
            b.iter(|| synchronize(black_box(&a), black_box(&b_seq), true))
        });
        group.bench_with_input(BenchmarkId::new("compare_lt", len), &len, |b, _| {
            b.iter(|| ops::compare(black_box(&a), black_box(&b_seq), Comparison::Lt).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("add", len), &len, |b, _| {
            b.iter(|| ops::arithmetic(black_box(&a), black_box(&b_seq), ArithmeticOp::Add).unwrap())
        });
    }

    group.finish();
}

fn benchmark_restriction(c: &mut Criterion) {
    let mut group = c.benchmark_group("restriction");

    let seq = wave_sequence(1_000, 0.0);
    let range = NumericRange::closed(-2.5, 2.5).unwrap();
    group.bench_function("at_range", |b| b.iter(|| seq.at_range(black_box(&range))));
    group.bench_function("minus_range", |b| b.iter(|| seq.minus_range(black_box(&range))));

    let period = Period::new(Timestamp::from_secs(2_000), Timestamp::from_secs(6_000), true, false).unwrap();
    group.bench_function("at_period", |b| b.iter(|| seq.at_period(black_box(&period))));
    group.bench_function("at_max", |b| b.iter(|| seq.at_max()));

    group.finish();
}

fn benchmark_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");

    let trip = Temporal::from(
        Sequence::make(
            (0..1_000)
                .map(|i| {
                    let angle = i as f64 * 0.01;
                    Instant::new(
                        GeoPoint::new(angle.cos(), angle.sin()).with_srid(4326),
                        Timestamp::from_secs(i),
                    )
                    .unwrap()
                })
                .collect(),
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap(),
    );
    let bytes = encode(&trip).unwrap();

    group.bench_function("encode_point_trip", |b| b.iter(|| encode(black_box(&trip)).unwrap()));
    group.bench_function("decode_point_trip", |b| b.iter(|| decode(black_box(&bytes)).unwrap()));

    group.finish();
}

fn benchmark_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    let boxes: Vec<(usize, BoundingBox)> = (0..10_000)
        .map(|i| {
            let start = Timestamp::from_secs(i as i64 * 60);
            let bbox = TBox::new(
                Some(Span::new(i as f64 % 100.0, i as f64 % 100.0 + 5.0)),
                Some(TimeSpan::new(start, start.shift(3_600_000_000))),
            )
            .unwrap();
            (i, BoundingBox::TBox(bbox))
        })
        .collect();

    group.bench_function("bulk_load_10000", |b| {
        b.iter(|| TemporalIndex::bulk_load(black_box(boxes.clone())))
    });

    let index = TemporalIndex::bulk_load(boxes);
    let window = BoundingBox::TBox(
        TBox::new(
            Some(Span::new(20.0, 30.0)),
            Some(TimeSpan::new(Timestamp::from_secs(60_000), Timestamp::from_secs(120_000))),
        )
        .unwrap(),
    );
    group.bench_function("query_overlapping", |b| {
        b.iter(|| index.query_overlapping(black_box(&window)).len())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_construction,
    benchmark_synchronization,
    benchmark_restriction,
    benchmark_layout,
    benchmark_index
);
criterion_main!(benches);
