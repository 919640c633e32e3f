use criterion::{black_box, criterion_group, criterion_main, Criterion};
use suzhou_garden_prep::geo::haversine_km;

fn bench_haversine(c: &mut Criterion) {
    c.bench_function("haversine_km", |b| {
        b.iter(|| {
            haversine_km(
                black_box(120.629),
                black_box(31.325),
                black_box(120.598),
                black_box(31.322),
            )
        })
    });
}

criterion_group!(benches, bench_haversine);
criterion_main!(benches);
