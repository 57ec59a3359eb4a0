use criterion::{black_box, criterion_group, criterion_main, Criterion};

use huestream::encode_frame;

fn bench_encode(c: &mut Criterion) {
    let area_id = "5cda38d9-4a46-4b34-b1c8-54f971a2b9f0";
    let colors: Vec<(u8, u8, u8)> = (0..10u8)
        .map(|i| (i * 20, 255 - i * 20, 128))
        .collect();

    c.bench_function("encode_frame_10_channels", |b| {
        b.iter(|| encode_frame(black_box(area_id), black_box(&colors)).unwrap())
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
