use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sen5x_exporter::{
    metrics::{sen5x::crc8, sen5x::decode_measured_values},
    web::{encode, render_response},
    NoDataValue, Reading, SensorSource, SharedSnapshot, SimulatedSensor,
};
use std::thread;

fn sample_reading() -> Reading {
    Reading::new(12.3, 8.1, 9.0, 10.2, Some(45.6), Some(22.1), 120.0, Some(15.0))
}

/// Benchmark exposition encoding
fn bench_encode(c: &mut Criterion) {
    let reading = sample_reading();

    c.bench_function("encode_reading", |b| {
        b.iter(|| encode(Some(&reading), NoDataValue::Zero))
    });

    c.bench_function("encode_no_data", |b| b.iter(|| encode(None, NoDataValue::Nan)));

    c.bench_function("render_full_response", |b| {
        b.iter(|| render_response(&encode(Some(&reading), NoDataValue::Zero)))
    });
}

/// Benchmark snapshot reads with concurrent readers contending
fn bench_snapshot_contention(c: &mut Criterion) {
    for readers in [0usize, 1, 4].iter() {
        c.bench_with_input(
            BenchmarkId::new("publish_with_readers", readers),
            readers,
            |b, &readers| {
                let snapshot = SharedSnapshot::new();
                snapshot.publish(sample_reading());

                let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
                let handles: Vec<_> = (0..readers)
                    .map(|_| {
                        let snapshot = snapshot.clone();
                        let stop = stop.clone();
                        thread::spawn(move || {
                            while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                                let _ = snapshot.read();
                            }
                        })
                    })
                    .collect();

                let reading = sample_reading();
                b.iter(|| snapshot.publish(reading));

                stop.store(true, std::sync::atomic::Ordering::Relaxed);
                for handle in handles {
                    handle.join().expect("Reader thread should not panic");
                }
            },
        );
    }

    let snapshot = SharedSnapshot::new();
    snapshot.publish(sample_reading());
    c.bench_function("snapshot_read", |b| b.iter(|| snapshot.read()));
}

/// Benchmark SEN5x frame decoding
fn bench_sen5x_decode(c: &mut Criterion) {
    let words = [123u16, 81, 90, 102, 4560, 4420, 1200, 150];

    c.bench_function("sen5x_crc8", |b| b.iter(|| crc8(&[0xBE, 0xEF])));
    c.bench_function("sen5x_decode_measured_values", |b| {
        b.iter(|| decode_measured_values(&words).expect("Should decode"))
    });
}

/// Benchmark simulated acquisition
fn bench_simulated_acquisition(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");

    c.bench_function("simulated_read_reading", |b| {
        b.to_async(&rt).iter(|| async {
            let mut sensor = SimulatedSensor::new();
            sensor.read_reading().await.expect("Simulator never fails")
        })
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_snapshot_contention,
    bench_sen5x_decode,
    bench_simulated_acquisition
);
criterion_main!(benches);
