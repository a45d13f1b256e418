//! Benchmarks for inbound update application.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench apply_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use phidget_device::mock::RecordingTransport;
use phidget_protocol::UpdateMessage;
use phidget_temperature::TemperatureSensor;
use std::hint::black_box;

fn attached_sensor() -> TemperatureSensor<RecordingTransport> {
    let mut sensor = TemperatureSensor::new(RecordingTransport::new());
    sensor.attach();
    sensor
}

/// Emittable channel update with one subscriber.
fn bench_emitting_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_emitting");
    group.throughput(Throughput::Elements(1));

    let mut sensor = attached_sensor();
    sensor.subscribe("temperature", |_, event| {
        black_box(event);
    });
    let update = UpdateMessage::indexed("Temperature", 2, "101.2");

    group.bench_function("temperature_update", |b| {
        b.iter(|| black_box(sensor.handle_update(black_box(&update))));
    });

    group.finish();
}

/// Silent bounds update.
fn bench_silent_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_silent");
    group.throughput(Throughput::Elements(1));

    let mut sensor = attached_sensor();
    let update = UpdateMessage::indexed("TemperatureMax", 2, "1250");

    group.bench_function("temperature_max_update", |b| {
        b.iter(|| black_box(sensor.handle_update(black_box(&update))));
    });

    group.finish();
}

/// Unknown keywords are dropped before decoding.
fn bench_unknown_keyword(c: &mut Criterion) {
    let mut sensor = attached_sensor();
    let update = UpdateMessage::indexed("FirmwareOnlyKeyword", 0, "1");

    c.bench_function("apply_unknown_keyword", |b| {
        b.iter(|| black_box(sensor.handle_update(black_box(&update))));
    });
}

/// Full sweep of all inputs, scaling the input count.
fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_sweep");

    for inputs in [4u32, 16, 64] {
        let updates: Vec<_> = (0..inputs)
            .flat_map(|i| {
                [
                    UpdateMessage::indexed("Temperature", i, "101.2"),
                    UpdateMessage::indexed("Potential", i, "0.0041"),
                ]
            })
            .collect();
        group.throughput(Throughput::Elements(updates.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(inputs), &updates, |b, updates| {
            let mut sensor = attached_sensor();
            b.iter(|| {
                for update in updates {
                    black_box(sensor.handle_update(update));
                }
            });
        });
    }

    group.finish();
}

/// Validated command fan-out to several inputs.
fn bench_commands(c: &mut Criterion) {
    let mut sensor = attached_sensor();

    c.bench_function("set_thermocouple_type_4_inputs", |b| {
        b.iter(|| {
            sensor
                .set_thermocouple_type(black_box([0, 1, 2, 3]), black_box("k"))
                .unwrap();
            sensor.transport_mut().clear();
        });
    });
}

criterion_group!(
    benches,
    bench_emitting_update,
    bench_silent_update,
    bench_unknown_keyword,
    bench_sweep,
    bench_commands
);
criterion_main!(benches);
