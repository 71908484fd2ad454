//! Criterion benchmarks for the squelch-core audio path
//!
//! Run with: cargo bench -p squelch-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use squelch_core::{
    BlockScheduler, Event, HostContext, KeyMask, NullSink, ParamValues, Pattern, PatternBank,
    SchedulerConfig, SilentEngine, Step, layout, snapshot_channel,
};

const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];
const SLICE_SIZES: &[usize] = &[1, 4, 8, 32];

fn demo_bank() -> PatternBank {
    let steps: Vec<Step> = (0..16u8)
        .map(|i| match i % 4 {
            0 => Step::note(i % 12, 0).with_accent(true),
            1 => Step::rest(),
            2 => Step::note(7, 1).with_slide(true),
            _ => Step::note(3, -1),
        })
        .collect();
    let mut bank = PatternBank::new();
    *bank.active_mut() = Pattern::from_steps(&steps, 0.25);
    bank
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("BlockScheduler");
    let host = HostContext::playing(128.0);
    let bank = demo_bank();

    for &block_size in BLOCK_SIZES {
        group.bench_with_input(BenchmarkId::new("process", block_size), &block_size, |b, &n| {
            let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
            scheduler.apply_bank(&bank);
            let mut out = vec![0.0f32; n];
            let events = [
                Event::note_on(0, 48, 100),
                Event::scale_mask(n / 2, KeyMask::MINOR),
                Event::note_off(n - 1, 48),
            ];
            b.iter(|| {
                black_box(scheduler.process(
                    black_box(&mut out),
                    &events,
                    &host,
                    &mut SilentEngine,
                    &mut NullSink,
                ))
            });
        });
    }

    // Slice size trades timing accuracy for per-slice overhead.
    for &slice_size in SLICE_SIZES {
        group.bench_with_input(BenchmarkId::new("slice_size", slice_size), &slice_size, |b, &s| {
            let mut scheduler = BlockScheduler::new(SchedulerConfig {
                slice_size: s,
                ..SchedulerConfig::default()
            });
            scheduler.apply_bank(&bank);
            let mut out = vec![0.0f32; 512];
            b.iter(|| {
                black_box(scheduler.process(
                    black_box(&mut out),
                    &[],
                    &host,
                    &mut SilentEngine,
                    &mut NullSink,
                ))
            });
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("Snapshot");

    let mut values = ParamValues::new(layout::default_values().to_vec());
    let (mut tx, mut rx) = snapshot_channel(values.clone(), 3);
    group.bench_function("publish_claim_params", |b| {
        b.iter(|| {
            values.set(layout::CUTOFF, black_box(0.5));
            tx.publish(&values);
            black_box(rx.try_claim().map(|c| c.generation()))
        });
    });

    let bank = demo_bank();
    let (mut tx, mut rx) = snapshot_channel(bank, 3);
    group.bench_function("publish_claim_bank", |b| {
        b.iter(|| {
            tx.publish(black_box(&bank));
            black_box(rx.try_claim().map(|c| c.active_index()))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_process, bench_snapshot);
criterion_main!(benches);
