//! Property-based tests for squelch-core.
//!
//! Uses proptest to check smoothing, slicing, event dispatch, snapshot
//! hand-off and telemetry throttling over randomized inputs.

use proptest::prelude::*;
use squelch_core::{
    BlockScheduler, Conversion, Event, HostContext, NullSink, ParamId, SchedulerConfig,
    SmoothedParam, SynthEngine, ThrottledReporter, snapshot_channel,
};

/// Logs the sample index of every note-on.
#[derive(Default)]
struct Arrivals {
    sample: usize,
    ons: Vec<(usize, u8)>,
}

impl SynthEngine for Arrivals {
    fn set_parameter(&mut self, _id: ParamId, _value: f64) {}
    fn render_sample(&mut self) -> f32 {
        self.sample += 1;
        0.0
    }
    fn note_on(&mut self, pitch: u8, _velocity: u8) {
        self.ons.push((self.sample, pitch));
    }
    fn note_off(&mut self, _pitch: u8) {}
    fn all_notes_off(&mut self) {}
}

fn scheduler(slice_size: usize) -> BlockScheduler {
    BlockScheduler::new(SchedulerConfig {
        slice_size,
        ..SchedulerConfig::default()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Smoothing moves monotonically towards the target without overshoot,
    /// and alpha 1 lands immediately.
    #[test]
    fn smoothing_is_monotone(
        start in 0.0f64..=1.0,
        target in 0.0f64..=1.0,
        alpha in 0.001f64..1.0,
    ) {
        let mut p = SmoothedParam::new(start, alpha);
        p.set_target(target);
        let mut prev = start;
        for _ in 0..200 {
            let next = p.advance();
            if target >= start {
                prop_assert!(next >= prev && next <= target);
            } else {
                prop_assert!(next <= prev && next >= target);
            }
            prev = next;
        }

        let mut q = SmoothedParam::new(start, 1.0);
        q.set_target(target);
        prop_assert_eq!(q.advance(), target);
    }

    /// Slices cover the block exactly: every sample renders once, slices
    /// start on multiples of S, and the last one is no longer than S.
    #[test]
    fn slices_cover_block(len in 1usize..1024, slice in 1usize..=64) {
        let mut s = scheduler(slice);
        let mut engine = Arrivals::default();
        let events: Vec<Event> = (0..len).map(|o| Event::note_on(o, 60, 100)).collect();
        let mut out = vec![0.0f32; len];
        s.process(&mut out, &events, &HostContext::stopped(), &mut engine, &mut NullSink);

        prop_assert_eq!(engine.sample, len);
        prop_assert_eq!(s.params().elapsed_samples(), len as u64);
        let mut starts: Vec<usize> = engine.ons.iter().map(|(at, _)| *at).collect();
        starts.dedup();
        prop_assert_eq!(starts.len(), len.div_ceil(slice));
        prop_assert!(starts.iter().all(|at| at % slice == 0));
        let last = *starts.last().unwrap();
        prop_assert!(len - last <= slice);
    }

    /// Every event is dispatched exactly once, in order, within one slice of
    /// its offset.
    #[test]
    fn events_dispatched_once_in_order(
        len in 1usize..512,
        slice in 1usize..=16,
        mut offsets in prop::collection::vec(0usize..600, 0..100),
    ) {
        offsets.sort_unstable();
        let events: Vec<Event> = offsets
            .iter()
            .enumerate()
            .map(|(i, &o)| Event::note_on(o, i as u8, 100))
            .collect();
        let mut s = scheduler(slice);
        let mut engine = Arrivals::default();
        let mut out = vec![0.0f32; len];
        let report =
            s.process(&mut out, &events, &HostContext::stopped(), &mut engine, &mut NullSink);

        prop_assert_eq!(report.dispatched, events.len());
        let pitches: Vec<u8> = engine.ons.iter().map(|(_, p)| *p).collect();
        let expected: Vec<u8> = (0..events.len()).map(|i| i as u8).collect();
        prop_assert_eq!(pitches, expected);

        let last_start = (len - 1) / slice * slice;
        for ((at, _), &offset) in engine.ons.iter().zip(&offsets) {
            prop_assert!(*at >= offset.min(last_start));
            prop_assert!(*at < offset + slice);
        }
    }

    /// After k publishes one claim sees exactly the k-th value.
    #[test]
    fn latest_publish_wins(
        values in prop::collection::vec(any::<u32>(), 0..50),
        pool in 0usize..20,
    ) {
        let (mut tx, mut rx) = snapshot_channel(0u32, pool);
        for v in &values {
            prop_assert!(tx.publish(v));
        }
        match values.last() {
            Some(last) => {
                let claimed = rx.try_claim().unwrap();
                prop_assert_eq!(*claimed, *last);
                prop_assert_eq!(claimed.generation(), values.len() as u64);
            }
            None => prop_assert!(rx.try_claim().is_none()),
        }
        prop_assert!(rx.try_claim().is_none());
    }

    /// The reporter never emits the same value twice in a row.
    #[test]
    fn reporter_suppresses_duplicates(
        hz in 1.0f64..1000.0,
        blocks in prop::collection::vec((1usize..2048, 0u8..4), 1..200),
    ) {
        let mut r = ThrottledReporter::new(ParamId(9), 48000.0, hz);
        let mut last = 0.0;
        for (size, value) in blocks {
            if let Some(t) = r.report(f64::from(value), size) {
                prop_assert_ne!(t.value, last);
                last = t.value;
            }
        }
    }

    /// Reporting in blocks no larger than the interval never beats the rate.
    #[test]
    fn reporter_rate_with_small_blocks(
        hz in 1.0f64..200.0,
        blocks in prop::collection::vec(1usize..64, 1..2000),
    ) {
        let mut r = ThrottledReporter::new(ParamId(9), 48000.0, hz);
        let interval = r.interval() as usize;
        let mut elapsed = 0usize;
        let mut emitted = 0usize;
        for (i, size) in blocks.into_iter().enumerate() {
            if r.report((i + 1) as f64, size).is_some() {
                emitted += 1;
            }
            elapsed += size;
            prop_assert!(emitted <= elapsed / interval + 1);
        }
    }

    /// Continuous conversions invert each other.
    #[test]
    fn conversion_round_trip(norm in 0.0f64..=1.0, min in 1.0f64..1000.0, span in 1.0f64..1000.0) {
        let linear = Conversion::Linear { min: -min, max: span };
        prop_assert!((linear.to_normalized(linear.to_physical(norm)) - norm).abs() < 1e-9);
        let exp = Conversion::Exponential { min, max: min + span };
        prop_assert!((exp.to_normalized(exp.to_physical(norm)) - norm).abs() < 1e-9);
    }

    /// Stepped conversions are exact at step centres.
    #[test]
    fn stepped_round_trip(steps in 1u32..32, start in -12i32..12, pick in 0u32..32) {
        let c = Conversion::Stepped { steps, start };
        let step = pick.min(steps);
        let physical = f64::from(start) + f64::from(step);
        prop_assert_eq!(c.to_physical(c.to_normalized(physical)), physical);
        prop_assert_eq!(c.step_index(c.to_normalized(physical)), step as usize);
    }
}
