//! Rate-limited outbound telemetry.
//!
//! The audio thread produces meter values every block, but observers only
//! need them at display rate. A [`ThrottledReporter`] counts samples down
//! from an interval of `sample_rate / hz` and lets a value through only when
//! the countdown expires and the value differs from the last one emitted.
//!
//! ```rust
//! use squelch_core::{ParamId, ThrottledReporter};
//!
//! // 48 kHz at 60 Hz -> one notification per 800 samples at most.
//! let mut meter = ThrottledReporter::new(ParamId(9), 48000.0, 60.0);
//! assert!(meter.report(0.5, 256).is_some()); // countdown starts expired
//! assert!(meter.report(0.6, 256).is_none()); // 256 of 800 elapsed
//! ```

use crate::param_info::ParamId;

/// Default notification rate.
pub const DEFAULT_REPORT_HZ: f64 = 60.0;

/// A change notification: parameter id and normalized value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Telemetry {
    /// Which parameter changed.
    pub id: ParamId,
    /// New normalized value.
    pub value: f64,
}

/// Destination for telemetry produced on the audio thread.
///
/// Implementations must not block.
pub trait TelemetrySink {
    /// Deliver one notification, or drop it.
    fn notify(&mut self, change: Telemetry);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn notify(&mut self, _change: Telemetry) {}
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    fn notify(&mut self, change: Telemetry) {
        (**self).notify(change);
    }
}

#[cfg(feature = "std")]
impl TelemetrySink for crossbeam_channel::Sender<Telemetry> {
    /// Never blocks: a full or disconnected channel drops the notification.
    fn notify(&mut self, change: Telemetry) {
        let _ = self.try_send(change);
    }
}

/// Countdown-based throttle for one telemetry stream.
#[derive(Debug, Clone)]
pub struct ThrottledReporter {
    id: ParamId,
    interval: i64,
    countdown: i64,
    last_emitted: f64,
}

impl ThrottledReporter {
    /// Reporter for `id` emitting at most `hz` times per second of audio.
    ///
    /// The interval is `floor(sample_rate / hz)`, at least one sample.
    pub fn new(id: ParamId, sample_rate: f64, hz: f64) -> Self {
        let interval = if hz > 0.0 && sample_rate.is_finite() {
            (sample_rate / hz) as i64
        } else {
            sample_rate as i64
        };
        Self {
            id,
            interval: interval.max(1),
            countdown: 0,
            last_emitted: 0.0,
        }
    }

    /// Parameter this reporter speaks for.
    pub fn id(&self) -> ParamId {
        self.id
    }

    /// Interval in samples.
    pub fn interval(&self) -> i64 {
        self.interval
    }

    /// Last value emitted.
    pub fn last_emitted(&self) -> f64 {
        self.last_emitted
    }

    /// Count `block_samples` down and emit `value` if the interval expired and
    /// the value changed.
    pub fn report(&mut self, value: f64, block_samples: usize) -> Option<Telemetry> {
        self.report_with(value, block_samples, |_, current, _| current)
    }

    /// Like [`report`](Self::report), but the emitted value is
    /// `shape(last_emitted, value, interval)`. Useful for meter ballistics.
    pub fn report_with<F>(
        &mut self,
        value: f64,
        block_samples: usize,
        shape: F,
    ) -> Option<Telemetry>
    where
        F: FnOnce(f64, f64, i64) -> f64,
    {
        if !self.reached(block_samples) {
            return None;
        }
        let shaped = shape(self.last_emitted, value, self.interval);
        if shaped == self.last_emitted {
            return None;
        }
        self.last_emitted = shaped;
        Some(Telemetry {
            id: self.id,
            value: shaped,
        })
    }

    /// Forget history: the next report is eligible immediately.
    pub fn reset(&mut self) {
        self.countdown = 0;
        self.last_emitted = 0.0;
    }

    fn reached(&mut self, samples: usize) -> bool {
        self.countdown = self.countdown.saturating_sub(samples as i64);
        if self.countdown > 0 {
            return false;
        }
        self.countdown += self.interval;
        if self.countdown <= 0 {
            // Block longer than the interval: restart rather than accumulate debt.
            self.countdown = self.interval;
        }
        true
    }
}
