//! One-pole parameter smoothing.
//!
//! Control changes arrive as targets; the audible value follows through a
//! one-pole filter advanced once per scheduling slice:
//!
//! ```text
//! smoothed = alpha * target + (1 - alpha) * smoothed
//! ```
//!
//! With `alpha == 1.0` the smoothed value equals the target after a single
//! advance, which is what discrete parameters (filter mode, decay mode,
//! pattern selector) use so they never read stale.
//!
//! ## Usage
//!
//! ```rust
//! use squelch_core::SmoothedParam;
//!
//! let mut cutoff = SmoothedParam::new(0.0, 0.5);
//! cutoff.set_target(1.0);
//!
//! let first = cutoff.advance();
//! assert!((first - 0.5).abs() < 1e-12);
//! let second = cutoff.advance();
//! assert!(second > first && second < 1.0);
//! ```

/// Distance below which the smoothed value snaps onto its target.
pub const SETTLE_EPSILON: f64 = 1e-9;

/// A normalized parameter value with one-pole smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f64,
    /// Target value we're smoothing towards
    target: f64,
    /// Smoothing weight, `0 < alpha <= 1`
    alpha: f64,
}

impl SmoothedParam {
    /// Create a settled parameter at `initial` with smoothing weight `alpha`.
    ///
    /// `alpha` is clamped into `(0, 1]`; non-finite or non-positive weights
    /// fall back to `1.0` (no smoothing).
    pub fn new(initial: f64, alpha: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            alpha: sanitize_alpha(alpha),
        }
    }

    /// Set the target value (the parameter will smooth towards this).
    #[inline]
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Set target and immediately snap to it (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f64) {
        self.target = value;
        self.current = value;
    }

    /// Change the smoothing weight.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = sanitize_alpha(alpha);
    }

    /// Advance one smoothing step and return the new smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f64 {
        let next = self.alpha * self.target + (1.0 - self.alpha) * self.current;
        self.current = if libm::fabs(self.target - next) < SETTLE_EPSILON {
            self.target
        } else {
            next
        };
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f64 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Smoothing weight.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Whether the smoothed value has reached its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Skip ahead to the target value immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

fn sanitize_alpha(alpha: f64) -> f64 {
    if alpha.is_finite() && alpha > 0.0 {
        alpha.min(1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_one_reaches_target_in_one_step() {
        let mut p = SmoothedParam::new(0.2, 1.0);
        p.set_target(0.9);
        assert_eq!(p.advance(), 0.9);
        assert!(p.is_settled());
    }

    #[test]
    fn smoothing_is_convex_combination() {
        let mut p = SmoothedParam::new(0.0, 0.1);
        p.set_target(1.0);
        let v = p.advance();
        assert!((v - 0.1).abs() < 1e-12);
        let v2 = p.advance();
        assert!((v2 - (0.1 + 0.9 * 0.1)).abs() < 1e-12);
    }

    #[test]
    fn converges_and_settles_exactly() {
        let mut p = SmoothedParam::new(0.0, 0.1);
        p.set_target(0.75);
        for _ in 0..1000 {
            p.advance();
        }
        assert!(p.is_settled());
        assert_eq!(p.get(), 0.75);
    }

    #[test]
    fn downward_convergence_is_monotone() {
        let mut p = SmoothedParam::new(1.0, 0.3);
        p.set_target(0.0);
        let mut last = p.get();
        for _ in 0..200 {
            let v = p.advance();
            assert!(v <= last);
            assert!(v >= 0.0);
            last = v;
        }
    }

    #[test]
    fn set_immediate_skips_smoothing() {
        let mut p = SmoothedParam::new(0.0, 0.1);
        p.set_immediate(0.6);
        assert_eq!(p.get(), 0.6);
        assert_eq!(p.target(), 0.6);
    }

    #[test]
    fn invalid_alpha_falls_back_to_instant() {
        assert_eq!(SmoothedParam::new(0.0, 0.0).alpha(), 1.0);
        assert_eq!(SmoothedParam::new(0.0, -3.0).alpha(), 1.0);
        assert_eq!(SmoothedParam::new(0.0, f64::NAN).alpha(), 1.0);
        assert_eq!(SmoothedParam::new(0.0, 4.0).alpha(), 1.0);
        let mut p = SmoothedParam::default();
        p.set_alpha(0.25);
        assert_eq!(p.alpha(), 0.25);
    }

    #[test]
    fn snap_to_target() {
        let mut p = SmoothedParam::new(0.0, 0.01);
        p.set_target(0.5);
        p.advance();
        assert!(!p.is_settled());
        p.snap_to_target();
        assert!(p.is_settled());
    }
}
