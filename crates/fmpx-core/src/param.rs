//! Linear parameter ramps.
//!
//! Gains read from the control block change at block boundaries. Jumping to
//! the new value would put a step into the composite signal, so each gain
//! ramps linearly across the block instead.

/// Linearly ramped parameter.
///
/// When the target does not change the value stays bit-exact, so a station
/// running at fixed gains multiplies by exactly the configured value.
///
/// # Example
///
/// ```rust
/// use fmpx_core::LinearRamp;
///
/// let mut gain = LinearRamp::new(0.0);
/// gain.set_target_over(1.0, 4);
/// let steps: Vec<f32> = (0..4).map(|_| gain.advance()).collect();
/// assert_eq!(steps, [0.25, 0.5, 0.75, 1.0]);
/// assert!(gain.is_settled());
/// ```
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    increment: f32,
    samples_remaining: u32,
}

impl LinearRamp {
    /// Create a settled ramp at `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
        }
    }

    /// Ramp to `target` over the next `samples` calls to [`Self::advance`].
    pub fn set_target_over(&mut self, target: f32, samples: u32) {
        if target == self.target && self.samples_remaining == 0 {
            return;
        }
        self.target = target;
        if samples == 0 {
            self.set_immediate(target);
        } else {
            self.increment = (target - self.current) / samples as f32;
            self.samples_remaining = samples;
        }
    }

    /// Jump to `value`.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    /// Next value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Value being ramped to.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// True when no ramp is in progress.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}

impl Default for LinearRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_target_is_exact() {
        let mut g = LinearRamp::new(0.4);
        for _ in 0..3 {
            g.set_target_over(0.4, 512);
            for _ in 0..512 {
                assert_eq!(g.advance(), 0.4);
            }
        }
    }

    #[test]
    fn ramp_lands_on_target() {
        let mut g = LinearRamp::new(0.1);
        g.set_target_over(0.7, 333);
        let mut last = g.get();
        for _ in 0..333 {
            let v = g.advance();
            assert!(v >= last);
            last = v;
        }
        assert_eq!(g.get(), 0.7);
        assert!(g.is_settled());
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current() {
        let mut g = LinearRamp::new(0.0);
        g.set_target_over(1.0, 10);
        for _ in 0..5 {
            g.advance();
        }
        g.set_target_over(0.0, 5);
        let first = g.advance();
        assert!((first - 0.4).abs() < 1e-6, "{first}");
    }

    #[test]
    fn zero_length_jumps() {
        let mut g = LinearRamp::new(0.0);
        g.set_target_over(2.0, 0);
        assert_eq!(g.get(), 2.0);
        assert!(g.is_settled());
    }
}
