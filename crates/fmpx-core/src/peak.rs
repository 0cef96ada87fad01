//! Per-block peak meter.

/// Tracks the largest absolute sample value seen since the last
/// [`PeakMeter::take`].
///
/// No ballistics: every block reports its own exact maximum, which is what
/// a deviation meter on the composite output needs. A NaN sample holds the
/// meter at NaN until the next [`PeakMeter::take`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakMeter {
    current: f32,
}

impl PeakMeter {
    /// Create a meter reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one sample.
    #[inline]
    pub fn observe(&mut self, x: f32) {
        let a = x.abs();
        if a > self.current || a.is_nan() {
            self.current = a;
        }
    }

    /// Account for a block of samples.
    pub fn observe_block(&mut self, block: &[f32]) {
        self.observe(crate::peak_abs(block));
    }

    /// Current peak without resetting.
    pub fn peak(&self) -> f32 {
        self.current
    }

    /// Return the peak and start a new measurement.
    pub fn take(&mut self) -> f32 {
        core::mem::take(&mut self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_exact_block_maximum() {
        let mut m = PeakMeter::new();
        m.observe_block(&[0.1, -0.9, 0.3]);
        m.observe(0.5);
        assert_eq!(m.take(), 0.9);
        assert_eq!(m.peak(), 0.0);
    }

    #[test]
    fn nan_holds_until_taken() {
        let mut m = PeakMeter::new();
        m.observe(0.5);
        m.observe(f32::NAN);
        m.observe(0.75);
        assert!(m.take().is_nan());

        m.observe_block(&[0.1, f32::NAN]);
        m.observe(0.25);
        assert!(m.take().is_nan());

        m.observe(0.25);
        assert_eq!(m.take(), 0.25);
    }
}
