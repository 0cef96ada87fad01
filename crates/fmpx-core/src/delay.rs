//! Fixed integer delay line.
//!
//! Used to give a signal path the same latency as a parallel FIR path so the
//! two stay sample-aligned.

use alloc::vec;
use alloc::vec::Vec;

/// Integer-sample delay with a length fixed at construction.
///
/// A delay of zero passes samples straight through.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    /// Create a delay of `samples` samples.
    pub fn new(samples: usize) -> Self {
        Self {
            buffer: vec![0.0; samples],
            pos: 0,
        }
    }

    /// Delay length in samples.
    pub fn delay(&self) -> usize {
        self.buffer.len()
    }

    /// Insert `x` and return the sample from `delay()` calls ago.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        if self.buffer.is_empty() {
            return x;
        }
        let out = self.buffer[self.pos];
        self.buffer[self.pos] = x;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }
        out
    }

    /// Clear the buffer.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}
