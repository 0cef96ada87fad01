//! RDS baseband source interface.
//!
//! The pipeline does not encode RDS itself. It asks an [`RdsSource`] for one
//! shaped baseband value per processing-rate sample and multiplies it onto
//! the 57 kHz subcarrier.

use crate::Result;

/// Supplier of RDS baseband samples.
///
/// Called from the real-time thread: `next_sample` must not block or
/// allocate.
pub trait RdsSource: Send {
    /// Prepare for `sample_rate` Hz. Called once, before the first sample.
    ///
    /// Sources that cannot run at this rate return
    /// [`FmmodError::Rds`](crate::FmmodError::Rds).
    fn prepare(&mut self, sample_rate: u32) -> Result<()>;

    /// Next baseband value, expected in `[-1, 1]`.
    fn next_sample(&mut self) -> f32;

    /// Discard any in-flight symbol state.
    fn reset(&mut self) {}
}

/// Source producing no RDS signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentRds;

impl RdsSource for SilentRds {
    fn prepare(&mut self, _sample_rate: u32) -> Result<()> {
        Ok(())
    }

    fn next_sample(&mut self) -> f32 {
        0.0
    }
}

impl<S: RdsSource + ?Sized> RdsSource for Box<S> {
    fn prepare(&mut self, sample_rate: u32) -> Result<()> {
        (**self).prepare(sample_rate)
    }

    fn next_sample(&mut self) -> f32 {
        (**self).next_sample()
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}
