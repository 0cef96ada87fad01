//! Input-rate audio conditioning: pre-emphasis and 15 kHz band limiting.
//!
//! Runs on the raw left/right audio before upsampling, when the control
//! block's `use_audio_lpf` flag is set. Content above 15 kHz would spill into
//! the pilot guard band, so a station normally leaves the filter on.
//!
//! Both the filtered and the bypass path are kept running. The bypass path
//! is delayed by the filter's group delay, so switching the filter on or off
//! never shifts the audio in time, and the switch crossfades linearly over
//! [`CROSSFADE_SECONDS`].

use crate::control::Preemphasis;
use crate::encoder::CROSSFADE_SECONDS;
use crate::{FmmodError, Result};
use fmpx_core::{DelayLine, FirFilter, LinearRamp, PreEmphasis, TAU_50US, TAU_75US};

/// Upper edge of the broadcast audio band.
pub const AUDIO_CUTOFF_HZ: f32 = 15_000.0;

/// Odd tap count giving a transition band of roughly 3.5 kHz.
fn tap_count(sample_rate: u32) -> usize {
    ((5.5 * sample_rate as f32 / 3_500.0) as usize) | 1
}

struct Channel {
    pre_50us: PreEmphasis,
    pre_75us: PreEmphasis,
    lpf: FirFilter,
    bypass: DelayLine,
    /// Weight of the filtered path: 0 bypass, 1 filtered.
    mix: LinearRamp,
    fade_len: u32,
}

fn weight(enabled: bool) -> f32 {
    if enabled { 1.0 } else { 0.0 }
}

impl Channel {
    fn new(sample_rate: u32, enabled: bool) -> Result<Self> {
        let fs = sample_rate as f32;
        let cutoff = AUDIO_CUTOFF_HZ.min(0.45 * fs);
        let lpf = FirFilter::lowpass(tap_count(sample_rate), cutoff, fs)
            .map_err(FmmodError::AudioFilter)?;
        let pre_50us = PreEmphasis::new(TAU_50US, fs).map_err(FmmodError::AudioFilter)?;
        let pre_75us = PreEmphasis::new(TAU_75US, fs).map_err(FmmodError::AudioFilter)?;
        let bypass = DelayLine::new(lpf.group_delay());
        Ok(Self {
            pre_50us,
            pre_75us,
            lpf,
            bypass,
            mix: LinearRamp::new(weight(enabled)),
            fade_len: ((CROSSFADE_SECONDS * fs) as u32).max(1),
        })
    }

    fn process(&mut self, block: &mut [f32], enabled: bool, preemphasis: Preemphasis) {
        let target = weight(enabled);
        if target != self.mix.target() {
            self.mix.set_target_over(target, self.fade_len);
        }
        for x in block {
            let raw = *x;
            // Both shelves run so a selector change lands on a settled filter
            let us50 = self.pre_50us.process(raw);
            let us75 = self.pre_75us.process(raw);
            self.lpf.push(match preemphasis {
                Preemphasis::Us50 => us50,
                Preemphasis::Us75 => us75,
                Preemphasis::Off => raw,
            });
            let delayed = self.bypass.process(raw);
            let w = self.mix.advance();
            *x = if w <= 0.0 {
                delayed
            } else if w >= 1.0 {
                self.lpf.output()
            } else {
                w * self.lpf.output() + (1.0 - w) * delayed
            };
        }
    }

    fn reset(&mut self, enabled: bool) {
        self.pre_50us.reset();
        self.pre_75us.reset();
        self.lpf.reset();
        self.bypass.reset();
        self.mix.set_immediate(weight(enabled));
    }
}

/// Stereo pre-emphasis and band-limiting filter.
pub struct AudioFilter {
    left: Channel,
    right: Channel,
}

impl AudioFilter {
    /// Build the filter for audio at `sample_rate`, starting on or off
    /// without a fade.
    pub fn new(sample_rate: u32, enabled: bool) -> Result<Self> {
        Ok(Self {
            left: Channel::new(sample_rate, enabled)?,
            right: Channel::new(sample_rate, enabled)?,
        })
    }

    /// Delay added to the audio, in input samples.
    pub fn group_delay(&self) -> usize {
        self.left.lpf.group_delay()
    }

    /// Filter both channels in place.
    ///
    /// With `enabled` false the audio passes through unchanged apart from
    /// the group delay. Pre-emphasis follows `preemphasis` and only applies
    /// while the filter is enabled. A change of `enabled` fades between the
    /// two paths.
    pub fn process(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        enabled: bool,
        preemphasis: Preemphasis,
    ) {
        self.left.process(left, enabled, preemphasis);
        self.right.process(right, enabled, preemphasis);
    }

    /// Clear all filter state and settle on or off.
    pub fn reset(&mut self, enabled: bool) {
        self.left.reset(enabled);
        self.right.reset(enabled);
    }
}
