//! Stereo encoder and composite multiplexer.
//!
//! Turns upsampled left/right audio into the composite baseband:
//!
//! ```text
//! mpx = G · ( M + gp·sin θ + gs·S + gr·rds·sin 3θ )
//!
//! M = ga · (L + R) / 2      mono, delayed by D
//! S = subcarrier(ga · (L − R) / 2)
//! ```
//!
//! with θ the 19 kHz pilot phase. The difference signal is carried on the
//! 38 kHz subcarrier according to [`StereoMode`]:
//!
//! | Mode | Subcarrier |
//! |---|---|
//! | DSB | `d·sin 2θ` |
//! | Hartley | `d·sin 2θ + H{d}·cos 2θ` (upper sideband) |
//! | Weaver | quadrature 7.5 kHz LO, low-pass, remix (upper sideband) |
//! | SSB-LPF | `2 · LPF38k(d · sin 2θ)` (lower sideband) |
//! | Mono | none |
//!
//! # Alignment
//!
//! Every encoder FIR has the same odd length, so every audio path is delayed
//! by the same `D` samples. Carriers are evaluated at the current sample and
//! the SSB-LPF input is mixed with the carrier `D` samples ahead, so all
//! modes come out sample-aligned and phase-coherent with the pilot. Filters
//! of inactive modes keep taking input, which lets a mode change crossfade
//! between two valid signals.

use crate::control::{ControlSnapshot, StereoMode};
use crate::rds::RdsSource;
use crate::{FmmodError, Result};
use fmpx_core::{
    DelayLine, DesignError, FirFilter, Harmonic, HilbertTransformer, LinearRamp, Oscillator,
    PeakMeter, WeaverModulator, sanitize,
};

/// Pilot tone frequency.
pub const PILOT_HZ: u32 = 19_000;
/// Stereo subcarrier frequency.
pub const SUBCARRIER_HZ: u32 = 2 * PILOT_HZ;
/// RDS subcarrier frequency.
pub const RDS_SUBCARRIER_HZ: u32 = 3 * PILOT_HZ;
/// Audio bandwidth carried by the multiplex.
pub const AUDIO_BANDWIDTH_HZ: u32 = 15_000;
/// Lowest difference-signal frequency the SSB modes suppress the opposite
/// sideband for by at least 30 dB.
pub const SSB_LOW_EDGE_HZ: u32 = 400;
/// Encoder FIR length in units of `fs / SSB_LOW_EDGE_HZ`.
///
/// A Blackman FIR reaches 30 dB of sideband suppression about `1.6·fs / N`
/// away from its transition center; 2.5 leaves margin at the edge.
const TAPS_PER_EDGE_PERIOD: f64 = 2.5;
/// Duration of the crossfade after a mode change.
pub const CROSSFADE_SECONDS: f32 = 0.002;

/// Odd length of every encoder FIR at `sample_rate`.
///
/// Scales with the rate so the Hilbert, Weaver and SSB-LPF paths keep the
/// same low edge: 1201 taps at 192 kHz, 2401 at 384 kHz.
pub fn encoder_taps(sample_rate: u32) -> usize {
    let n = (TAPS_PER_EDGE_PERIOD * f64::from(sample_rate) / f64::from(SSB_LOW_EDGE_HZ)).ceil();
    (n as usize) | 1
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: StereoMode,
    remaining: u32,
}

/// Per-sample composite generator.
pub struct StereoEncoder {
    osc: Oscillator,
    mono_delay: DelayLine,
    hilbert: HilbertTransformer,
    weaver: WeaverModulator,
    ssb_lpf: FirFilter,

    mode: StereoMode,
    fade: Option<Fade>,
    fade_len: u32,

    audio_gain: LinearRamp,
    pilot_gain: LinearRamp,
    rds_gain: LinearRamp,
    stereo_gain: LinearRamp,
    mpx_gain: LinearRamp,

    meter: PeakMeter,
}

impl StereoEncoder {
    /// Build an encoder running at `sample_rate` with the gains and mode of
    /// `initial`.
    pub fn new(sample_rate: u32, initial: &ControlSnapshot) -> Result<Self> {
        let osc = Oscillator::new(PILOT_HZ, sample_rate, 3).map_err(FmmodError::Oscillator)?;
        let taps = encoder_taps(sample_rate);
        let hilbert = HilbertTransformer::new(taps).map_err(FmmodError::Hilbert)?;
        let ssb_lpf = FirFilter::lowpass(taps, SUBCARRIER_HZ as f32, sample_rate as f32)
            .map_err(FmmodError::LowPassFilter)?;
        let weaver = WeaverModulator::new(taps, AUDIO_BANDWIDTH_HZ, sample_rate).map_err(
            |e| match e {
                DesignError::ZeroFrequency | DesignError::AboveNyquist { .. } => {
                    FmmodError::Oscillator(e)
                }
                _ => FmmodError::LowPassFilter(e),
            },
        )?;
        let mono_delay = DelayLine::new(hilbert.group_delay());
        let fade_len = ((CROSSFADE_SECONDS * sample_rate as f32) as u32).max(1);

        Ok(Self {
            osc,
            mono_delay,
            hilbert,
            weaver,
            ssb_lpf,
            mode: initial.stereo_mode,
            fade: None,
            fade_len,
            audio_gain: LinearRamp::new(initial.audio_gain),
            pilot_gain: LinearRamp::new(initial.pilot_gain),
            rds_gain: LinearRamp::new(initial.rds_gain),
            stereo_gain: LinearRamp::new(initial.stereo_carrier_gain),
            mpx_gain: LinearRamp::new(initial.mpx_gain),
            meter: PeakMeter::new(),
        })
    }

    /// Delay of the audio paths in samples.
    pub fn group_delay(&self) -> usize {
        self.hilbert.group_delay()
    }

    /// Active stereo mode.
    pub fn mode(&self) -> StereoMode {
        self.mode
    }

    /// True while a mode change is being crossfaded.
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Encode one period.
    ///
    /// Processes `min(left, right, out)` samples and returns the peak of
    /// `|mpx|` over them. Gains ramp linearly from their previous values to
    /// those in `snap` across the period. A mode change starts a crossfade;
    /// further changes wait until it completes.
    pub fn process<R: RdsSource + ?Sized>(
        &mut self,
        left: &[f32],
        right: &[f32],
        out: &mut [f32],
        snap: &ControlSnapshot,
        rds: &mut R,
    ) -> f32 {
        let n = left.len().min(right.len()).min(out.len());
        let (left, right, out) = (&left[..n], &right[..n], &mut out[..n]);

        let ramp = n as u32;
        self.audio_gain.set_target_over(snap.audio_gain, ramp);
        self.pilot_gain.set_target_over(snap.pilot_gain, ramp);
        self.rds_gain.set_target_over(snap.rds_gain, ramp);
        self.stereo_gain
            .set_target_over(snap.stereo_carrier_gain, ramp);
        self.mpx_gain.set_target_over(snap.mpx_gain, ramp);

        if snap.stereo_mode != self.mode && self.fade.is_none() {
            self.fade = Some(Fade {
                from: self.mode,
                remaining: self.fade_len,
            });
            self.mode = snap.stereo_mode;
        }

        if let Some(fade) = self.fade {
            let to = self.mode;
            let len = self.fade_len as f32;
            let mut remaining = fade.remaining;
            self.run(left, right, out, rds, |enc, c| {
                if remaining == 0 {
                    return enc.subcarrier(to, c);
                }
                let w = remaining as f32 / len;
                remaining -= 1;
                w * enc.subcarrier(fade.from, c) + (1.0 - w) * enc.subcarrier(to, c)
            });
            self.fade = (remaining > 0).then_some(Fade {
                from: fade.from,
                remaining,
            });
        } else {
            match self.mode {
                StereoMode::Dsb => self.run(left, right, out, rds, |e, c| {
                    e.subcarrier(StereoMode::Dsb, c)
                }),
                StereoMode::SsbHartley => self.run(left, right, out, rds, |e, c| {
                    e.subcarrier(StereoMode::SsbHartley, c)
                }),
                StereoMode::SsbWeaver => self.run(left, right, out, rds, |e, c| {
                    e.subcarrier(StereoMode::SsbWeaver, c)
                }),
                StereoMode::SsbLpf => self.run(left, right, out, rds, |e, c| {
                    e.subcarrier(StereoMode::SsbLpf, c)
                }),
                StereoMode::Mono => self.run(left, right, out, rds, |_, _| 0.0),
            }
        }

        self.meter.take()
    }

    /// Subcarrier for the difference signal now at the filter centers.
    #[inline]
    fn subcarrier(&self, mode: StereoMode, c: Harmonic) -> f32 {
        match mode {
            StereoMode::Dsb => self.hilbert.in_phase() * c.sin,
            StereoMode::SsbHartley => {
                let (re, im) = self.hilbert.output();
                re * c.sin + im * c.cos
            }
            StereoMode::SsbWeaver => self.weaver.output(c),
            StereoMode::SsbLpf => 2.0 * self.ssb_lpf.output(),
            StereoMode::Mono => 0.0,
        }
    }

    #[inline]
    fn run<R, F>(&mut self, left: &[f32], right: &[f32], out: &mut [f32], rds: &mut R, mut sub: F)
    where
        R: RdsSource + ?Sized,
        F: FnMut(&Self, Harmonic) -> f32,
    {
        let lead = self.group_delay() as i64;
        for ((y, &l), &r) in out.iter_mut().zip(left).zip(right) {
            let g = self.audio_gain.advance();
            let mono = self.mono_delay.process(g * 0.5 * (l + r));
            let diff = g * 0.5 * (l - r);

            self.hilbert.push(diff);
            self.weaver.push(diff);
            let ahead = self.osc.harmonic_at(2, lead);
            self.ssb_lpf.push(diff * ahead.sin);

            let pilot = self.osc.harmonic(1).sin;
            let rds_carrier = self.osc.harmonic(3).sin;
            let subcarrier = sub(self, self.osc.harmonic(2));
            let rds_value = sanitize(rds.next_sample(), -1.0, 1.0, 0.0);

            let mpx = self.mpx_gain.advance()
                * (mono
                    + self.pilot_gain.advance() * pilot
                    + self.stereo_gain.advance() * subcarrier
                    + self.rds_gain.advance() * rds_value * rds_carrier);

            *y = mpx;
            self.meter.observe(mpx);
            self.osc.advance();
        }
    }

    /// Discard all signal state and jump to the values in `snap`.
    pub fn reset(&mut self, snap: &ControlSnapshot) {
        self.osc.reset();
        self.mono_delay.reset();
        self.hilbert.reset();
        self.weaver.reset();
        self.ssb_lpf.reset();
        self.mode = snap.stereo_mode;
        self.fade = None;
        self.audio_gain.set_immediate(snap.audio_gain);
        self.pilot_gain.set_immediate(snap.pilot_gain);
        self.rds_gain.set_immediate(snap.rds_gain);
        self.stereo_gain.set_immediate(snap.stereo_carrier_gain);
        self.mpx_gain.set_immediate(snap.mpx_gain);
        self.meter.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::SilentRds;

    const FS: u32 = 192_000;

    fn snapshot(mode: StereoMode) -> ControlSnapshot {
        ControlSnapshot {
            stereo_mode: mode,
            ..ControlSnapshot::default()
        }
    }

    #[test]
    fn rejects_low_processing_rate() {
        let err = StereoEncoder::new(96_000, &ControlSnapshot::default())
            .err()
            .map(|e| e.code());
        assert_eq!(err, Some(crate::ErrorCode::Oscillator));
    }

    #[test]
    fn taps_scale_with_rate() {
        assert_eq!(encoder_taps(192_000), 1201);
        assert_eq!(encoder_taps(384_000), 2401);
        assert_eq!(encoder_taps(228_000) % 2, 1);
        let enc = StereoEncoder::new(FS, &ControlSnapshot::default()).unwrap();
        assert_eq!(enc.group_delay(), 600);
    }

    #[test]
    fn silence_yields_pilot_only() {
        let snap = ControlSnapshot {
            rds_gain: 0.0,
            ..ControlSnapshot::default()
        };
        let mut enc = StereoEncoder::new(FS, &snap).unwrap();
        let zeros = vec![0.0; 960];
        let mut out = vec![0.0; 960];
        let peak = enc.process(&zeros, &zeros, &mut out, &snap, &mut SilentRds);
        for (n, &y) in out.iter().enumerate() {
            let pilot = (std::f64::consts::TAU * 19_000.0 * n as f64 / f64::from(FS)).sin();
            assert!((f64::from(y) - 0.08 * pilot).abs() < 1e-6);
        }
        assert!((peak - 0.08).abs() < 1e-4);
    }

    #[test]
    fn mode_change_crossfades() {
        let mut enc = StereoEncoder::new(FS, &snapshot(StereoMode::Dsb)).unwrap();
        let l = vec![0.5; 256];
        let r = vec![-0.5; 256];
        let mut out = vec![0.0; 256];
        enc.process(&l, &r, &mut out, &snapshot(StereoMode::Dsb), &mut SilentRds);

        enc.process(&l, &r, &mut out, &snapshot(StereoMode::Mono), &mut SilentRds);
        assert_eq!(enc.mode(), StereoMode::Mono);
        assert!(enc.is_fading());

        // A change during the fade is deferred
        enc.process(&l, &r, &mut out, &snapshot(StereoMode::SsbLpf), &mut SilentRds);
        assert_eq!(enc.mode(), StereoMode::Mono);

        // 2 ms at 192 kHz is 384 samples
        assert!(!enc.is_fading());
        enc.process(&l, &r, &mut out, &snapshot(StereoMode::SsbLpf), &mut SilentRds);
        assert_eq!(enc.mode(), StereoMode::SsbLpf);
    }

    #[test]
    fn reset_restores_initial_state() {
        let snap = snapshot(StereoMode::SsbHartley);
        let mut a = StereoEncoder::new(FS, &snap).unwrap();
        let mut b = StereoEncoder::new(FS, &snap).unwrap();
        let tone: Vec<f32> = (0..512).map(|n| (n as f32 * 0.05).sin()).collect();
        let mut out_a = vec![0.0; 512];
        let mut out_b = vec![0.0; 512];

        a.process(&tone, &tone, &mut out_a, &snap, &mut SilentRds);
        a.reset(&snap);
        a.process(&tone, &tone, &mut out_a, &snap, &mut SilentRds);
        b.process(&tone, &tone, &mut out_b, &snap, &mut SilentRds);
        assert_eq!(out_a, out_b);
    }
}
