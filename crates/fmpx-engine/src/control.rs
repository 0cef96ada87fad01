//! Shared control block.
//!
//! [`ControlBlock`] is the record external controllers write gains and mode
//! selections into and read peak meters back from. Every field is one 4-byte
//! atomic so the audio thread reads it lock-free. `f32` values are stored as
//! their bit patterns in `AtomicU32`.
//!
//! The field order and widths form a stable `#[repr(C)]` layout of 52 bytes:
//!
//! | Offset | Field | Type |
//! |---|---|---|
//! | 0 | audio_gain | f32 |
//! | 4 | pilot_gain | f32 |
//! | 8 | rds_gain | f32 |
//! | 12 | stereo_carrier_gain | f32 |
//! | 16 | mpx_gain | f32 |
//! | 20 | stereo_modulation | i32 |
//! | 24 | use_audio_lpf | i32 |
//! | 28 | preemph_tau | i32 |
//! | 32 | peak_mpx_out | f32 |
//! | 36 | peak_audio_in_l | f32 |
//! | 40 | peak_audio_in_r | f32 |
//! | 44 | sample_rate | i32 |
//! | 48 | max_samples | i32 |
//!
//! Writers may store anything; the audio thread never trusts it. All
//! validation happens in [`ControlBlock::snapshot`], once per period.

use fmpx_core::{TAU_50US, TAU_75US, sanitize};
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// Default audio gain.
pub const DEFAULT_AUDIO_GAIN: f32 = 0.40;
/// Default pilot injection.
pub const DEFAULT_PILOT_GAIN: f32 = 0.08;
/// Default RDS injection.
pub const DEFAULT_RDS_GAIN: f32 = 0.04;
/// Default stereo subcarrier gain.
pub const DEFAULT_STEREO_CARRIER_GAIN: f32 = 1.0;
/// Default composite output gain.
pub const DEFAULT_MPX_GAIN: f32 = 1.0;
/// Largest accepted gain.
pub const MAX_GAIN: f32 = 2.0;

/// Stereo difference-signal modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StereoMode {
    /// Double sideband, suppressed carrier.
    #[default]
    Dsb,
    /// Upper sideband via Hilbert transformer (phasing method).
    SsbHartley,
    /// Upper sideband via Weaver's third method.
    SsbWeaver,
    /// Lower sideband by low-passing the DSB signal at the carrier.
    SsbLpf,
    /// No subcarrier; pilot and RDS only.
    Mono,
}

impl StereoMode {
    /// All modes in index order.
    pub const ALL: [StereoMode; 5] = [
        Self::Dsb,
        Self::SsbHartley,
        Self::SsbWeaver,
        Self::SsbLpf,
        Self::Mono,
    ];

    /// Mode for a control-block index, `None` when out of range.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Control-block index.
    pub fn index(self) -> i32 {
        match self {
            Self::Dsb => 0,
            Self::SsbHartley => 1,
            Self::SsbWeaver => 2,
            Self::SsbLpf => 3,
            Self::Mono => 4,
        }
    }

    /// Short name used on the command line and in config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dsb => "dsb",
            Self::SsbHartley => "hartley",
            Self::SsbWeaver => "weaver",
            Self::SsbLpf => "ssb-lpf",
            Self::Mono => "mono",
        }
    }

    /// Parse a [`Self::name`] (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

/// Pre-emphasis time constant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Preemphasis {
    /// 50 µs.
    #[default]
    Us50,
    /// 75 µs.
    Us75,
    /// Flat.
    Off,
}

impl Preemphasis {
    /// All selectors in index order.
    pub const ALL: [Preemphasis; 3] = [Self::Us50, Self::Us75, Self::Off];

    /// Selector for a control-block index, `None` when out of range.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Control-block index.
    pub fn index(self) -> i32 {
        match self {
            Self::Us50 => 0,
            Self::Us75 => 1,
            Self::Off => 2,
        }
    }

    /// Time constant in seconds, `None` when flat.
    pub fn time_constant(self) -> Option<f32> {
        match self {
            Self::Us50 => Some(TAU_50US),
            Self::Us75 => Some(TAU_75US),
            Self::Off => None,
        }
    }

    /// Short name used on the command line and in config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Us50 => "50us",
            Self::Us75 => "75us",
            Self::Off => "off",
        }
    }

    /// Parse a [`Self::name`] (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Writable control parameters, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlParam {
    /// `audio_gain`
    AudioGain,
    /// `pilot_gain`
    PilotGain,
    /// `rds_gain`
    RdsGain,
    /// `stereo_carrier_gain`
    StereoCarrierGain,
    /// `mpx_gain`
    MpxGain,
    /// `stereo_modulation`
    StereoModulation,
    /// `use_audio_lpf`
    UseAudioLpf,
    /// `preemph_tau`
    PreemphTau,
}

impl ControlParam {
    /// All writable parameters.
    pub const ALL: [ControlParam; 8] = [
        Self::AudioGain,
        Self::PilotGain,
        Self::RdsGain,
        Self::StereoCarrierGain,
        Self::MpxGain,
        Self::StereoModulation,
        Self::UseAudioLpf,
        Self::PreemphTau,
    ];

    /// Field name in the control block.
    pub fn name(self) -> &'static str {
        match self {
            Self::AudioGain => "audio_gain",
            Self::PilotGain => "pilot_gain",
            Self::RdsGain => "rds_gain",
            Self::StereoCarrierGain => "stereo_carrier_gain",
            Self::MpxGain => "mpx_gain",
            Self::StereoModulation => "stereo_modulation",
            Self::UseAudioLpf => "use_audio_lpf",
            Self::PreemphTau => "preemph_tau",
        }
    }

    /// Look up a parameter by field name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// True for gains, false for integer selectors.
    pub fn is_gain(self) -> bool {
        matches!(
            self,
            Self::AudioGain
                | Self::PilotGain
                | Self::RdsGain
                | Self::StereoCarrierGain
                | Self::MpxGain
        )
    }
}

/// Validated view of the control block, taken once per period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSnapshot {
    /// Audio gain in `[0, MAX_GAIN]`.
    pub audio_gain: f32,
    /// Pilot gain in `[0, MAX_GAIN]`.
    pub pilot_gain: f32,
    /// RDS gain in `[0, MAX_GAIN]`.
    pub rds_gain: f32,
    /// Stereo subcarrier gain in `[0, MAX_GAIN]`.
    pub stereo_carrier_gain: f32,
    /// Composite gain in `[0, MAX_GAIN]`.
    pub mpx_gain: f32,
    /// Stereo modulation.
    pub stereo_mode: StereoMode,
    /// Whether the audio band-limiting filter (and pre-emphasis) runs.
    pub use_audio_lpf: bool,
    /// Pre-emphasis selector.
    pub preemphasis: Preemphasis,
}

impl Default for ControlSnapshot {
    fn default() -> Self {
        Self {
            audio_gain: DEFAULT_AUDIO_GAIN,
            pilot_gain: DEFAULT_PILOT_GAIN,
            rds_gain: DEFAULT_RDS_GAIN,
            stereo_carrier_gain: DEFAULT_STEREO_CARRIER_GAIN,
            mpx_gain: DEFAULT_MPX_GAIN,
            stereo_mode: StereoMode::Dsb,
            use_audio_lpf: true,
            preemphasis: Preemphasis::Us50,
        }
    }
}

/// Lock-free shared control record.
#[derive(Debug)]
#[repr(C)]
pub struct ControlBlock {
    audio_gain: AtomicU32,
    pilot_gain: AtomicU32,
    rds_gain: AtomicU32,
    stereo_carrier_gain: AtomicU32,
    mpx_gain: AtomicU32,
    stereo_modulation: AtomicI32,
    use_audio_lpf: AtomicI32,
    preemph_tau: AtomicI32,
    peak_mpx_out: AtomicU32,
    peak_audio_in_l: AtomicU32,
    peak_audio_in_r: AtomicU32,
    sample_rate: AtomicI32,
    max_samples: AtomicI32,
}

fn load_f32(a: &AtomicU32) -> f32 {
    f32::from_bits(a.load(Ordering::Relaxed))
}

fn store_f32(a: &AtomicU32, v: f32) {
    a.store(v.to_bits(), Ordering::Relaxed);
}

impl ControlBlock {
    /// Create a block holding the defaults of [`ControlSnapshot`].
    pub fn new() -> Self {
        Self::from_snapshot(&ControlSnapshot::default())
    }

    /// Create a block initialized from `s`.
    pub fn from_snapshot(s: &ControlSnapshot) -> Self {
        Self {
            audio_gain: AtomicU32::new(s.audio_gain.to_bits()),
            pilot_gain: AtomicU32::new(s.pilot_gain.to_bits()),
            rds_gain: AtomicU32::new(s.rds_gain.to_bits()),
            stereo_carrier_gain: AtomicU32::new(s.stereo_carrier_gain.to_bits()),
            mpx_gain: AtomicU32::new(s.mpx_gain.to_bits()),
            stereo_modulation: AtomicI32::new(s.stereo_mode.index()),
            use_audio_lpf: AtomicI32::new(i32::from(s.use_audio_lpf)),
            preemph_tau: AtomicI32::new(s.preemphasis.index()),
            peak_mpx_out: AtomicU32::new(0),
            peak_audio_in_l: AtomicU32::new(0),
            peak_audio_in_r: AtomicU32::new(0),
            sample_rate: AtomicI32::new(0),
            max_samples: AtomicI32::new(0),
        }
    }

    /// Write a parameter. Gains take `value` as is; selectors truncate it to
    /// an integer. Nothing is validated here.
    pub fn set(&self, param: ControlParam, value: f32) {
        let int = value as i32;
        match param {
            ControlParam::AudioGain => store_f32(&self.audio_gain, value),
            ControlParam::PilotGain => store_f32(&self.pilot_gain, value),
            ControlParam::RdsGain => store_f32(&self.rds_gain, value),
            ControlParam::StereoCarrierGain => store_f32(&self.stereo_carrier_gain, value),
            ControlParam::MpxGain => store_f32(&self.mpx_gain, value),
            ControlParam::StereoModulation => self.stereo_modulation.store(int, Ordering::Relaxed),
            ControlParam::UseAudioLpf => self.use_audio_lpf.store(int, Ordering::Relaxed),
            ControlParam::PreemphTau => self.preemph_tau.store(int, Ordering::Relaxed),
        }
    }

    /// Raw value of a parameter as last written.
    pub fn get(&self, param: ControlParam) -> f32 {
        match param {
            ControlParam::AudioGain => load_f32(&self.audio_gain),
            ControlParam::PilotGain => load_f32(&self.pilot_gain),
            ControlParam::RdsGain => load_f32(&self.rds_gain),
            ControlParam::StereoCarrierGain => load_f32(&self.stereo_carrier_gain),
            ControlParam::MpxGain => load_f32(&self.mpx_gain),
            ControlParam::StereoModulation => self.stereo_modulation.load(Ordering::Relaxed) as f32,
            ControlParam::UseAudioLpf => self.use_audio_lpf.load(Ordering::Relaxed) as f32,
            ControlParam::PreemphTau => self.preemph_tau.load(Ordering::Relaxed) as f32,
        }
    }

    /// Select the stereo modulation.
    pub fn set_stereo_mode(&self, mode: StereoMode) {
        self.stereo_modulation
            .store(mode.index(), Ordering::Relaxed);
    }

    /// Select the pre-emphasis.
    pub fn set_preemphasis(&self, p: Preemphasis) {
        self.preemph_tau.store(p.index(), Ordering::Relaxed);
    }

    /// Enable or disable the audio filter.
    pub fn set_use_audio_lpf(&self, on: bool) {
        self.use_audio_lpf.store(i32::from(on), Ordering::Relaxed);
    }

    /// Read every control value and validate it.
    ///
    /// Non-finite gains fall back to their defaults, finite gains are clamped
    /// to `[0, MAX_GAIN]` and unknown selector values fall back to the
    /// default selection.
    pub fn snapshot(&self) -> ControlSnapshot {
        let d = ControlSnapshot::default();
        let gain = |a: &AtomicU32, default: f32| sanitize(load_f32(a), 0.0, MAX_GAIN, default);

        ControlSnapshot {
            audio_gain: gain(&self.audio_gain, d.audio_gain),
            pilot_gain: gain(&self.pilot_gain, d.pilot_gain),
            rds_gain: gain(&self.rds_gain, d.rds_gain),
            stereo_carrier_gain: gain(&self.stereo_carrier_gain, d.stereo_carrier_gain),
            mpx_gain: gain(&self.mpx_gain, d.mpx_gain),
            stereo_mode: StereoMode::from_index(self.stereo_modulation.load(Ordering::Relaxed))
                .unwrap_or(d.stereo_mode),
            use_audio_lpf: self.use_audio_lpf.load(Ordering::Relaxed) != 0,
            preemphasis: Preemphasis::from_index(self.preemph_tau.load(Ordering::Relaxed))
                .unwrap_or(d.preemphasis),
        }
    }

    /// Publish this period's peaks.
    pub fn publish_peaks(&self, mpx_out: f32, audio_in_l: f32, audio_in_r: f32) {
        store_f32(&self.peak_mpx_out, mpx_out);
        store_f32(&self.peak_audio_in_l, audio_in_l);
        store_f32(&self.peak_audio_in_r, audio_in_r);
    }

    /// Publish the negotiated backend rate and maximum period.
    pub fn publish_negotiation(&self, sample_rate: u32, max_samples: usize) {
        let clamp = |v: u64| i32::try_from(v).unwrap_or(i32::MAX);
        self.sample_rate
            .store(clamp(u64::from(sample_rate)), Ordering::Relaxed);
        self.max_samples
            .store(clamp(max_samples as u64), Ordering::Relaxed);
    }

    /// Peak of the composite output in the last period.
    pub fn peak_mpx_out(&self) -> f32 {
        load_f32(&self.peak_mpx_out)
    }

    /// Peak of the left input in the last period.
    pub fn peak_audio_in_l(&self) -> f32 {
        load_f32(&self.peak_audio_in_l)
    }

    /// Peak of the right input in the last period.
    pub fn peak_audio_in_r(&self) -> f32 {
        load_f32(&self.peak_audio_in_r)
    }

    /// Published backend sample rate (0 before initialization).
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    /// Published maximum period (0 before initialization).
    pub fn max_samples(&self) -> i32 {
        self.max_samples.load(Ordering::Relaxed)
    }
}

impl Default for ControlBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layout_is_stable() {
        assert_eq!(size_of::<ControlBlock>(), 52);
        assert_eq!(offset_of!(ControlBlock, audio_gain), 0);
        assert_eq!(offset_of!(ControlBlock, mpx_gain), 16);
        assert_eq!(offset_of!(ControlBlock, stereo_modulation), 20);
        assert_eq!(offset_of!(ControlBlock, preemph_tau), 28);
        assert_eq!(offset_of!(ControlBlock, peak_mpx_out), 32);
        assert_eq!(offset_of!(ControlBlock, peak_audio_in_r), 40);
        assert_eq!(offset_of!(ControlBlock, sample_rate), 44);
        assert_eq!(offset_of!(ControlBlock, max_samples), 48);
    }

    #[test]
    fn snapshot_clamps_and_defaults() {
        let c = ControlBlock::new();
        c.set(ControlParam::AudioGain, f32::NAN);
        c.set(ControlParam::PilotGain, 9.0);
        c.set(ControlParam::RdsGain, -1.0);
        c.set(ControlParam::MpxGain, f32::NEG_INFINITY);
        c.set(ControlParam::StereoModulation, 7.0);
        c.set(ControlParam::PreemphTau, -3.0);

        let s = c.snapshot();
        assert_eq!(s.audio_gain, DEFAULT_AUDIO_GAIN);
        assert_eq!(s.pilot_gain, MAX_GAIN);
        assert_eq!(s.rds_gain, 0.0);
        assert_eq!(s.mpx_gain, DEFAULT_MPX_GAIN);
        assert_eq!(s.stereo_mode, StereoMode::Dsb);
        assert_eq!(s.preemphasis, Preemphasis::Us50);
    }

    #[test]
    fn set_and_snapshot_roundtrip() {
        let c = ControlBlock::new();
        c.set_stereo_mode(StereoMode::SsbWeaver);
        c.set_preemphasis(Preemphasis::Off);
        c.set_use_audio_lpf(false);
        c.set(ControlParam::StereoCarrierGain, 0.5);
        let s = c.snapshot();
        assert_eq!(s.stereo_mode, StereoMode::SsbWeaver);
        assert_eq!(s.preemphasis, Preemphasis::Off);
        assert!(!s.use_audio_lpf);
        assert_eq!(s.stereo_carrier_gain, 0.5);
        assert_eq!(c.get(ControlParam::StereoModulation), 2.0);
    }

    #[test]
    fn names_roundtrip() {
        for p in ControlParam::ALL {
            assert_eq!(ControlParam::from_name(p.name()), Some(p));
        }
        for m in StereoMode::ALL {
            assert_eq!(StereoMode::from_name(m.name()), Some(m));
            assert_eq!(StereoMode::from_index(m.index()), Some(m));
        }
        assert_eq!(Preemphasis::from_name("75US"), Some(Preemphasis::Us75));
        assert_eq!(ControlParam::from_name("peak_mpx_out"), None);
    }

    #[test]
    fn negotiation_is_published() {
        let c = ControlBlock::new();
        assert_eq!(c.sample_rate(), 0);
        c.publish_negotiation(48_000, 1024);
        assert_eq!((c.sample_rate(), c.max_samples()), (48_000, 1024));
        c.publish_peaks(0.9, 0.1, 0.2);
        assert_eq!(c.peak_mpx_out(), 0.9);
        assert_eq!(c.peak_audio_in_r(), 0.2);
    }
}
