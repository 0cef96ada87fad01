//! Construction errors for DSP primitives.
//!
//! Every primitive validates its parameters once, at construction, and never
//! fails afterwards. The variants carry only `Copy` data so the type stays
//! usable without an allocator.

/// Reason a filter, oscillator or resampler could not be built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DesignError {
    /// Sample rate must be non-zero.
    ZeroSampleRate,
    /// Tap count is zero, or even where a symmetric odd-length filter is required.
    InvalidTaps(usize),
    /// Cutoff must lie strictly between 0 and the Nyquist frequency.
    InvalidCutoff {
        /// Requested cutoff in Hz.
        cutoff_hz: f32,
        /// Sample rate the filter was designed for.
        sample_rate: f32,
    },
    /// Highest generated harmonic would reach or exceed Nyquist.
    AboveNyquist {
        /// Frequency of the offending harmonic in Hz.
        frequency_hz: u64,
        /// Sample rate in Hz.
        sample_rate: u32,
    },
    /// Oscillator frequency must be non-zero.
    ZeroFrequency,
    /// Resampling would lower the rate; only upsampling is supported.
    Downsampling {
        /// Source rate in Hz.
        from: u32,
        /// Target rate in Hz.
        to: u32,
    },
    /// The polyphase bank for this ratio exceeds the coefficient budget.
    RatioTooComplex {
        /// Interpolation factor after gcd reduction.
        up: u32,
        /// Decimation factor after gcd reduction.
        down: u32,
    },
    /// Time constant must be positive and finite.
    InvalidTimeConstant,
}

impl core::fmt::Display for DesignError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ZeroSampleRate => write!(f, "sample rate must be non-zero"),
            Self::InvalidTaps(n) => write!(f, "invalid tap count {n}"),
            Self::InvalidCutoff {
                cutoff_hz,
                sample_rate,
            } => write!(
                f,
                "cutoff {cutoff_hz} Hz outside (0, {}) for {sample_rate} Hz",
                sample_rate / 2.0
            ),
            Self::AboveNyquist {
                frequency_hz,
                sample_rate,
            } => write!(
                f,
                "{frequency_hz} Hz is not below Nyquist at {sample_rate} Hz"
            ),
            Self::ZeroFrequency => write!(f, "oscillator frequency must be non-zero"),
            Self::Downsampling { from, to } => {
                write!(f, "cannot resample down from {from} Hz to {to} Hz")
            }
            Self::RatioTooComplex { up, down } => {
                write!(f, "ratio {up}/{down} needs too many filter phases")
            }
            Self::InvalidTimeConstant => write!(f, "time constant must be positive"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DesignError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_names_the_offending_values() {
        let msg = DesignError::Downsampling {
            from: 192_000,
            to: 48_000,
        }
        .to_string();
        assert!(msg.contains("192000") && msg.contains("48000"), "got: {msg}");

        let msg = DesignError::AboveNyquist {
            frequency_hz: 57_000,
            sample_rate: 96_000,
        }
        .to_string();
        assert!(msg.contains("57000"), "got: {msg}");
    }
}
