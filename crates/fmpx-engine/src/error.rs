//! Pipeline error type and its stable numeric codes.
//!
//! Every failure maps to one of thirteen negative codes that external
//! controllers rely on. The codes never change meaning; new failure modes
//! reuse the closest existing code.

use fmpx_core::DesignError;
use std::collections::TryReserveError;

/// Why a tick was rejected before any state was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// The period contained no samples.
    Empty,
    /// Left and right slices differ in length.
    LengthMismatch {
        /// Left channel length.
        left: usize,
        /// Right channel length.
        right: usize,
    },
    /// The period exceeds the size negotiated at initialization.
    TooLong {
        /// Samples offered.
        len: usize,
        /// Negotiated maximum.
        max: usize,
    },
    /// The composite output slice cannot hold the tick.
    OutputTooShort {
        /// Slice length offered.
        len: usize,
        /// Samples required.
        needed: usize,
    },
    /// A sample is NaN or infinite.
    NonFinite {
        /// `"left"` or `"right"`.
        channel: &'static str,
        /// Index of the first bad sample.
        index: usize,
    },
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty period"),
            Self::LengthMismatch { left, right } => {
                write!(f, "left has {left} samples, right has {right}")
            }
            Self::TooLong { len, max } => write!(f, "period of {len} exceeds maximum {max}"),
            Self::OutputTooShort { len, needed } => {
                write!(f, "output holds {len} samples, {needed} needed")
            }
            Self::NonFinite { channel, index } => {
                write!(f, "{channel} sample {index} is not finite")
            }
        }
    }
}

/// Errors reported by the multiplex generator.
#[derive(Debug, thiserror::Error)]
pub enum FmmodError {
    /// Malformed period; the pipeline stays active.
    #[error("invalid input: {0}")]
    InvalidInput(InputError),

    /// The resampler could not be built for the negotiated rates.
    #[error("resampler error: {0}")]
    Resampler(DesignError),

    /// The audio backend failed or cannot provide a usable configuration.
    #[error("audio backend error: {0}")]
    Backend(String),

    /// A buffer could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// The carrier oscillator could not be built.
    #[error("oscillator error: {0}")]
    Oscillator(DesignError),

    /// The RDS source rejected the processing rate.
    #[error("RDS encoder error: {0}")]
    Rds(String),

    /// The control block could not be shared.
    #[error("shared memory error: {0}")]
    SharedMemory(String),

    /// The raw network socket failed.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The streaming server failed.
    #[error("RTP server error: {0}")]
    Rtp(String),

    /// `start` was called on an active pipeline.
    #[error("pipeline already running")]
    AlreadyRunning,

    /// The SSB low-pass or Weaver filters could not be built.
    #[error("low-pass filter error: {0}")]
    LowPassFilter(DesignError),

    /// The Hilbert transformer could not be built.
    #[error("Hilbert transformer error: {0}")]
    Hilbert(DesignError),

    /// The audio pre-emphasis / band-limiting filter could not be built.
    #[error("audio filter error: {0}")]
    AudioFilter(DesignError),
}

impl From<TryReserveError> for FmmodError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

impl From<InputError> for FmmodError {
    fn from(e: InputError) -> Self {
        Self::InvalidInput(e)
    }
}

/// Stable numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// -1
    InvalidInput = -1,
    /// -2
    Resampler = -2,
    /// -3
    Backend = -3,
    /// -4
    OutOfMemory = -4,
    /// -5
    Oscillator = -5,
    /// -6
    Rds = -6,
    /// -7
    SharedMemory = -7,
    /// -8
    Socket = -8,
    /// -9
    Rtp = -9,
    /// -10
    AlreadyRunning = -10,
    /// -11
    LowPassFilter = -11,
    /// -12
    Hilbert = -12,
    /// -13
    AudioFilter = -13,
}

impl ErrorCode {
    /// All codes, in numeric order from -1 down.
    pub const ALL: [ErrorCode; 13] = [
        Self::InvalidInput,
        Self::Resampler,
        Self::Backend,
        Self::OutOfMemory,
        Self::Oscillator,
        Self::Rds,
        Self::SharedMemory,
        Self::Socket,
        Self::Rtp,
        Self::AlreadyRunning,
        Self::LowPassFilter,
        Self::Hilbert,
        Self::AudioFilter,
    ];

    /// Numeric value.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Look up a code by its numeric value.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == code)
    }
}

impl FmmodError {
    /// Stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Resampler(_) => ErrorCode::Resampler,
            Self::Backend(_) => ErrorCode::Backend,
            Self::OutOfMemory => ErrorCode::OutOfMemory,
            Self::Oscillator(_) => ErrorCode::Oscillator,
            Self::Rds(_) => ErrorCode::Rds,
            Self::SharedMemory(_) => ErrorCode::SharedMemory,
            Self::Socket(_) => ErrorCode::Socket,
            Self::Rtp(_) => ErrorCode::Rtp,
            Self::AlreadyRunning => ErrorCode::AlreadyRunning,
            Self::LowPassFilter(_) => ErrorCode::LowPassFilter,
            Self::Hilbert(_) => ErrorCode::Hilbert,
            Self::AudioFilter(_) => ErrorCode::AudioFilter,
        }
    }
}

/// Convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, FmmodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_stable() {
        let values: Vec<i32> = ErrorCode::ALL.iter().map(|c| c.as_i32()).collect();
        assert_eq!(values, (1..=13).map(|n| -n).collect::<Vec<_>>());
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_code(code.as_i32()), Some(code));
        }
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(-14), None);
    }

    #[test]
    fn errors_map_to_codes() {
        assert_eq!(FmmodError::AlreadyRunning.code().as_i32(), -10);
        assert_eq!(
            FmmodError::from(InputError::Empty).code(),
            ErrorCode::InvalidInput
        );
        assert_eq!(
            FmmodError::Hilbert(DesignError::InvalidTaps(4)).code().as_i32(),
            -12
        );
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        assert_eq!(FmmodError::from(io).code(), ErrorCode::Socket);
    }

    #[test]
    fn display_carries_detail() {
        let e = FmmodError::InvalidInput(InputError::LengthMismatch { left: 3, right: 4 });
        assert_eq!(e.to_string(), "invalid input: left has 3 samples, right has 4");
    }
}
