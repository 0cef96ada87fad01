//! fmpx Core - DSP primitives for FM multiplex generation
//!
//! This crate provides the building blocks of a stereo FM composite (MPX)
//! encoder, designed for real-time use: every primitive is validated once at
//! construction, allocates only then, and is infallible afterwards.
//!
//! # Core Abstractions
//!
//! ## Carriers
//!
//! - [`Oscillator`] - Integer-phase oscillator with exact, drift-free
//!   harmonics (19 kHz pilot, 38 kHz stereo and 57 kHz RDS subcarriers)
//!
//! ## Filters
//!
//! - [`FirFilter`] - Streaming FIR with separate push/output, see [`design_lowpass`]
//! - [`HilbertTransformer`] - Windowed type III FIR, analytic signal output
//! - [`WeaverModulator`] - Quadrature LO + matched low-pass pair for SSB
//! - [`PreEmphasis`] - 50/75 µs broadcast pre-emphasis shelf
//! - [`DelayLine`] - Integer delay for aligning parallel paths
//!
//! ## Rate Conversion
//!
//! - [`Resampler`] - Streaming polyphase rational upsampler
//!
//! ## Metering & Control
//!
//! - [`PeakMeter`] - Exact per-block peak
//! - [`LinearRamp`] - Per-block linear gain ramps
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`sinc`], [`blackman`], [`gcd`], [`sanitize`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc` for filter storage).
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! fmpx-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use fmpx_core::{FirFilter, Oscillator};
//!
//! let mut osc = Oscillator::new(19_000, 192_000, 3).unwrap();
//! let mut lpf = FirFilter::lowpass(257, 38_000.0, 192_000.0).unwrap();
//!
//! let audio = [0.5_f32; 64];
//! let mut out = [0.0_f32; 64];
//! for (y, &x) in out.iter_mut().zip(&audio) {
//!     let carrier = osc.harmonic(2);
//!     *y = lpf.process(x * carrier.sin);
//!     osc.advance();
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations after construction
//! - **Phase exact**: Carrier phase is an integer, never an accumulated float
//! - **Aligned**: Every filter reports its group delay so paths can be matched

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod delay;
pub mod error;
pub mod fir;
pub mod hilbert;
pub mod math;
pub mod oscillator;
pub mod param;
pub mod peak;
pub mod preemphasis;
pub mod resampler;
pub mod weaver;

// Re-export main types at crate root
pub use delay::DelayLine;
pub use error::DesignError;
pub use fir::{FirFilter, design_lowpass};
pub use hilbert::HilbertTransformer;
pub use math::{
    blackman, db_to_linear, dot, flush_denormal, gcd, linear_to_db, peak_abs, sanitize, sinc,
};
pub use oscillator::{Harmonic, Oscillator};
pub use param::LinearRamp;
pub use peak::PeakMeter;
pub use preemphasis::{PreEmphasis, SHELF_LIMIT_HZ, TAU_50US, TAU_75US};
pub use resampler::{MAX_FILTER_LEN, Resampler, TAPS_PER_PHASE};
pub use weaver::WeaverModulator;
