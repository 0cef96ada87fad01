//! fmpx Analysis - Spectral measurement of FM multiplex signals
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`spectrum`] - Frame-averaged amplitude spectra and band levels
//! - [`mpx`] - Per-band report of a composite signal (pilot, stereo
//!   sidebands, suppressed carrier, RDS)
//!
//! ## Example
//!
//! ```rust
//! use fmpx_analysis::mpx::analyze_mpx;
//!
//! let fs = 192_000.0_f32;
//! let pilot: Vec<f32> = (0..16_384)
//!     .map(|n| 0.08 * (std::f32::consts::TAU * 19_000.0 * n as f32 / fs).sin())
//!     .collect();
//! let report = analyze_mpx(&pilot, fs).unwrap();
//! assert!((report.pilot - 0.08).abs() < 0.01);
//! assert!(report.stereo() < 1e-3);
//! ```

pub mod fft;
pub mod mpx;
pub mod spectrum;

pub use mpx::{MIN_ANALYSIS_RATE, MpxReport, analyze_mpx};
pub use spectrum::Spectrum;
