//! fmpx Engine - Real-time FM stereo multiplex generator
//!
//! Turns a stereo audio stream into the composite baseband an FM exciter
//! transmits: mono sum, 19 kHz pilot, the L−R difference on a 38 kHz
//! subcarrier (double or single sideband) and an RDS signal on 57 kHz.
//!
//! # Core Abstractions
//!
//! - [`Pipeline`] - Owns all state; one call per audio period
//! - [`StereoEncoder`] - Per-sample composite generator for every [`StereoMode`]
//! - [`AudioFilter`] - Pre-emphasis and 15 kHz band limiting at the input rate
//! - [`ControlBlock`] - Lock-free gains, selectors and peak meters shared
//!   with external controllers
//! - [`RdsSource`] - Supplier of the RDS baseband
//! - [`HandoffConsumer`] - Network end of the composite buffer handoff
//!
//! # Errors
//!
//! Every failure is an [`FmmodError`] carrying one of thirteen stable
//! [`ErrorCode`]s.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fmpx_engine::{ControlBlock, Pipeline, PipelineConfig, SilentRds, StereoMode};
//!
//! let control = Arc::new(ControlBlock::new());
//! control.set_stereo_mode(StereoMode::SsbHartley);
//!
//! let config = PipelineConfig::new(192_000, 512);
//! let mut pipeline = Pipeline::new(config, Arc::clone(&control), Box::new(SilentRds))?;
//! pipeline.start()?;
//!
//! let left = vec![0.0_f32; 512];
//! let right = vec![0.0_f32; 512];
//! let mut mpx = vec![0.0_f32; 512];
//! let produced = pipeline.process(&left, &right, &mut mpx)?;
//! assert_eq!(produced, 512);
//! assert!(control.peak_mpx_out() > 0.0);
//! # Ok::<(), fmpx_engine::FmmodError>(())
//! ```

pub mod audio_filter;
pub mod control;
pub mod encoder;
pub mod error;
pub mod handoff;
pub mod pipeline;
pub mod rds;
pub mod router;

pub use audio_filter::{AUDIO_CUTOFF_HZ, AudioFilter};
pub use control::{
    ControlBlock, ControlParam, ControlSnapshot, DEFAULT_AUDIO_GAIN, DEFAULT_MPX_GAIN,
    DEFAULT_PILOT_GAIN, DEFAULT_RDS_GAIN, DEFAULT_STEREO_CARRIER_GAIN, MAX_GAIN, Preemphasis,
    StereoMode,
};
pub use encoder::{
    AUDIO_BANDWIDTH_HZ, CROSSFADE_SECONDS, PILOT_HZ, RDS_SUBCARRIER_HZ, SSB_LOW_EDGE_HZ,
    SUBCARRIER_HZ, StereoEncoder, encoder_taps,
};
pub use error::{ErrorCode, FmmodError, InputError, Result};
pub use handoff::{HandoffBuffer, HandoffConsumer, HandoffProducer, handoff_channel};
pub use pipeline::{DEFAULT_HANDOFF_SLOTS, Pipeline, PipelineConfig, ShutdownHandle};
pub use rds::{RdsSource, SilentRds};
pub use router::{MIN_MPX_RATE, OutputTarget, Route, select_output};
