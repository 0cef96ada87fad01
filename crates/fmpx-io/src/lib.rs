//! Device, file and network I/O for the fmpx composite generator.
//!
//! This crate connects a [`Pipeline`](fmpx_engine::Pipeline) to the outside
//! world:
//!
//! - **Audio backends**: the [`AudioBackend`] trait and its cpal
//!   implementation [`CpalBackend`]
//! - **Real-time bridge**: [`duplex_bridge`] splits a pipeline into a capture
//!   side and a render side for two device callbacks; [`start_realtime`]
//!   wires them to a backend
//! - **WAV files**: [`read_wav_stereo`] for program audio and
//!   [`write_composite_wav`] for rendered MPX
//! - **Network output**: [`UdpSink`] and the [`spawn_sender`] worker that
//!   drains the pipeline's network handoff
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fmpx_engine::{ControlBlock, Pipeline, PipelineConfig, SilentRds};
//! use fmpx_io::{CpalBackend, StreamSettings, start_realtime};
//! use std::sync::Arc;
//!
//! let backend = CpalBackend::new();
//! let settings = StreamSettings::default();
//! let negotiated = settings.negotiate(&backend)?;
//! let config = PipelineConfig::new(negotiated.sample_rate, negotiated.max_period);
//! let pipeline = Pipeline::new(config, Arc::new(ControlBlock::new()), Box::new(SilentRds))?;
//! let session = start_realtime(&backend, pipeline, &settings, &negotiated)?;
//! // Streams run until `session` is dropped.
//! ```

pub mod backend;
pub mod cpal_backend;
mod network;
mod stream;
mod wav;

pub use backend::{
    AudioBackend, AudioDevice, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback,
    StreamHandle,
};
pub use cpal_backend::CpalBackend;
pub use network::{
    MAX_DATAGRAM_SAMPLES, NetworkSink, NetworkWorker, SenderStats, UdpSink, encode_datagram,
    spawn_sender,
};
pub use stream::{
    CaptureSide, Negotiated, RealtimeSession, RenderSide, StreamSettings, StreamStats,
    duplex_bridge, start_realtime,
};
pub use wav::{
    StereoSamples, WavFormat, WavInfo, read_composite_wav, read_wav_info, read_wav_stereo,
    write_composite_wav, write_wav_stereo,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The file or device uses a layout this crate cannot handle.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Pipeline or network error carrying a stable error code.
    #[error(transparent)]
    Fmmod(#[from] fmpx_engine::FmmodError),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
