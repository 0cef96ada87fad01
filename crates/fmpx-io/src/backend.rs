//! Pluggable audio backend abstraction.
//!
//! [`AudioBackend`] decouples the composite pipeline from any specific
//! platform audio API. The default implementation wraps cpal
//! ([`CpalBackend`](crate::CpalBackend)); tests drive the same seam with a
//! scripted backend.
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │    fmpx run / start_realtime     │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │ list_devices / negotiate / build │
//! └──────────────┬───────────────────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ CpalBackend │  │  scripted   │
//! │  (default)  │  │ test double │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Callbacks are boxed closures so the trait stays object-safe, and streams
//! come back as a type-erased [`StreamHandle`] that stops the stream on drop.

use crate::Result;

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Highest sample rate any supported configuration reaches.
    pub max_sample_rate: u32,
}

/// Configuration for building one audio stream.
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Device name filter (uses the system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 1024,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback or capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Output callback, run on the device thread with an interleaved buffer to
/// fill. Must not allocate, lock or block.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Input callback, run on the device thread with captured interleaved
/// samples.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Called when the backend reports a streaming error.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend.
///
/// Object-safe, so the CLI can hold a `Box<dyn AudioBackend>`.
pub trait AudioBackend: Send {
    /// Short backend name, e.g. `"cpal"`.
    fn name(&self) -> &str;

    /// List all available audio devices.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// The default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// The default input device, if any.
    fn default_input_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build and start an input stream.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// The sample rate the output device will actually run at for `config`.
    ///
    /// Backends that cannot honor the requested rate return the closest rate
    /// they can. The default accepts the request unchanged.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> Result<u32> {
        Ok(config.sample_rate)
    }

    /// Number of interleaved channels the output device delivers for
    /// `config`. The default accepts the request unchanged.
    fn output_channels(&self, config: &BackendStreamConfig) -> Result<u16> {
        Ok(config.channels)
    }

    /// Number of interleaved channels the input device delivers for
    /// `config`. The default accepts the request unchanged.
    fn input_channels(&self, config: &BackendStreamConfig) -> Result<u16> {
        Ok(config.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_stereo() {
        let config = BackendStreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 2);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }
}
