//! cpal-based audio backend.
//!
//! [`CpalBackend`] is the default [`AudioBackend`]: ALSA on Linux, CoreAudio
//! on macOS, WASAPI on Windows. Composite output wants a device that runs at
//! 192 kHz or more, so device listings also report the highest rate each
//! device supports.

use crate::backend::{
    AudioBackend, AudioDevice, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback,
    StreamHandle,
};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SupportedStreamConfigRange};

/// Extract a device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

fn max_rate(ranges: impl Iterator<Item = SupportedStreamConfigRange>) -> Option<u32> {
    ranges.map(|r| r.max_sample_rate()).max()
}

fn supports(
    ranges: impl Iterator<Item = SupportedStreamConfigRange>,
    rate: u32,
    channels: u16,
) -> bool {
    ranges
        .filter(|r| r.channels() == channels)
        .any(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
}

/// cpal-based audio backend holding the platform's default host.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    fn find_output_device(&self, name: Option<&str>) -> Result<Device> {
        match name {
            Some(search) => {
                let devices = self
                    .host
                    .output_devices()
                    .map_err(|e| Error::Stream(e.to_string()))?;
                find_by_name(devices, search).ok_or_else(|| {
                    Error::DeviceNotFound(format!("no output device matching '{search}'"))
                })
            }
            None => self.host.default_output_device().ok_or(Error::NoDevice),
        }
    }

    fn find_input_device(&self, name: Option<&str>) -> Result<Device> {
        match name {
            Some(search) => {
                let devices = self
                    .host
                    .input_devices()
                    .map_err(|e| Error::Stream(e.to_string()))?;
                find_by_name(devices, search).ok_or_else(|| {
                    Error::DeviceNotFound(format!("no input device matching '{search}'"))
                })
            }
            None => self.host.default_input_device().ok_or(Error::NoDevice),
        }
    }

    fn describe_input(device: &Device, name: String) -> AudioDevice {
        AudioDevice {
            name,
            is_input: true,
            is_output: device.default_output_config().is_ok(),
            default_sample_rate: device
                .default_input_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
            max_sample_rate: device
                .supported_input_configs()
                .ok()
                .and_then(max_rate)
                .unwrap_or(0),
        }
    }

    fn describe_output(device: &Device, name: String) -> AudioDevice {
        AudioDevice {
            name,
            is_input: device.default_input_config().is_ok(),
            is_output: true,
            default_sample_rate: device
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
            max_sample_rate: device
                .supported_output_configs()
                .ok()
                .and_then(max_rate)
                .unwrap_or(0),
        }
    }

    fn stream_config(config: &BackendStreamConfig) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        }
    }
}

/// Case-insensitive substring match on device names.
fn find_by_name(devices: impl Iterator<Item = Device>, search: &str) -> Option<Device> {
    let search_lower = search.to_lowercase();
    devices.into_iter().find(|device| {
        device_name(device).is_ok_and(|name| name.to_lowercase().contains(&search_lower))
    })
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        let mut devices: Vec<AudioDevice> = Vec::new();

        if let Ok(inputs) = self.host.input_devices() {
            for device in inputs {
                if let Ok(name) = device_name(&device) {
                    devices.push(Self::describe_input(&device, name));
                }
            }
        }

        if let Ok(outputs) = self.host.output_devices() {
            for device in outputs {
                if let Ok(name) = device_name(&device) {
                    // Duplex devices were listed with the inputs; keep the
                    // higher of the two rate ceilings.
                    let described = Self::describe_output(&device, name);
                    match devices.iter_mut().find(|d| d.name == described.name) {
                        Some(existing) => {
                            existing.is_output = true;
                            existing.max_sample_rate =
                                existing.max_sample_rate.max(described.max_sample_rate);
                        }
                        None => devices.push(described),
                    }
                }
            }
        }

        Ok(devices)
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(self.host.default_output_device().and_then(|d| {
            device_name(&d)
                .ok()
                .map(|name| Self::describe_output(&d, name))
        }))
    }

    fn default_input_device(&self) -> Result<Option<AudioDevice>> {
        Ok(self.host.default_input_device().and_then(|d| {
            device_name(&d)
                .ok()
                .map(|name| Self::describe_input(&d, name))
        }))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_output_device(config.device_name.as_deref())?;

        let stream = device
            .build_output_stream(
                &Self::stream_config(config),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_input_device(config.device_name.as_deref())?;

        let stream = device
            .build_input_stream(
                &Self::stream_config(config),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    callback(data);
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            "input stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> Result<u32> {
        let device = self.find_output_device(config.device_name.as_deref())?;
        let ranges = device
            .supported_output_configs()
            .map_err(|e| Error::Stream(e.to_string()))?;
        if supports(ranges, config.sample_rate, config.channels) {
            return Ok(config.sample_rate);
        }
        let fallback = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .sample_rate();
        tracing::info!(
            requested = config.sample_rate,
            actual = fallback,
            "output device cannot run at the requested rate"
        );
        Ok(fallback)
    }

    fn output_channels(&self, config: &BackendStreamConfig) -> Result<u16> {
        let device = self.find_output_device(config.device_name.as_deref())?;
        let ranges = device
            .supported_output_configs()
            .map_err(|e| Error::Stream(e.to_string()))?;
        if supports(ranges, config.sample_rate, config.channels) {
            return Ok(config.channels);
        }
        device
            .default_output_config()
            .map(|c| c.channels())
            .map_err(|e| Error::Stream(e.to_string()))
    }

    fn input_channels(&self, config: &BackendStreamConfig) -> Result<u16> {
        let device = self.find_input_device(config.device_name.as_deref())?;
        let ranges = device
            .supported_input_configs()
            .map_err(|e| Error::Stream(e.to_string()))?;
        if supports(ranges, config.sample_rate, config.channels) {
            return Ok(config.channels);
        }
        device
            .default_input_config()
            .map(|c| c.channels())
            .map_err(|e| Error::Stream(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name() {
        let backend = CpalBackend::new();
        assert_eq!(backend.name(), "cpal");
    }

    #[test]
    fn list_devices_does_not_fail_without_hardware() {
        let backend = CpalBackend::new();
        // Device availability depends on the system.
        assert!(backend.list_devices().is_ok());
    }
}
