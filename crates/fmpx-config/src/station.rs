//! Station configuration file format and operations.

use crate::error::ConfigError;
use crate::validation::{parse_preemphasis, parse_stereo_mode, validate_station};
use fmpx_engine::{
    ControlParam, ControlSnapshot, DEFAULT_AUDIO_GAIN, DEFAULT_HANDOFF_SLOTS, DEFAULT_MPX_GAIN,
    DEFAULT_PILOT_GAIN, DEFAULT_RDS_GAIN, DEFAULT_STEREO_CARRIER_GAIN, MIN_MPX_RATE,
    PipelineConfig, Preemphasis, StereoMode,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio device settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSection {
    /// Requested device sample rate; the device default when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Requested period in frames.
    pub buffer_size: u32,
    /// Capture device name (substring match); the default input when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Playback device name (substring match); the default output when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            sample_rate: None,
            buffer_size: 1024,
            input_device: None,
            output_device: None,
        }
    }
}

/// Multiplex settings. Gains and selectors seed the control block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MpxSection {
    /// Composite rate used when the audio device runs below it.
    pub processing_rate: u32,
    /// Audio gain.
    pub audio_gain: f32,
    /// Pilot injection.
    pub pilot_gain: f32,
    /// RDS injection.
    pub rds_gain: f32,
    /// Stereo subcarrier gain.
    pub stereo_carrier_gain: f32,
    /// Composite output gain.
    pub mpx_gain: f32,
    /// Stereo mode name: `dsb`, `hartley`, `weaver`, `ssb-lpf` or `mono`.
    pub stereo_mode: String,
    /// Pre-emphasis: `50us`, `75us` or `off`.
    pub preemphasis: String,
    /// Run the 15 kHz audio filter and pre-emphasis.
    pub audio_lpf: bool,
}

impl Default for MpxSection {
    fn default() -> Self {
        Self {
            processing_rate: MIN_MPX_RATE,
            audio_gain: DEFAULT_AUDIO_GAIN,
            pilot_gain: DEFAULT_PILOT_GAIN,
            rds_gain: DEFAULT_RDS_GAIN,
            stereo_carrier_gain: DEFAULT_STEREO_CARRIER_GAIN,
            mpx_gain: DEFAULT_MPX_GAIN,
            stereo_mode: StereoMode::Dsb.name().to_string(),
            preemphasis: Preemphasis::Us50.name().to_string(),
            audio_lpf: true,
        }
    }
}

/// Network output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkSection {
    /// Send the composite over UDP.
    pub enabled: bool,
    /// Destination `host:port`.
    pub target: String,
    /// Handoff buffers between the audio thread and the sender.
    pub slots: usize,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            enabled: false,
            target: "127.0.0.1:5004".to_string(),
            slots: DEFAULT_HANDOFF_SLOTS,
        }
    }
}

/// Complete station configuration.
///
/// # TOML Format
///
/// ```toml
/// [audio]
/// sample_rate = 192000
/// buffer_size = 1024
/// input_device = "USB"
///
/// [mpx]
/// stereo_mode = "hartley"
/// preemphasis = "75us"
/// pilot_gain = 0.09
///
/// [network]
/// enabled = true
/// target = "192.168.1.20:5004"
/// ```
///
/// Every section and field is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StationConfig {
    /// Audio device settings.
    pub audio: AudioSection,
    /// Multiplex settings.
    pub mpx: MpxSection,
    /// Network output settings.
    pub network: NetworkSection,
}

impl StationConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load `path` if it exists, the defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: StationConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(validate_station(self)?)
    }

    /// Initial control values.
    pub fn snapshot(&self) -> Result<ControlSnapshot, ConfigError> {
        Ok(ControlSnapshot {
            audio_gain: self.mpx.audio_gain,
            pilot_gain: self.mpx.pilot_gain,
            rds_gain: self.mpx.rds_gain,
            stereo_carrier_gain: self.mpx.stereo_carrier_gain,
            mpx_gain: self.mpx.mpx_gain,
            stereo_mode: parse_stereo_mode(&self.mpx.stereo_mode)?,
            use_audio_lpf: self.mpx.audio_lpf,
            preemphasis: parse_preemphasis(&self.mpx.preemphasis)?,
        })
    }

    /// Pipeline parameters for a backend negotiated at `backend_rate` with
    /// periods of up to `max_period` frames.
    pub fn pipeline_config(&self, backend_rate: u32, max_period: usize) -> PipelineConfig {
        PipelineConfig {
            network_enabled: self.network.enabled,
            handoff_slots: self.network.slots,
            network_rate: self.mpx.processing_rate,
            ..PipelineConfig::new(backend_rate, max_period)
        }
    }

    /// Apply a `key=value` override to the `[mpx]` section.
    ///
    /// Keys are control parameter names. Selectors accept either their
    /// name (`stereo_modulation=hartley`) or their index
    /// (`stereo_modulation=1`). The result is not validated here.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .ok_or_else(|| ConfigError::InvalidOverride(assignment.to_string()))?;
        let param =
            ControlParam::from_name(key).ok_or_else(|| ConfigError::UnknownParameter(key.into()))?;

        let number = || {
            value
                .parse::<f32>()
                .map_err(|_| ConfigError::InvalidOverride(assignment.to_string()))
        };
        let mpx = &mut self.mpx;
        match param {
            ControlParam::AudioGain => mpx.audio_gain = number()?,
            ControlParam::PilotGain => mpx.pilot_gain = number()?,
            ControlParam::RdsGain => mpx.rds_gain = number()?,
            ControlParam::StereoCarrierGain => mpx.stereo_carrier_gain = number()?,
            ControlParam::MpxGain => mpx.mpx_gain = number()?,
            ControlParam::StereoModulation => {
                mpx.stereo_mode = match value.parse::<i32>() {
                    Ok(index) => StereoMode::from_index(index)
                        .map_or_else(|| value.to_string(), |m| m.name().to_string()),
                    Err(_) => value.to_string(),
                };
            }
            ControlParam::PreemphTau => {
                mpx.preemphasis = match value.parse::<i32>() {
                    Ok(index) => Preemphasis::from_index(index)
                        .map_or_else(|| value.to_string(), |p| p.name().to_string()),
                    Err(_) => value.to_string(),
                };
            }
            ControlParam::UseAudioLpf => {
                mpx.audio_lpf = match value {
                    "1" | "true" | "on" => true,
                    "0" | "false" | "off" => false,
                    _ => return Err(ConfigError::InvalidOverride(assignment.to_string())),
                };
            }
        }
        Ok(())
    }
}
