//! Station configuration validation.
//!
//! Collects every problem in a [`StationConfig`](crate::StationConfig) at
//! once so a station operator can fix the file in one pass.

use crate::station::StationConfig;
use fmpx_engine::{MAX_GAIN, MIN_MPX_RATE, Preemphasis, StereoMode};
use std::net::SocketAddr;
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric field out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted field name, e.g. `mpx.pilot_gain`.
        field: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Unknown stereo mode name.
    #[error("unknown stereo mode '{0}' (expected dsb, hartley, weaver, ssb-lpf or mono)")]
    UnknownMode(String),

    /// Unknown pre-emphasis name.
    #[error("unknown pre-emphasis '{0}' (expected 50us, 75us or off)")]
    UnknownPreemphasis(String),

    /// Field with an unusable value.
    #[error("invalid '{field}': {reason}")]
    Invalid {
        /// Dotted field name.
        field: String,
        /// Description of the problem.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Parse a stereo mode name.
pub fn parse_stereo_mode(name: &str) -> ValidationResult<StereoMode> {
    StereoMode::from_name(name).ok_or_else(|| ValidationError::UnknownMode(name.to_string()))
}

/// Parse a pre-emphasis name.
pub fn parse_preemphasis(name: &str) -> ValidationResult<Preemphasis> {
    Preemphasis::from_name(name)
        .ok_or_else(|| ValidationError::UnknownPreemphasis(name.to_string()))
}

fn check_range(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

/// Validate a whole station configuration.
pub fn validate_station(config: &StationConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if let Some(rate) = config.audio.sample_rate {
        check_range(&mut errors, "audio.sample_rate", f64::from(rate), 8_000.0, 768_000.0);
    }
    if config.audio.buffer_size == 0 {
        errors.push(ValidationError::Invalid {
            field: "audio.buffer_size".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let mpx = &config.mpx;
    check_range(
        &mut errors,
        "mpx.processing_rate",
        f64::from(mpx.processing_rate),
        f64::from(MIN_MPX_RATE),
        768_000.0,
    );
    for (field, gain) in [
        ("mpx.audio_gain", mpx.audio_gain),
        ("mpx.pilot_gain", mpx.pilot_gain),
        ("mpx.rds_gain", mpx.rds_gain),
        ("mpx.stereo_carrier_gain", mpx.stereo_carrier_gain),
        ("mpx.mpx_gain", mpx.mpx_gain),
    ] {
        // NaN fails the range check too
        check_range(&mut errors, field, f64::from(gain), 0.0, f64::from(MAX_GAIN));
    }
    if let Err(e) = parse_stereo_mode(&mpx.stereo_mode) {
        errors.push(e);
    }
    if let Err(e) = parse_preemphasis(&mpx.preemphasis) {
        errors.push(e);
    }

    let net = &config.network;
    if net.target.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Invalid {
            field: "network.target".into(),
            reason: format!("'{}' is not a socket address", net.target),
        });
    }
    if net.slots == 0 {
        errors.push(ValidationError::Invalid {
            field: "network.slots".into(),
            reason: "must be greater than zero".into(),
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        validate_station(&StationConfig::default()).unwrap();
    }

    #[test]
    fn reports_single_problem_directly() {
        let mut c = StationConfig::default();
        c.mpx.processing_rate = 96_000;
        let err = validate_station(&c).unwrap_err();
        assert!(
            matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "mpx.processing_rate")
        );
    }

    #[test]
    fn collects_every_problem() {
        let mut c = StationConfig::default();
        c.audio.buffer_size = 0;
        c.mpx.pilot_gain = 3.0;
        c.mpx.audio_gain = f32::NAN;
        c.mpx.stereo_mode = "quadrature".into();
        c.mpx.preemphasis = "60us".into();
        c.network.target = "nowhere".into();

        let ValidationError::Multiple(errors) = validate_station(&c).unwrap_err() else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&ValidationError::UnknownMode("quadrature".into())));
        assert!(errors.contains(&ValidationError::UnknownPreemphasis("60us".into())));
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!(parse_stereo_mode("Weaver").unwrap(), StereoMode::SsbWeaver);
        assert_eq!(parse_preemphasis("off").unwrap(), Preemphasis::Off);
        assert!(parse_stereo_mode("ssb").is_err());
    }
}
