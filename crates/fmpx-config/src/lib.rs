//! Station configuration for the fmpx FM multiplex generator.
//!
//! A station is described by one TOML file with three sections: `[audio]`
//! for the sound device, `[mpx]` for the initial gains and modes written
//! into the control block, and `[network]` for the UDP composite output.
//!
//! # Features
//!
//! - **Station file**: Load, validate and save [`StationConfig`]
//! - **Overrides**: `key=value` control assignments from the command line
//! - **Validation**: Every problem in a file reported at once
//! - **Paths**: Platform-specific default location
//!
//! # Example
//!
//! ```rust
//! use fmpx_config::StationConfig;
//!
//! let mut station = StationConfig::from_toml(r#"
//!     [mpx]
//!     stereo_mode = "hartley"
//! "#).unwrap();
//! station.apply_override("pilot_gain=0.09").unwrap();
//! station.validate().unwrap();
//!
//! let snapshot = station.snapshot().unwrap();
//! assert_eq!(snapshot.pilot_gain, 0.09);
//! ```

mod error;
mod station;

/// Platform-specific configuration paths.
pub mod paths;

/// Station configuration validation.
pub mod validation;

pub use error::ConfigError;
pub use paths::{STATION_FILE, default_station_path, ensure_user_config_dir, user_config_dir};
pub use station::{AudioSection, MpxSection, NetworkSection, StationConfig};
pub use validation::{ValidationError, ValidationResult, validate_station};
