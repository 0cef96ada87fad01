//! Integration tests for fmpx-config.

use fmpx_config::{ConfigError, StationConfig, ValidationError};
use fmpx_engine::{ControlBlock, Preemphasis, StereoMode};
use std::fs;
use tempfile::TempDir;

#[test]
fn save_and_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("station.toml");

    let mut station = StationConfig::default();
    station.audio.sample_rate = Some(192_000);
    station.audio.input_device = Some("USB Audio".into());
    station.mpx.stereo_mode = "hartley".into();
    station.mpx.preemphasis = "75us".into();
    station.network.enabled = true;
    station.network.target = "10.0.0.7:6000".into();
    station.save(&path).unwrap();

    let loaded = StationConfig::load(&path).unwrap();
    assert_eq!(loaded, station);
}

#[test]
fn load_or_default_without_file() {
    let temp = TempDir::new().unwrap();
    let station = StationConfig::load_or_default(temp.path().join("missing.toml")).unwrap();
    assert_eq!(station, StationConfig::default());
}

#[test]
fn load_reports_path_of_unreadable_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    match StationConfig::load(&path) {
        Err(ConfigError::ReadFile { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected ReadFile, got {other:?}"),
    }
}

#[test]
fn invalid_file_lists_all_problems() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("station.toml");
    fs::write(
        &path,
        r#"
        [audio]
        buffer_size = 0

        [mpx]
        processing_rate = 48000
        stereo_mode = "vsb"
        "#,
    )
    .unwrap();

    match StationConfig::load(&path) {
        Err(ConfigError::Validation(ValidationError::Multiple(errors))) => {
            assert_eq!(errors.len(), 3)
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn snapshot_seeds_control_block() {
    let mut station = StationConfig::from_toml(
        r#"
        [mpx]
        stereo_mode = "mono"
        preemphasis = "off"
        audio_lpf = false
        "#,
    )
    .unwrap();
    station.apply_override("rds_gain=0.05").unwrap();
    station.validate().unwrap();

    let control = ControlBlock::from_snapshot(&station.snapshot().unwrap());
    let s = control.snapshot();
    assert_eq!(s.stereo_mode, StereoMode::Mono);
    assert_eq!(s.preemphasis, Preemphasis::Off);
    assert!(!s.use_audio_lpf);
    assert_eq!(s.rds_gain, 0.05);
}
