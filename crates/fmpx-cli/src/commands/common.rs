//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use fmpx_config::{StationConfig, default_station_path};
use fmpx_engine::Pipeline;
use std::path::Path;

/// Load the station file and apply `--set` overrides.
///
/// An explicit `path` must exist. Without one the default station file is
/// used when present and built-in defaults otherwise.
pub fn load_station(path: Option<&Path>, overrides: &[String]) -> anyhow::Result<StationConfig> {
    let mut station = match path {
        Some(path) => StationConfig::load(path)?,
        None => StationConfig::load_or_default(default_station_path())?,
    };
    for assignment in overrides {
        station
            .apply_override(assignment)
            .with_context(|| format!("in --set {assignment}"))?;
    }
    station.validate()?;
    Ok(station)
}

/// One-line summary of a pipeline's negotiated configuration.
pub fn describe_pipeline(pipeline: &Pipeline) -> String {
    format!(
        "{} Hz in, {} Hz composite to {}, {:.1} samples added latency",
        pipeline.backend_rate(),
        pipeline.processing_rate(),
        pipeline.output_target().name(),
        pipeline.added_latency()
    )
}
