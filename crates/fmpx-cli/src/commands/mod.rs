//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod devices;
pub mod render;
pub mod run;
pub mod station;
