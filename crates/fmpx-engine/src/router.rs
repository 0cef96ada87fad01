//! Output path selection.
//!
//! The composite needs at least [`MIN_MPX_RATE`] to carry the RDS subcarrier
//! at 57 kHz with room for its sidebands. A backend running that fast gets the
//! composite on its output port. A slower backend still supplies the audio,
//! but the composite is only handed to the network path, generated at a
//! separately chosen rate of at least [`MIN_MPX_RATE`].

use crate::{FmmodError, Result};

/// Lowest composite sample rate.
pub const MIN_MPX_RATE: u32 = 192_000;

/// Where the composite goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    /// Backend output port only.
    AudioPort,
    /// Network handoff only; the backend output receives silence.
    Network,
    /// Backend output port and network handoff.
    Both,
}

impl OutputTarget {
    /// True when the backend output port carries the composite.
    pub fn uses_audio_port(self) -> bool {
        matches!(self, Self::AudioPort | Self::Both)
    }

    /// True when composite buffers are published to the network handoff.
    pub fn uses_network(self) -> bool {
        matches!(self, Self::Network | Self::Both)
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::AudioPort => "audio port",
            Self::Network => "network",
            Self::Both => "audio port + network",
        }
    }
}

/// Output routing decided at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Where the composite goes.
    pub target: OutputTarget,
    /// Rate the composite is generated at.
    pub processing_rate: u32,
}

/// Choose the output path for a backend running at `backend_rate`.
///
/// `network_rate` is the composite rate used when the backend is too slow;
/// values below [`MIN_MPX_RATE`] are raised to it.
///
/// Fails with [`FmmodError::Backend`] when the backend rate is zero, or when
/// it is too low for the audio port and the network path is disabled.
pub fn select_output(
    backend_rate: u32,
    network_enabled: bool,
    network_rate: u32,
) -> Result<Route> {
    if backend_rate == 0 {
        return Err(FmmodError::Backend("backend reported a zero sample rate".into()));
    }

    let route = if backend_rate >= MIN_MPX_RATE {
        Route {
            target: if network_enabled {
                OutputTarget::Both
            } else {
                OutputTarget::AudioPort
            },
            processing_rate: backend_rate,
        }
    } else if network_enabled {
        Route {
            target: OutputTarget::Network,
            processing_rate: network_rate.max(MIN_MPX_RATE),
        }
    } else {
        return Err(FmmodError::Backend(format!(
            "backend rate {backend_rate} Hz is below {MIN_MPX_RATE} Hz and network output is disabled"
        )));
    };

    tracing::info!(
        backend_rate,
        processing_rate = route.processing_rate,
        target = route.target.name(),
        "output route selected"
    );
    Ok(route)
}
