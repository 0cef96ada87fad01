//! The per-period multiplex pipeline.
//!
//! A [`Pipeline`] owns every buffer and every piece of signal state. The
//! backend calls [`Pipeline::process`] once per period with the raw stereo
//! input and the slice to fill with composite:
//!
//! ```text
//! input peaks → audio filter → upsample → encoder → route → publish peaks
//! ```
//!
//! All buffers are sized at construction from the negotiated maximum period;
//! `process` never allocates, locks or blocks.
//!
//! # Lifecycle
//!
//! A new pipeline is inactive and outputs silence until [`Pipeline::start`].
//! A [`ShutdownHandle`] clears the activity flag from any thread. The next
//! period then discards all filter, resampler and oscillator state without
//! flushing it and outputs silence.

use crate::audio_filter::AudioFilter;
use crate::control::ControlBlock;
use crate::encoder::StereoEncoder;
use crate::error::InputError;
use crate::handoff::{HandoffConsumer, HandoffProducer, handoff_channel};
use crate::rds::RdsSource;
use crate::router::{MIN_MPX_RATE, OutputTarget, select_output};
use crate::{FmmodError, Result};
use fmpx_core::{Resampler, peak_abs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default number of network handoff buffers.
pub const DEFAULT_HANDOFF_SLOTS: usize = 8;

/// Parameters negotiated with the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Backend sample rate in Hz.
    pub backend_rate: u32,
    /// Largest period the backend will deliver.
    pub max_period: usize,
    /// Whether composite buffers go to the network handoff.
    pub network_enabled: bool,
    /// Number of network handoff buffers.
    pub handoff_slots: usize,
    /// Composite rate when the backend is slower than [`MIN_MPX_RATE`].
    pub network_rate: u32,
}

impl PipelineConfig {
    /// Configuration for `backend_rate` and `max_period` with the network
    /// path disabled.
    pub fn new(backend_rate: u32, max_period: usize) -> Self {
        Self {
            backend_rate,
            max_period,
            network_enabled: false,
            handoff_slots: DEFAULT_HANDOFF_SLOTS,
            network_rate: MIN_MPX_RATE,
        }
    }

    /// Enable or disable the network path.
    #[must_use]
    pub fn with_network(mut self, enabled: bool) -> Self {
        self.network_enabled = enabled;
        self
    }
}

#[derive(Debug)]
struct Lifecycle {
    active: AtomicBool,
    reset_pending: AtomicBool,
}

/// Cloneable handle that stops a pipeline from any thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    lifecycle: Arc<Lifecycle>,
}

impl ShutdownHandle {
    /// Clear the activity flag. The next period resets all signal state
    /// and outputs silence.
    pub fn shutdown(&self) {
        if self.lifecycle.active.swap(false, Ordering::AcqRel) {
            self.lifecycle.reset_pending.store(true, Ordering::Release);
            tracing::info!("pipeline shutdown requested");
        }
    }

    /// True while the pipeline is producing composite.
    pub fn is_active(&self) -> bool {
        self.lifecycle.active.load(Ordering::Acquire)
    }
}

fn alloc(len: usize) -> Result<Vec<f32>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, 0.0);
    Ok(v)
}

/// Real-time FM multiplex generator.
pub struct Pipeline {
    control: Arc<ControlBlock>,
    lifecycle: Arc<Lifecycle>,
    target: OutputTarget,
    backend_rate: u32,
    processing_rate: u32,
    max_period: usize,
    added_latency: f64,

    audio_filter: AudioFilter,
    resampler_l: Resampler,
    resampler_r: Resampler,
    encoder: StereoEncoder,
    rds: Box<dyn RdsSource>,

    network: Option<HandoffProducer>,
    network_consumer: Option<HandoffConsumer>,

    in_l: Vec<f32>,
    in_r: Vec<f32>,
    up_l: Vec<f32>,
    up_r: Vec<f32>,
    mpx: Vec<f32>,
}

impl Pipeline {
    /// Build a pipeline for the negotiated backend configuration.
    ///
    /// Chooses the output route, builds every filter, allocates every
    /// buffer and prepares `rds` for the processing rate. The negotiated
    /// rate and period are published to `control`.
    pub fn new(
        config: PipelineConfig,
        control: Arc<ControlBlock>,
        mut rds: Box<dyn RdsSource>,
    ) -> Result<Self> {
        if config.max_period == 0 {
            return Err(FmmodError::Backend("backend reported a zero period".into()));
        }
        let route = select_output(
            config.backend_rate,
            config.network_enabled,
            config.network_rate,
        )?;
        let snap = control.snapshot();

        let audio_filter = AudioFilter::new(config.backend_rate, snap.use_audio_lpf)?;
        let resampler_l = Resampler::new(config.backend_rate, route.processing_rate)
            .map_err(FmmodError::Resampler)?;
        let resampler_r = resampler_l.clone();
        let encoder = StereoEncoder::new(route.processing_rate, &snap)?;
        rds.prepare(route.processing_rate)?;

        let up_len = resampler_l.max_output_len(config.max_period);
        let (network, network_consumer) = if route.target.uses_network() {
            let (tx, rx) = handoff_channel(config.handoff_slots, up_len)?;
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let backend = f64::from(config.backend_rate);
        let processing = f64::from(route.processing_rate);
        let added_latency = audio_filter.group_delay() as f64
            + resampler_l.delay_input_samples()
            + encoder.group_delay() as f64 * backend / processing;

        control.publish_negotiation(config.backend_rate, config.max_period);

        tracing::info!(
            backend_rate = config.backend_rate,
            processing_rate = route.processing_rate,
            max_period = config.max_period,
            target = route.target.name(),
            added_latency,
            "pipeline initialized"
        );

        Ok(Self {
            control,
            lifecycle: Arc::new(Lifecycle {
                active: AtomicBool::new(false),
                reset_pending: AtomicBool::new(false),
            }),
            target: route.target,
            backend_rate: config.backend_rate,
            processing_rate: route.processing_rate,
            max_period: config.max_period,
            added_latency,
            audio_filter,
            resampler_l,
            resampler_r,
            encoder,
            rds,
            network,
            network_consumer,
            in_l: alloc(config.max_period)?,
            in_r: alloc(config.max_period)?,
            up_l: alloc(up_len)?,
            up_r: alloc(up_len)?,
            mpx: alloc(up_len)?,
        })
    }

    /// Mark the pipeline active.
    ///
    /// Fails with [`FmmodError::AlreadyRunning`] when it already is.
    pub fn start(&self) -> Result<()> {
        self.lifecycle
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FmmodError::AlreadyRunning)?;
        tracing::info!(processing_rate = self.processing_rate, "pipeline started");
        Ok(())
    }

    /// Handle that stops this pipeline from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }

    /// True while the pipeline is producing composite.
    pub fn is_active(&self) -> bool {
        self.lifecycle.active.load(Ordering::Acquire)
    }

    /// Take the network end of the handoff. `None` when the route has no
    /// network path or the consumer was already taken.
    pub fn take_network_consumer(&mut self) -> Option<HandoffConsumer> {
        self.network_consumer.take()
    }

    /// Where the composite goes.
    pub fn output_target(&self) -> OutputTarget {
        self.target
    }

    /// Backend sample rate.
    pub fn backend_rate(&self) -> u32 {
        self.backend_rate
    }

    /// Rate the composite is generated at.
    pub fn processing_rate(&self) -> u32 {
        self.processing_rate
    }

    /// Largest period accepted by [`Self::process`].
    pub fn max_period(&self) -> usize {
        self.max_period
    }

    /// Delay from audio input to composite output, in backend samples.
    pub fn added_latency(&self) -> f64 {
        self.added_latency
    }

    /// Most composite samples one period can produce.
    pub fn max_output_len(&self) -> usize {
        self.mpx.len()
    }

    /// Shared control block.
    pub fn control(&self) -> &Arc<ControlBlock> {
        &self.control
    }

    /// Network buffers overwritten before the consumer read them.
    pub fn network_overruns(&self) -> u64 {
        self.network.as_ref().map_or(0, HandoffProducer::overruns)
    }

    /// Run one period.
    ///
    /// `left` and `right` are the raw input at the backend rate. `out` is the
    /// backend output port; it receives the composite when the route uses the
    /// audio port and silence otherwise. Returns the number of composite
    /// samples produced.
    ///
    /// A malformed period fails with [`FmmodError::InvalidInput`] before any
    /// state is touched; the pipeline stays active.
    pub fn process(&mut self, left: &[f32], right: &[f32], out: &mut [f32]) -> Result<usize> {
        if self.lifecycle.reset_pending.swap(false, Ordering::AcqRel) {
            self.reset();
        }
        if !self.is_active() {
            out.fill(0.0);
            return Ok(0);
        }

        let n = self.validate(left, right, out)?;
        let snap = self.control.snapshot();

        let peak_l = peak_abs(left);
        let peak_r = peak_abs(right);

        let in_l = &mut self.in_l[..n];
        let in_r = &mut self.in_r[..n];
        in_l.copy_from_slice(left);
        in_r.copy_from_slice(right);
        self.audio_filter
            .process(in_l, in_r, snap.use_audio_lpf, snap.preemphasis);

        let m = self.resampler_l.process(in_l, &mut self.up_l);
        let m_r = self.resampler_r.process(in_r, &mut self.up_r);
        debug_assert_eq!(m, m_r);

        let peak_mpx = self.encoder.process(
            &self.up_l[..m],
            &self.up_r[..m],
            &mut self.mpx[..m],
            &snap,
            self.rds.as_mut(),
        );

        if self.target.uses_audio_port() {
            out[..m].copy_from_slice(&self.mpx[..m]);
            out[m..].fill(0.0);
        } else {
            out.fill(0.0);
        }
        if let Some(network) = &self.network {
            network.publish(&self.mpx[..m]);
        }

        self.control.publish_peaks(peak_mpx, peak_l, peak_r);
        Ok(m)
    }

    fn validate(&self, left: &[f32], right: &[f32], out: &[f32]) -> Result<usize> {
        let n = left.len();
        if n == 0 {
            return Err(InputError::Empty.into());
        }
        if right.len() != n {
            return Err(InputError::LengthMismatch {
                left: n,
                right: right.len(),
            }
            .into());
        }
        if n > self.max_period {
            return Err(InputError::TooLong {
                len: n,
                max: self.max_period,
            }
            .into());
        }
        // Matching rates on the audio port: one composite sample per input
        if self.target.uses_audio_port() && out.len() < n {
            return Err(InputError::OutputTooShort {
                len: out.len(),
                needed: n,
            }
            .into());
        }
        // One NaN would latch into the filter state for good
        for (channel, samples) in [("left", left), ("right", right)] {
            if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
                return Err(InputError::NonFinite { channel, index }.into());
            }
        }
        Ok(n)
    }

    fn reset(&mut self) {
        let snap = self.control.snapshot();
        self.audio_filter.reset(snap.use_audio_lpf);
        self.resampler_l.reset();
        self.resampler_r.reset();
        self.encoder.reset(&snap);
        self.rds.reset();
        self.control.publish_peaks(0.0, 0.0, 0.0);
        tracing::debug!("pipeline state discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::rds::SilentRds;

    fn pipeline(rate: u32, network: bool) -> Pipeline {
        let config = PipelineConfig::new(rate, 256).with_network(network);
        Pipeline::new(config, Arc::new(ControlBlock::new()), Box::new(SilentRds)).unwrap()
    }

    #[test]
    fn starts_inactive_and_silent() {
        let mut p = pipeline(192_000, false);
        let input = vec![0.5; 64];
        let mut out = vec![1.0; 64];
        assert_eq!(p.process(&input, &input, &mut out).unwrap(), 0);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn start_twice_is_rejected() {
        let p = pipeline(192_000, false);
        p.start().unwrap();
        assert_eq!(p.start().unwrap_err().code(), ErrorCode::AlreadyRunning);
        p.shutdown_handle().shutdown();
        assert!(!p.is_active());
        p.start().unwrap();
    }

    #[test]
    fn publishes_negotiation() {
        let p = pipeline(48_000, true);
        assert_eq!(p.control().sample_rate(), 48_000);
        assert_eq!(p.control().max_samples(), 256);
        assert_eq!(p.processing_rate(), 192_000);
        assert_eq!(p.max_output_len(), 4 * 256 + 1);
    }

    #[test]
    fn rejects_malformed_periods() {
        let mut p = pipeline(192_000, false);
        p.start().unwrap();
        let a = vec![0.0; 64];
        let b = vec![0.0; 63];
        let long = vec![0.0; 300];
        let mut out = vec![0.0; 64];
        let mut short = vec![0.0; 10];

        let code = |r: Result<usize>| r.unwrap_err().code();
        assert_eq!(code(p.process(&[], &[], &mut out)), ErrorCode::InvalidInput);
        assert_eq!(code(p.process(&a, &b, &mut out)), ErrorCode::InvalidInput);
        assert_eq!(code(p.process(&long, &long, &mut out)), ErrorCode::InvalidInput);
        assert_eq!(code(p.process(&a, &a, &mut short)), ErrorCode::InvalidInput);
        let mut bad = a.clone();
        bad[3] = f32::INFINITY;
        assert_eq!(code(p.process(&a, &bad, &mut out)), ErrorCode::InvalidInput);
        assert!(p.is_active());
        assert_eq!(p.process(&a, &a, &mut out).unwrap(), 64);
    }

    #[test]
    fn latency_accounts_for_every_stage() {
        let fast = pipeline(192_000, false);
        let slow = pipeline(48_000, true);
        // Audio filter plus encoder FIR at matching rates
        assert!(fast.added_latency() > 128.0);
        assert!(slow.added_latency() > slow.audio_filter.group_delay() as f64 + 32.0);
    }
}
