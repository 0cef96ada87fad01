//! Real-time bridge between device callbacks and the pipeline.
//!
//! Capture and playback arrive on two separate device callbacks. The capture
//! callback copies interleaved input into a preallocated handoff; the render
//! callback collects it, runs the [`Pipeline`] one period at a time and
//! spreads the composite over every output channel. Neither side allocates
//! or blocks once the bridge is built.

use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::{Error, Result};
use fmpx_engine::{
    ControlBlock, HandoffConsumer, HandoffProducer, MIN_MPX_RATE, Pipeline, ShutdownHandle,
    handoff_channel,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Capture buffers in flight between the two callbacks.
const CAPTURE_SLOTS: usize = 4;

/// Device settings requested by the station.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Requested device rate. `None` asks for [`MIN_MPX_RATE`] and accepts
    /// whatever the device offers instead.
    pub sample_rate: Option<u32>,
    /// Buffer size in frames.
    pub buffer_size: u32,
    /// Input device name (uses default if `None`).
    pub input_device: Option<String>,
    /// Output device name (uses default if `None`).
    pub output_device: Option<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            sample_rate: None,
            buffer_size: 1024,
            input_device: None,
            output_device: None,
        }
    }
}

/// Rate, period and channel layout agreed with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    /// Largest period the pipeline is sized for, in frames.
    pub max_period: usize,
    /// Interleaved input channels.
    pub input_channels: u16,
    /// Interleaved output channels.
    pub output_channels: u16,
}

impl StreamSettings {
    fn config(&self, sample_rate: u32, device_name: Option<&String>) -> BackendStreamConfig {
        BackendStreamConfig {
            sample_rate,
            buffer_size: self.buffer_size,
            channels: 2,
            device_name: device_name.cloned(),
        }
    }

    /// Ask `backend` which rate and layout it will actually run.
    pub fn negotiate(&self, backend: &dyn AudioBackend) -> Result<Negotiated> {
        if self.buffer_size == 0 {
            return Err(Error::UnsupportedFormat("zero buffer size".into()));
        }
        let requested = self.sample_rate.unwrap_or(MIN_MPX_RATE);
        let sample_rate =
            backend.actual_sample_rate(&self.config(requested, self.output_device.as_ref()))?;
        if sample_rate == 0 {
            return Err(Error::UnsupportedFormat("device reports a zero sample rate".into()));
        }
        let output_channels =
            backend.output_channels(&self.config(sample_rate, self.output_device.as_ref()))?;
        let input_channels =
            backend.input_channels(&self.config(sample_rate, self.input_device.as_ref()))?;
        if output_channels == 0 || input_channels == 0 {
            return Err(Error::UnsupportedFormat("device has no channels".into()));
        }

        let negotiated = Negotiated {
            sample_rate,
            max_period: self.buffer_size as usize,
            input_channels,
            output_channels,
        };
        tracing::info!(
            backend = backend.name(),
            requested,
            sample_rate,
            max_period = negotiated.max_period,
            input_channels,
            output_channels,
            "device negotiated"
        );
        Ok(negotiated)
    }
}

/// Counters shared by both sides of the bridge.
#[derive(Debug, Default)]
pub struct StreamStats {
    underruns: AtomicU64,
    oversized: AtomicU64,
    dropped_input: AtomicU64,
    process_errors: AtomicU64,
    backend_errors: AtomicU64,
}

impl StreamStats {
    /// Render callbacks that found too little captured input and played
    /// silence.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Render callbacks asking for more frames than the capture queue can
    /// ever hold. They play silence.
    pub fn oversized(&self) -> u64 {
        self.oversized.load(Ordering::Relaxed)
    }

    /// Captured samples discarded because the render side fell behind.
    pub fn dropped_input(&self) -> u64 {
        self.dropped_input.load(Ordering::Relaxed)
    }

    /// Periods the pipeline rejected.
    pub fn process_errors(&self) -> u64 {
        self.process_errors.load(Ordering::Relaxed)
    }

    /// Errors reported by the device backend.
    pub fn backend_errors(&self) -> u64 {
        self.backend_errors.load(Ordering::Relaxed)
    }

    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

/// Capture callback end of the bridge.
pub struct CaptureSide {
    producer: HandoffProducer,
    stats: Arc<StreamStats>,
}

impl CaptureSide {
    /// Hand one interleaved capture buffer to the render side.
    pub fn push(&self, interleaved: &[f32]) {
        let kept = interleaved.len().min(self.producer.capacity());
        if !self.producer.publish(interleaved) {
            StreamStats::bump(&self.stats.dropped_input, interleaved.len() as u64);
        } else if kept < interleaved.len() {
            StreamStats::bump(&self.stats.dropped_input, (interleaved.len() - kept) as u64);
        }
    }
}

/// Render callback end of the bridge. Owns the pipeline.
pub struct RenderSide {
    pipeline: Pipeline,
    capture: HandoffConsumer,
    stats: Arc<StreamStats>,
    input_channels: usize,
    output_channels: usize,
    pending: Vec<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
    composite: Vec<f32>,
    oversize_warned: bool,
}

impl RenderSide {
    /// Shared counters.
    pub fn stats(&self) -> Arc<StreamStats> {
        Arc::clone(&self.stats)
    }

    /// The pipeline driven by this side.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Collect captured input without overflowing the preallocated queue.
    fn collect(&mut self) {
        while let Some(buf) = self.capture.try_recv() {
            let room = self.pending.capacity() - self.pending.len();
            if buf.len() > room {
                let excess = (buf.len() - room).min(self.pending.len());
                self.pending.drain(..excess);
                StreamStats::bump(&self.stats.dropped_input, excess as u64);
            }
            let room = self.pending.capacity() - self.pending.len();
            let take = buf.len().min(room);
            self.pending.extend_from_slice(&buf[buf.len() - take..]);
        }
    }

    /// Fill one interleaved output buffer.
    pub fn render(&mut self, out: &mut [f32]) {
        self.collect();

        let out_ch = self.output_channels;
        let in_ch = self.input_channels;
        let frames = out.len() / out_ch;
        let needed = frames * in_ch;
        if needed > self.pending.capacity() {
            out.fill(0.0);
            StreamStats::bump(&self.stats.oversized, 1);
            if !self.oversize_warned {
                self.oversize_warned = true;
                tracing::warn!(
                    frames,
                    max_frames = self.pending.capacity() / in_ch,
                    "output callback larger than the capture queue, playing silence"
                );
            }
            return;
        }
        if frames == 0 || self.pending.len() < needed {
            out.fill(0.0);
            if frames > 0 {
                StreamStats::bump(&self.stats.underruns, 1);
            }
            return;
        }
        out[frames * out_ch..].fill(0.0);

        let max_period = self.pipeline.max_period();
        let mut start = 0;
        while start < frames {
            let n = max_period.min(frames - start);
            let input = &self.pending[start * in_ch..(start + n) * in_ch];
            for (i, frame) in input.chunks_exact(in_ch).enumerate() {
                self.left[i] = frame[0];
                self.right[i] = if in_ch > 1 { frame[1] } else { frame[0] };
            }

            let dest = &mut out[start * out_ch..(start + n) * out_ch];
            match self.pipeline.process(
                &self.left[..n],
                &self.right[..n],
                &mut self.composite[..n],
            ) {
                Ok(_) => {
                    for (frame, &s) in dest.chunks_exact_mut(out_ch).zip(&self.composite[..n]) {
                        frame.fill(s);
                    }
                }
                Err(_) => {
                    dest.fill(0.0);
                    StreamStats::bump(&self.stats.process_errors, 1);
                }
            }
            start += n;
        }

        self.pending.drain(..needed);
    }
}

/// Split `pipeline` into the two halves driven by device callbacks.
pub fn duplex_bridge(
    pipeline: Pipeline,
    negotiated: &Negotiated,
) -> Result<(CaptureSide, RenderSide)> {
    let input_channels = usize::from(negotiated.input_channels);
    let output_channels = usize::from(negotiated.output_channels);
    if input_channels == 0 || output_channels == 0 {
        return Err(Error::UnsupportedFormat("device has no channels".into()));
    }
    let max_period = pipeline.max_period();
    // Devices may deliver somewhat more than the requested buffer size.
    let capture_capacity = 2 * max_period * input_channels;
    let (producer, consumer) = handoff_channel(CAPTURE_SLOTS, capture_capacity)?;

    let stats = Arc::new(StreamStats::default());
    let render = RenderSide {
        pipeline,
        capture: consumer,
        stats: Arc::clone(&stats),
        input_channels,
        output_channels,
        pending: Vec::with_capacity(CAPTURE_SLOTS * capture_capacity),
        left: vec![0.0; max_period],
        right: vec![0.0; max_period],
        composite: vec![0.0; max_period],
        oversize_warned: false,
    };
    Ok((CaptureSide { producer, stats }, render))
}

/// Running device streams feeding a pipeline.
///
/// Streams stop when the session is dropped.
pub struct RealtimeSession {
    _output: StreamHandle,
    _input: StreamHandle,
    shutdown: ShutdownHandle,
    control: Arc<ControlBlock>,
    stats: Arc<StreamStats>,
}

impl RealtimeSession {
    /// Bridge counters.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// The pipeline's control block.
    pub fn control(&self) -> &Arc<ControlBlock> {
        &self.control
    }

    /// Handle that stops the pipeline from any thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Stop the pipeline and close both streams.
    pub fn stop(self) {
        self.shutdown.shutdown();
        tracing::info!(
            underruns = self.stats.underruns(),
            oversized = self.stats.oversized(),
            dropped_input = self.stats.dropped_input(),
            process_errors = self.stats.process_errors(),
            backend_errors = self.stats.backend_errors(),
            "realtime session stopped"
        );
    }
}

/// Start `pipeline` and open capture and playback streams on `backend`.
pub fn start_realtime(
    backend: &dyn AudioBackend,
    pipeline: Pipeline,
    settings: &StreamSettings,
    negotiated: &Negotiated,
) -> Result<RealtimeSession> {
    let shutdown = pipeline.shutdown_handle();
    let control = Arc::clone(pipeline.control());
    pipeline.start()?;

    let (capture, mut render) = duplex_bridge(pipeline, negotiated)?;
    let stats = render.stats();

    let input_config = BackendStreamConfig {
        sample_rate: negotiated.sample_rate,
        buffer_size: settings.buffer_size,
        channels: negotiated.input_channels,
        device_name: settings.input_device.clone(),
    };
    let output_config = BackendStreamConfig {
        channels: negotiated.output_channels,
        device_name: settings.output_device.clone(),
        ..input_config.clone()
    };

    let input_stats = Arc::clone(&stats);
    let input = backend.build_input_stream(
        &input_config,
        Box::new(move |data| capture.push(data)),
        Box::new(move |err| {
            StreamStats::bump(&input_stats.backend_errors, 1);
            tracing::warn!(error = err, "input stream error");
        }),
    )?;

    let output_stats = Arc::clone(&stats);
    let output = backend.build_output_stream(
        &output_config,
        Box::new(move |out| render.render(out)),
        Box::new(move |err| {
            StreamStats::bump(&output_stats.backend_errors, 1);
            tracing::warn!(error = err, "output stream error");
        }),
    )?;

    Ok(RealtimeSession {
        _output: output,
        _input: input,
        shutdown,
        control,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmpx_engine::{PipelineConfig, SilentRds};

    fn bridge(rate: u32, period: usize, input_channels: u16) -> (CaptureSide, RenderSide) {
        let control = Arc::new(ControlBlock::new());
        let config = PipelineConfig::new(rate, period).with_network(rate < MIN_MPX_RATE);
        let pipeline = Pipeline::new(config, control, Box::new(SilentRds)).unwrap();
        pipeline.start().unwrap();
        let negotiated = Negotiated {
            sample_rate: rate,
            max_period: period,
            input_channels,
            output_channels: 2,
        };
        duplex_bridge(pipeline, &negotiated).unwrap()
    }

    #[test]
    fn silence_until_input_arrives() {
        let (_capture, mut render) = bridge(192_000, 64, 2);
        let mut out = vec![1.0; 128];
        render.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(render.stats().underruns(), 1);
    }

    #[test]
    fn composite_lands_on_every_output_channel() {
        let (capture, mut render) = bridge(192_000, 64, 2);
        capture.push(&[0.0; 128]);
        let mut out = vec![0.0; 128];
        render.render(&mut out);

        // Silent program audio still carries the pilot.
        assert!(out.iter().any(|&s| s != 0.0));
        for frame in out.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert_eq!(render.stats().underruns(), 0);
    }

    #[test]
    fn long_callbacks_are_split_into_periods() {
        let (capture, mut render) = bridge(192_000, 32, 1);
        capture.push(&[0.0; 50]);
        capture.push(&[0.0; 50]);
        let mut out = vec![0.0; 200];
        render.render(&mut out);
        assert_eq!(render.stats().process_errors(), 0);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn oversized_callbacks_are_counted_apart_from_underruns() {
        // Queue holds 4 slots of 2 periods: 512 mono frames
        let (capture, mut render) = bridge(192_000, 64, 1);
        capture.push(&[0.0; 128]);
        let mut huge = vec![1.0; 2 * 600];
        render.render(&mut huge);
        render.render(&mut huge);
        assert!(huge.iter().all(|&s| s == 0.0));
        assert_eq!(render.stats().oversized(), 2);
        assert_eq!(render.stats().underruns(), 0);

        // Normal callbacks still play the queued input
        let mut out = vec![0.0; 2 * 128];
        render.render(&mut out);
        assert!(out.iter().any(|&s| s != 0.0));
        assert_eq!(render.stats().oversized(), 2);
    }

    #[test]
    fn network_only_route_keeps_port_silent() {
        let (capture, mut render) = bridge(48_000, 64, 2);
        capture.push(&[0.25; 128]);
        let mut out = vec![1.0; 128];
        render.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(render.stats().process_errors(), 0);
    }
}
