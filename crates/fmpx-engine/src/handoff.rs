//! Composite buffer handoff from the audio thread to a network consumer.
//!
//! A fixed pool of buffers circulates between two bounded channels: `free`
//! holds empty buffers, `filled` holds published ones waiting for the
//! consumer. Publishing never blocks and never allocates. When the consumer
//! falls behind and no free buffer is left, the producer takes back the
//! oldest filled buffer and overwrites it, so the consumer only ever sees a
//! bounded amount of stale audio. Each reclaimed buffer counts as an overrun.

use crate::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Create a handoff with `slots` buffers of `capacity` samples each.
///
/// Buffer allocation failures surface as
/// [`FmmodError::OutOfMemory`](crate::FmmodError::OutOfMemory).
pub fn handoff_channel(
    slots: usize,
    capacity: usize,
) -> Result<(HandoffProducer, HandoffConsumer)> {
    let slots = slots.max(1);
    let (free_tx, free_rx) = bounded(slots);
    let (filled_tx, filled_rx) = bounded(slots);
    let overruns = Arc::new(AtomicU64::new(0));

    for _ in 0..slots {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)?;
        // Both ends are alive and the channel holds exactly `slots`
        let _ = free_tx.try_send(buf);
    }

    let producer = HandoffProducer {
        free: free_rx,
        filled: filled_tx,
        reclaim: filled_rx.clone(),
        capacity,
        overruns: Arc::clone(&overruns),
    };
    let consumer = HandoffConsumer {
        free: free_tx,
        filled: filled_rx,
        overruns,
    };
    Ok((producer, consumer))
}

/// Audio-thread end of the handoff.
pub struct HandoffProducer {
    free: Receiver<Vec<f32>>,
    filled: Sender<Vec<f32>>,
    reclaim: Receiver<Vec<f32>>,
    capacity: usize,
    overruns: Arc<AtomicU64>,
}

impl HandoffProducer {
    /// Publish a copy of `samples`.
    ///
    /// Samples beyond the buffer capacity are dropped. Returns false when
    /// nothing could be published: the consumer is gone, or it holds every
    /// buffer at once.
    pub fn publish(&self, samples: &[f32]) -> bool {
        let mut buf = match self.free.try_recv() {
            Ok(buf) => buf,
            Err(TryRecvError::Disconnected) => return false,
            Err(TryRecvError::Empty) => match self.reclaim.try_recv() {
                Ok(buf) => {
                    self.overruns.fetch_add(1, Ordering::Relaxed);
                    buf
                }
                Err(_) => return false,
            },
        };

        let n = samples.len().min(self.capacity);
        buf.clear();
        buf.extend_from_slice(&samples[..n]);
        // The pool never exceeds the channel bound and `reclaim` keeps it open
        self.filled.try_send(buf).is_ok()
    }

    /// Buffers overwritten before the consumer read them.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Samples each buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Network-thread end of the handoff.
pub struct HandoffConsumer {
    free: Sender<Vec<f32>>,
    filled: Receiver<Vec<f32>>,
    overruns: Arc<AtomicU64>,
}

impl HandoffConsumer {
    /// Wait up to `timeout` for the next published buffer.
    ///
    /// Returns [`RecvTimeoutError::Disconnected`] once the producer is
    /// dropped and every published buffer has been read.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<HandoffBuffer<'_>, RecvTimeoutError> {
        self.filled.recv_timeout(timeout).map(|buf| self.wrap(buf))
    }

    /// Next published buffer, if one is waiting.
    pub fn try_recv(&self) -> Option<HandoffBuffer<'_>> {
        self.filled.try_recv().ok().map(|buf| self.wrap(buf))
    }

    /// Buffers overwritten before they were read.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    fn wrap(&self, buf: Vec<f32>) -> HandoffBuffer<'_> {
        HandoffBuffer {
            buf: Some(buf),
            free: &self.free,
        }
    }
}

/// A published composite buffer. Returned to the pool on drop.
pub struct HandoffBuffer<'a> {
    buf: Option<Vec<f32>>,
    free: &'a Sender<Vec<f32>>,
}

impl Deref for HandoffBuffer<'_> {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl Drop for HandoffBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            // Fails only once the producer is gone; the buffer is then freed
            let _ = self.free.try_send(buf);
        }
    }
}
