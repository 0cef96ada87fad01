//! Network output of the composite.
//!
//! The pipeline publishes composite buffers into a non-blocking handoff. A
//! sender thread drains the consumer end into a [`NetworkSink`]; [`UdpSink`]
//! ships each buffer as raw little-endian `f32` datagrams.

use crate::{Error, Result};
use crossbeam_channel::RecvTimeoutError;
use fmpx_engine::{FmmodError, HandoffConsumer};
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Samples per datagram. 1440 payload bytes fit a 1500-byte Ethernet MTU.
pub const MAX_DATAGRAM_SAMPLES: usize = 360;

/// How long the sender waits for a buffer before checking for stop.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Receiver of composite buffers at the processing rate.
pub trait NetworkSink: Send {
    /// Deliver one buffer. Socket failures map to [`FmmodError::Socket`].
    fn send(&mut self, composite: &[f32]) -> std::result::Result<(), FmmodError>;
}

/// Encode samples as little-endian `f32` into `out`, replacing its contents.
pub fn encode_datagram(samples: &[f32], out: &mut Vec<u8>) {
    out.clear();
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
}

/// UDP composite sink.
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
    scratch: Vec<u8>,
}

impl UdpSink {
    /// Bind an ephemeral local port and connect it to `target`.
    pub fn connect(target: SocketAddr) -> std::result::Result<Self, FmmodError> {
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        let local = socket.local_addr()?;
        tracing::info!(%target, %local, "udp composite sink connected");
        Ok(Self {
            socket,
            target,
            scratch: Vec::with_capacity(MAX_DATAGRAM_SAMPLES * 4),
        })
    }

    /// Destination address.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> std::result::Result<SocketAddr, FmmodError> {
        Ok(self.socket.local_addr()?)
    }
}

impl NetworkSink for UdpSink {
    fn send(&mut self, composite: &[f32]) -> std::result::Result<(), FmmodError> {
        for chunk in composite.chunks(MAX_DATAGRAM_SAMPLES) {
            encode_datagram(chunk, &mut self.scratch);
            self.socket.send(&self.scratch)?;
        }
        Ok(())
    }
}

/// What a sender thread did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Buffers delivered to the sink.
    pub buffers: u64,
    /// Samples delivered to the sink.
    pub samples: u64,
    /// Buffers the sink rejected.
    pub send_errors: u64,
    /// Buffers the pipeline overwrote before the sender read them.
    pub overruns: u64,
}

/// Handle to a running sender thread.
pub struct NetworkWorker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<SenderStats>,
}

impl NetworkWorker {
    /// Ask the thread to stop and wait for it.
    pub fn stop(self) -> Result<SenderStats> {
        self.stop.store(true, Ordering::Release);
        self.join()
    }

    /// Wait until the producer is gone and every buffer has been sent.
    pub fn join(self) -> Result<SenderStats> {
        let stats = self
            .handle
            .join()
            .map_err(|_| Error::Stream("network sender panicked".into()))?;
        tracing::info!(
            buffers = stats.buffers,
            samples = stats.samples,
            send_errors = stats.send_errors,
            overruns = stats.overruns,
            "network sender stopped"
        );
        Ok(stats)
    }
}

/// Spawn a thread that forwards every buffer from `consumer` to `sink`.
pub fn spawn_sender<S>(consumer: HandoffConsumer, mut sink: S) -> Result<NetworkWorker>
where
    S: NetworkSink + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);

    let handle = thread::Builder::new()
        .name("fmpx-net".into())
        .spawn(move || {
            let mut stats = SenderStats::default();
            while !flag.load(Ordering::Acquire) {
                match consumer.recv_timeout(POLL_INTERVAL) {
                    Ok(buf) => match sink.send(&buf) {
                        Ok(()) => {
                            stats.buffers += 1;
                            stats.samples += buf.len() as u64;
                        }
                        Err(e) => {
                            stats.send_errors += 1;
                            if stats.send_errors.is_power_of_two() {
                                tracing::warn!(
                                    error = %e,
                                    code = e.code().as_i32(),
                                    count = stats.send_errors,
                                    "network send failed"
                                );
                            }
                        }
                    },
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            stats.overruns = consumer.overruns();
            stats
        })?;

    Ok(NetworkWorker { stop, handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datagram_is_little_endian_f32() {
        let mut out = vec![0xff; 3];
        encode_datagram(&[1.0, -0.5], &mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(&out[..4], &1.0f32.to_le_bytes());
        assert_eq!(&out[4..], &(-0.5f32).to_le_bytes());
    }

    #[test]
    fn udp_sink_splits_large_buffers() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut sink = UdpSink::connect(receiver.local_addr().unwrap()).unwrap();

        let composite: Vec<f32> = (0..MAX_DATAGRAM_SAMPLES + 10).map(|i| i as f32).collect();
        sink.send(&composite).unwrap();

        let mut buf = [0u8; 2048];
        let first = receiver.recv(&mut buf).unwrap();
        assert_eq!(first, MAX_DATAGRAM_SAMPLES * 4);
        let second = receiver.recv(&mut buf).unwrap();
        assert_eq!(second, 40);
        assert_eq!(&buf[..4], &(MAX_DATAGRAM_SAMPLES as f32).to_le_bytes());
    }
}
