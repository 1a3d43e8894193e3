//! Capture handle abstraction and the lock that serializes access to it.
//!
//! A capture handle is not safe for concurrent use. The listener and injector
//! share one through [`SharedCapture`], which holds the lock for a single read
//! or write and releases it fairly to the longest waiter.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use pcap::{Active, Capture};
use sixscout_common::config::Config;
use sixscout_common::error::DiscoveryError;
use tracing::debug;

/// Counters reported by the capture library once a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub received: u32,
    pub dropped: u32,
    pub if_dropped: u32,
}

impl fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {}, dropped {}, interface dropped {}",
            self.received, self.dropped, self.if_dropped
        )
    }
}

/// Forces a pending read on a capture handle to return, without taking the lock.
pub struct Unblocker(Option<Box<dyn Fn() + Send + Sync>>);

impl Unblocker {
    pub fn new(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// For backends whose reads never block.
    pub fn noop() -> Self {
        Self(None)
    }

    pub fn unblock(&self) {
        if let Some(f) = &self.0 {
            f();
        }
    }
}

pub trait CaptureBackend: Send {
    /// One frame if one is ready. `Ok(None)` when the read timed out or was interrupted.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, DiscoveryError>;

    fn send(&mut self, frame: &[u8]) -> Result<(), DiscoveryError>;

    fn stats(&mut self) -> Result<CaptureStats, DiscoveryError>;

    fn unblocker(&mut self) -> Unblocker;
}

/// Live libpcap capture in promiscuous, immediate, non-blocking mode.
pub struct PcapBackend {
    interface: String,
    capture: Capture<Active>,
}

impl PcapBackend {
    pub fn open(interface: &str, config: &Config) -> Result<Self, DiscoveryError> {
        let open_err = |e: pcap::Error| DiscoveryError::CaptureOpen {
            interface: interface.to_string(),
            reason: e.to_string(),
        };

        let timeout_ms = i32::try_from(config.read_timeout.as_millis()).unwrap_or(i32::MAX);
        let capture = Capture::from_device(interface)
            .map_err(open_err)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(timeout_ms)
            .immediate_mode(true)
            .open()
            .map_err(open_err)?
            .setnonblock()
            .map_err(open_err)?;

        debug!(interface, snaplen = config.snaplen, timeout_ms, "Capture handle opened");
        Ok(Self {
            interface: interface.to_string(),
            capture,
        })
    }
}

impl CaptureBackend for PcapBackend {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, DiscoveryError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(Some(packet.data.to_vec())),
            Err(pcap::Error::TimeoutExpired) | Err(pcap::Error::NoMorePackets) => Ok(None),
            Err(e) => Err(DiscoveryError::CaptureRead(format!("{}: {e}", self.interface))),
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), DiscoveryError> {
        self.capture
            .sendpacket(frame)
            .map_err(|e| DiscoveryError::Send(format!("{}: {e}", self.interface)))
    }

    fn stats(&mut self) -> Result<CaptureStats, DiscoveryError> {
        let stat = self
            .capture
            .stats()
            .map_err(|e| DiscoveryError::CaptureRead(format!("{}: {e}", self.interface)))?;
        Ok(CaptureStats {
            received: stat.received,
            dropped: stat.dropped,
            if_dropped: stat.if_dropped,
        })
    }

    fn unblocker(&mut self) -> Unblocker {
        let handle = self.capture.breakloop_handle();
        Unblocker::new(move || handle.breakloop())
    }
}

/// One capture handle shared by the listener and the injector.
#[derive(Clone)]
pub struct SharedCapture {
    inner: Arc<Mutex<Box<dyn CaptureBackend>>>,
}

impl SharedCapture {
    pub fn new(backend: Box<dyn CaptureBackend>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(backend)),
        }
    }

    /// Runs `f` with the handle locked, then hands the lock to the longest waiter.
    fn with_handle<R>(&self, f: impl FnOnce(&mut dyn CaptureBackend) -> R) -> R {
        let mut guard = self.inner.lock();
        let result = f(&mut **guard);
        MutexGuard::unlock_fair(guard);
        result
    }

    /// Runs `f` while holding the handle lock, without touching the handle.
    pub fn hold<R>(&self, f: impl FnOnce() -> R) -> R {
        self.with_handle(|_| f())
    }

    pub fn read(&self) -> Result<Option<Vec<u8>>, DiscoveryError> {
        self.with_handle(|backend| backend.next_frame())
    }

    pub fn send(&self, frame: &[u8]) -> Result<(), DiscoveryError> {
        self.with_handle(|backend| backend.send(frame))
    }

    pub fn stats(&self) -> Result<CaptureStats, DiscoveryError> {
        self.with_handle(|backend| backend.stats())
    }

    pub fn unblocker(&self) -> Unblocker {
        self.with_handle(|backend| backend.unblocker())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Scripted {
        inbound: VecDeque<Vec<u8>>,
        sent: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_sends: bool,
    }

    impl CaptureBackend for Scripted {
        fn next_frame(&mut self) -> Result<Option<Vec<u8>>, DiscoveryError> {
            Ok(self.inbound.pop_front())
        }

        fn send(&mut self, frame: &[u8]) -> Result<(), DiscoveryError> {
            if self.fail_sends {
                return Err(DiscoveryError::Send("link down".into()));
            }
            self.sent.lock().push(frame.to_vec());
            Ok(())
        }

        fn stats(&mut self) -> Result<CaptureStats, DiscoveryError> {
            Ok(CaptureStats {
                received: 2,
                ..CaptureStats::default()
            })
        }

        fn unblocker(&mut self) -> Unblocker {
            Unblocker::noop()
        }
    }

    #[test]
    fn shared_capture_should_pass_calls_through() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let backend = Scripted {
            inbound: VecDeque::from(vec![vec![1u8]]),
            sent: Arc::clone(&sent),
            fail_sends: false,
        };
        let shared = SharedCapture::new(Box::new(backend));
        let clone = shared.clone();

        assert_eq!(clone.read().unwrap(), Some(vec![1u8]));
        assert_eq!(shared.read().unwrap(), None);
        shared.send(&[7, 7]).unwrap();
        assert_eq!(sent.lock().as_slice(), &[vec![7u8, 7]]);
        assert_eq!(shared.stats().unwrap().received, 2);
    }

    #[test]
    fn send_failure_should_surface_as_error() {
        let shared = SharedCapture::new(Box::new(Scripted {
            fail_sends: true,
            ..Scripted::default()
        }));
        assert!(matches!(shared.send(&[1]), Err(DiscoveryError::Send(_))));
    }

    #[test]
    fn unblocker_should_invoke_callback() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let unblocker = Unblocker::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        unblocker.unblock();
        Unblocker::noop().unblock();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stats_should_render_counters() {
        let stats = CaptureStats {
            received: 10,
            dropped: 1,
            if_dropped: 0,
        };
        assert_eq!(stats.to_string(), "received 10, dropped 1, interface dropped 0");
    }
}
