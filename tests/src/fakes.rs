//! In-memory stand-ins for the capture library and the host.

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pnet::datalink::NetworkInterface;
use sixscout_common::config::Config;
use sixscout_common::error::DiscoveryError;
use sixscout_core::{CaptureBackend, CaptureStats, SystemRepository, Unblocker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Read,
    Send(Vec<u8>),
    Stats,
    Unblock,
    Closed,
}

/// Everything observed by one or more [`FakeCapture`]s.
#[derive(Clone, Default)]
pub struct Probe {
    pub events: Arc<Mutex<Vec<Event>>>,
    in_call: Arc<AtomicBool>,
    pub overlaps: Arc<AtomicUsize>,
}

impl Probe {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Send(frame) => Some(frame),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, wanted: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == wanted)
    }

    /// Marks the start of a handle call. Counts an overlap if another call is in flight.
    fn enter(&self) {
        if self.in_call.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn exit(&self) {
        self.in_call.store(false, Ordering::SeqCst);
    }
}

/// A capture handle that must never be used from two threads at once.
pub struct FakeCapture {
    inbound: VecDeque<Vec<u8>>,
    probe: Probe,
    /// Time spent inside each call, to widen any overlap window.
    dwell: Duration,
    /// Empty reads served before the first inbound frame.
    warmup: usize,
}

impl FakeCapture {
    pub fn new(inbound: Vec<Vec<u8>>, probe: Probe) -> Self {
        Self {
            inbound: inbound.into(),
            probe,
            dwell: Duration::ZERO,
            warmup: 0,
        }
    }

    pub fn with_warmup(mut self, reads: usize) -> Self {
        self.warmup = reads;
        self
    }

    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    fn critical<R>(&self, event: Event, f: impl FnOnce() -> R) -> R {
        self.probe.enter();
        self.probe.events.lock().push(event);
        if !self.dwell.is_zero() {
            thread::sleep(self.dwell);
        }
        let result = f();
        self.probe.exit();
        result
    }
}

impl CaptureBackend for FakeCapture {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, DiscoveryError> {
        let next = if self.warmup > 0 {
            self.warmup -= 1;
            None
        } else {
            self.inbound.pop_front()
        };
        self.critical(Event::Read, || Ok(next))
    }

    fn send(&mut self, frame: &[u8]) -> Result<(), DiscoveryError> {
        self.critical(Event::Send(frame.to_vec()), || Ok(()))
    }

    fn stats(&mut self) -> Result<CaptureStats, DiscoveryError> {
        let received = self.probe.events.lock().iter().filter(|e| **e == Event::Read).count();
        self.critical(Event::Stats, || {
            Ok(CaptureStats {
                received: u32::try_from(received).unwrap_or(u32::MAX),
                dropped: 0,
                if_dropped: 0,
            })
        })
    }

    fn unblocker(&mut self) -> Unblocker {
        let events = Arc::clone(&self.probe.events);
        Unblocker::new(move || events.lock().push(Event::Unblock))
    }
}

impl Drop for FakeCapture {
    fn drop(&mut self) {
        self.probe.events.lock().push(Event::Closed);
    }
}

/// A host with fixed interfaces whose captures replay `inbound`.
pub struct FakeHost {
    pub interfaces: Vec<NetworkInterface>,
    pub gateway: Option<Ipv4Addr>,
    pub inbound: Vec<Vec<u8>>,
    /// Empty reads before `inbound` is replayed, so the injector is up first.
    pub warmup: usize,
    pub probe: Probe,
}

impl FakeHost {
    pub fn new(interfaces: Vec<NetworkInterface>, inbound: Vec<Vec<u8>>) -> Self {
        Self {
            interfaces,
            gateway: Some(Ipv4Addr::new(192, 168, 1, 1)),
            inbound,
            warmup: 0,
            probe: Probe::default(),
        }
    }
}

impl SystemRepository for FakeHost {
    fn network_interfaces(&self) -> Vec<NetworkInterface> {
        self.interfaces.clone()
    }

    fn default_gateway(&self) -> Option<Ipv4Addr> {
        self.gateway
    }

    fn can_reach_internet(&self, _iface: &NetworkInterface) -> bool {
        true
    }

    fn open_capture(&self, _iface: &NetworkInterface, _config: &Config) -> Result<Box<dyn CaptureBackend>, DiscoveryError> {
        Ok(Box::new(
            FakeCapture::new(self.inbound.clone(), self.probe.clone()).with_warmup(self.warmup),
        ))
    }
}
