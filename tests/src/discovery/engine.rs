use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use pnet::datalink::MacAddr;
use sixscout_common::network::mac::VendorRepository;
use sixscout_core::CancellationToken;
use sixscout_core::SharedCapture;
use sixscout_core::injector::Injector;
use sixscout_core::listener::Listener;
use sixscout_plugins::{InjectorPlugin, Plugin, PluginSet};
use sixscout_common::network::interface::InterfaceContext;

use crate::fakes::{Event, FakeCapture, Probe};
use crate::util::{self, ROUTER_MAC};

pub struct NoVendor;

impl VendorRepository for NoVendor {
    fn get_vendor(&self, _mac: MacAddr) -> Option<String> {
        None
    }
}

/// Supplies `count` one-byte static frames.
struct Burst {
    count: u8,
}

impl Plugin for Burst {
    fn name(&self) -> &str {
        "Burst"
    }
    fn initialize(&mut self, _iface: &InterfaceContext) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_injector(&mut self) -> Option<&mut dyn InjectorPlugin> {
        Some(self)
    }
}

impl InjectorPlugin for Burst {
    fn injection_packets(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
        Ok((0..self.count).map(|i| vec![i]).collect())
    }
}

#[test]
fn concurrent_reads_and_writes_never_overlap() {
    let probe = Probe::default();
    let capture = SharedCapture::new(Box::new(
        FakeCapture::new(Vec::new(), probe.clone()).with_dwell(Duration::from_micros(50)),
    ));

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let capture = capture.clone();
            thread::spawn(move || {
                for n in 0..200u8 {
                    if i % 2 == 0 {
                        capture.read().unwrap();
                    } else {
                        capture.send(&[n]).unwrap();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(probe.events().len(), 800);
    assert_eq!(probe.sent().len(), 400);
}

#[test]
fn listener_and_injector_share_one_handle_safely() {
    let probe = Probe::default();
    let inbound: Vec<Vec<u8>> = (0..50)
        .map(|i| util::neighbor_advertisement(ROUTER_MAC, util::ip6(&format!("fe80::{:x}", i + 1)), 255))
        .collect();
    let capture = SharedCapture::new(Box::new(
        FakeCapture::new(inbound, probe.clone()).with_dwell(Duration::from_micros(20)),
    ));

    let plugins = PluginSet::new(vec![Box::new(Burst { count: 50 })]);
    let listener_cancel = CancellationToken::new();
    let injector_cancel = CancellationToken::new();

    let listener = Listener::new(
        util::lan_context(),
        capture.clone(),
        plugins.listeners(),
        listener_cancel.clone(),
        Duration::from_millis(1),
        Arc::new(NoVendor),
    );
    let injector = Injector::new(
        1,
        "eth0",
        capture.clone(),
        plugins.injectors(),
        injector_cancel.clone(),
        Duration::from_micros(100),
    );
    let waker = injector.waker();

    let listener = thread::spawn(move || listener.run());
    let injector = thread::spawn(move || injector.run());

    for _ in 0..500 {
        let reads = probe.events().iter().filter(|e| **e == Event::Read).count();
        if probe.sent().len() == 50 && reads > 50 {
            break;
        }
        thread::sleep(Duration::from_millis(2));
    }

    injector_cancel.cancel();
    waker.wake();
    listener_cancel.cancel();
    capture.unblocker().unblock();

    let injected = injector.join().unwrap();
    let heard = listener.join().unwrap();

    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(injected.static_sent, 50);
    assert_eq!(heard.frames, 50);
    // one MAC announcing fifty link-local addresses
    assert_eq!(heard.nodes.len(), 1);
    assert_eq!(heard.nodes.snapshot()[0].addresses().count(), 50);
}

#[test]
fn cancelled_injector_leaves_static_backlog_unsent() {
    let probe = Probe::default();
    let capture = SharedCapture::new(Box::new(FakeCapture::new(Vec::new(), probe.clone())));
    let plugins = PluginSet::new(vec![Box::new(Burst { count: 100 })]);
    let cancel = CancellationToken::new();

    let injector = Injector::new(7, "eth0", capture, plugins.injectors(), cancel.clone(), Duration::from_millis(5));
    let handle = thread::spawn(move || injector.run());
    thread::sleep(Duration::from_millis(30));
    cancel.cancel();
    let report = handle.join().unwrap();

    assert_eq!(report.static_total, 100);
    assert!(report.static_sent < 100);
    assert_eq!(probe.sent().len(), report.static_sent);
    assert!(!probe.events().contains(&Event::Stats));
}
