//! The injector thread.
//!
//! Sends every plugin's static frames first, paced by a fixed delay, then drains
//! the live queue that plugins fill while reacting to captured traffic.

use std::time::Duration;

use sixscout_plugins::{InjectorId, InjectorMessage, LiveInjector, PluginSlot};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, trace};

use crate::cancel::CancellationToken;
use crate::capture::SharedCapture;

/// Counters of one injector run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectorReport {
    pub static_total: usize,
    pub static_sent: usize,
    pub live_sent: usize,
    pub send_failures: usize,
}

/// Wakes an injector blocked on its live queue.
#[derive(Clone)]
pub struct InjectorWaker(UnboundedSender<InjectorMessage>);

impl InjectorWaker {
    pub fn wake(&self) {
        // the injector may already be gone
        let _ = self.0.send(InjectorMessage::Shutdown);
    }
}

pub struct Injector {
    id: InjectorId,
    interface: String,
    capture: SharedCapture,
    plugins: Vec<PluginSlot>,
    cancel: CancellationToken,
    delay: Duration,
    queue_tx: UnboundedSender<InjectorMessage>,
    queue_rx: UnboundedReceiver<InjectorMessage>,
    report: InjectorReport,
}

impl Injector {
    pub fn new(
        id: InjectorId,
        interface: &str,
        capture: SharedCapture,
        plugins: Vec<PluginSlot>,
        cancel: CancellationToken,
        delay: Duration,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            id,
            interface: interface.to_string(),
            capture,
            plugins,
            cancel,
            delay,
            queue_tx,
            queue_rx,
            report: InjectorReport::default(),
        }
    }

    pub fn waker(&self) -> InjectorWaker {
        InjectorWaker(self.queue_tx.clone())
    }

    pub fn run(mut self) -> InjectorReport {
        debug!(interface = %self.interface, "Starting injector thread...");
        let live = LiveInjector::new(self.id, self.queue_tx.clone());
        for slot in &self.plugins {
            slot.with_injector("register_live_injector", |plugin| {
                plugin.register_live_injector(live.clone());
                Ok(())
            });
        }

        let packets = self.collect_static_packets();
        self.send_static(packets);
        if !self.cancel.is_cancelled() {
            self.drain_live_queue();
        }

        for slot in &self.plugins {
            slot.with_injector("unregister_live_injector", |plugin| {
                plugin.unregister_live_injector(self.id);
                Ok(())
            });
        }
        debug!(interface = %self.interface, "Exiting injector thread.");
        self.report
    }

    fn collect_static_packets(&self) -> Vec<Vec<u8>> {
        self.capture.hold(|| {
            self.plugins
                .iter()
                .filter_map(|slot| slot.with_injector("injection_packets", |plugin| plugin.injection_packets()))
                .flatten()
                .collect()
        })
    }

    fn send_static(&mut self, packets: Vec<Vec<u8>>) {
        self.report.static_total = packets.len();
        for packet in &packets {
            if self.cancel.wait_timeout(self.delay) {
                break;
            }
            if self.transmit(packet) {
                self.report.static_sent += 1;
            }
        }
        debug!(
            interface = %self.interface,
            "Injected [{}/{}] plugin packets.", self.report.static_sent, self.report.static_total
        );
    }

    fn drain_live_queue(&mut self) {
        loop {
            if self.cancel.wait_timeout(self.delay) {
                break;
            }
            match self.queue_rx.blocking_recv() {
                Some(InjectorMessage::Packet(packet)) => {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    if self.transmit(&packet) {
                        self.report.live_sent += 1;
                    }
                }
                Some(InjectorMessage::Shutdown) | None => break,
            }
        }
        debug!(interface = %self.interface, "Injected {} live packets", self.report.live_sent);
    }

    fn transmit(&mut self, packet: &[u8]) -> bool {
        match self.capture.send(packet) {
            Ok(()) => {
                trace!(interface = %self.interface, len = packet.len(), "Injected packet");
                true
            }
            Err(e) => {
                self.report.send_failures += 1;
                error!(interface = %self.interface, "Failed to inject packet: {e}");
                false
            }
        }
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
