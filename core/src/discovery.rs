//! # Discovery orchestrator
//!
//! Runs one capture session per candidate interface. The handle is opened
//! first, then Internet reachability is tested and the plugins are initialized.
//! The listener and injector run side by side for a fixed time, then both are
//! torn down and what the listener found is recorded.
//!
//! Teardown order matters. Both threads are cancelled, the pending read is
//! forced to return, and both are joined before the handle is closed.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use pnet::datalink::NetworkInterface;
use sixscout_common::error::DiscoveryError;
use sixscout_common::network::interface::{self, InterfaceContext};
use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::capture::SharedCapture;
use crate::injector::{Injector, InjectorReport};
use crate::listener::{Listener, ListenerReport};
use crate::session::{DiscoverySession, SessionResult};
use crate::system::{SystemRepo, SystemRepository};

impl DiscoverySession {
    /// Scans every candidate interface on this host for `duration_millis` each.
    pub fn run_discovery(&self, duration_millis: u64) -> Result<Vec<SessionResult>, DiscoveryError> {
        self.run_with(&SystemRepo, duration_millis)
    }

    /// Same as [`run_discovery`](Self::run_discovery) against an arbitrary host.
    ///
    /// Fails only when no interface carries an IPv6 address. Every per-interface
    /// problem is logged and the interface is skipped.
    pub fn run_with(
        &self,
        system: &dyn SystemRepository,
        duration_millis: u64,
    ) -> Result<Vec<SessionResult>, DiscoveryError> {
        let all = system.network_interfaces();
        let candidates = interface::ipv6_candidates(all.clone());
        if candidates.is_empty() {
            return Err(DiscoveryError::NoCandidateInterface);
        }

        let prefixes = interface::global_prefixes(&all);
        let gateway = system.default_gateway();
        match gateway {
            Some(gw) => debug!("Default IPv4 gateway of localhost is [{gw}]"),
            None => warn!("Unable to determine IPv4 default gateway"),
        }
        let duration = Duration::from_millis(duration_millis);

        let mut results = Vec::new();
        for iface in &candidates {
            if self.cancel().is_cancelled() {
                info!("Discovery cancelled, skipping remaining interfaces");
                break;
            }
            if !self.config().interfaces.allows(&iface.name, &iface.description) {
                info!("Skipping interface [{}]", iface.name);
                continue;
            }

            let ctx = match InterfaceContext::from_interface(
                iface,
                prefixes.clone(),
                gateway,
                self.config().template_dir.clone(),
            ) {
                Ok(ctx) => ctx,
                Err(e) => {
                    warn!(interface = %iface.name, "Skipping interface: {e}");
                    continue;
                }
            };

            match self.scan_interface(system, iface, ctx, duration) {
                Ok(result) => results.push(result),
                Err(e) => error!(interface = %iface.name, "{e}"),
            }
        }

        info!("Network Discovery complete. Scanned {} interface(s).", results.len());
        Ok(results)
    }

    fn scan_interface(
        &self,
        system: &dyn SystemRepository,
        iface: &NetworkInterface,
        ctx: InterfaceContext,
        duration: Duration,
    ) -> Result<SessionResult, DiscoveryError> {
        let capture = SharedCapture::new(system.open_capture(iface, self.config())?);

        info!("Testing interface [{}] for Internet connectivity...", iface.name);
        let internet = system.can_reach_internet(iface);
        info!("Interface [{}]: {}", iface.name, if internet { "OK" } else { "FAIL" });

        self.plugins().initialize(&ctx);

        let listener_cancel = CancellationToken::new();
        let injector_cancel = CancellationToken::new();

        let listener = Listener::new(
            ctx.clone(),
            capture.clone(),
            self.plugins().listeners(),
            listener_cancel.clone(),
            self.config().poll_interval,
            self.vendors(),
        );
        let injector = Injector::new(
            self.next_injector_id(),
            &ctx.name,
            capture.clone(),
            self.plugins().injectors(),
            injector_cancel.clone(),
            self.config().injection_delay,
        );
        let waker = injector.waker();
        let unblocker = capture.unblocker();

        info!("Scanning interface [{}] for {} seconds...", ctx.name, duration.as_secs());
        let listener_handle = spawn_worker(format!("listener-{}", ctx.name), move || listener.run())?;
        let injector_handle = match spawn_worker(format!("injector-{}", ctx.name), move || injector.run()) {
            Ok(handle) => handle,
            Err(e) => {
                listener_cancel.cancel();
                unblocker.unblock();
                let _ = listener_handle.join();
                return Err(e);
            }
        };

        self.cancel().wait_timeout(duration);

        debug!(interface = %ctx.name, "Tearing down capture session");
        injector_cancel.cancel();
        waker.wake();
        listener_cancel.cancel();
        unblocker.unblock();

        let (listener_report, injector_report) = join_workers(&ctx.name, listener_handle, injector_handle)?;

        let stats = match capture.stats() {
            Ok(stats) => {
                debug!(interface = %ctx.name, "Capture statistics: {stats}");
                Some(stats)
            }
            Err(e) => {
                warn!(interface = %ctx.name, "Capture statistics unavailable: {e}");
                None
            }
        };
        drop(capture);

        Ok(SessionResult {
            interface: ctx,
            internet,
            stats,
            injector: injector_report,
            frames: listener_report.frames,
            nodes: listener_report.nodes.snapshot(),
        })
    }
}

fn spawn_worker<T: Send + 'static>(
    name: String,
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<JoinHandle<T>, DiscoveryError> {
    Ok(thread::Builder::new().name(name).spawn(f)?)
}

/// Joins both workers. A panic in either loses the interface's results.
fn join_workers(
    interface: &str,
    listener: JoinHandle<ListenerReport>,
    injector: JoinHandle<InjectorReport>,
) -> Result<(ListenerReport, InjectorReport), DiscoveryError> {
    let injector = injector.join();
    let listener = listener.join();
    match (listener, injector) {
        (Ok(listener), Ok(injector)) => Ok((listener, injector)),
        _ => Err(DiscoveryError::WorkerPanicked(interface.to_string())),
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
