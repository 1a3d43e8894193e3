//! Per-run context and per-interface results.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use sixscout_common::config::Config;
use sixscout_common::network::interface::InterfaceContext;
use sixscout_common::network::mac::VendorRepository;
use sixscout_common::network::node::{FactKind, NetworkNode};
use sixscout_plugins::{InjectorId, PluginSet, registry};

use crate::cancel::CancellationToken;
use crate::capture::CaptureStats;
use crate::injector::InjectorReport;

/// Everything a discovery run needs: configuration, the plugin set and a stop signal.
///
/// Built once per run and passed explicitly to the orchestrator.
pub struct DiscoverySession {
    config: Config,
    plugins: PluginSet,
    vendors: Arc<dyn VendorRepository>,
    cancel: CancellationToken,
    next_injector_id: AtomicU64,
}

impl DiscoverySession {
    pub fn new(config: Config, plugins: PluginSet, vendors: Arc<dyn VendorRepository>) -> Self {
        Self {
            config,
            plugins,
            vendors,
            cancel: CancellationToken::new(),
            next_injector_id: AtomicU64::new(1),
        }
    }

    /// Instantiates the strategies named in `config.plugins`, or all of them.
    pub fn from_manifest(config: Config, vendors: Arc<dyn VendorRepository>) -> anyhow::Result<Self> {
        let plugins = if config.plugins.is_empty() {
            registry::instantiate_all()
        } else {
            registry::instantiate(&config.plugins)
                .map_err(|unknown| anyhow!("unknown discovery strategies: {}", unknown.join(", ")))?
        };
        Ok(Self::new(config, plugins, vendors))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    pub fn vendors(&self) -> Arc<dyn VendorRepository> {
        Arc::clone(&self.vendors)
    }

    /// Cancelling this token ends the current interface early and skips the rest.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn next_injector_id(&self) -> InjectorId {
        self.next_injector_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Outcome of scanning one interface.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub interface: InterfaceContext,
    pub internet: bool,
    /// `None` when the capture library could not report counters.
    pub stats: Option<CaptureStats>,
    pub injector: InjectorReport,
    pub frames: usize,
    /// Local nodes, ordered by MAC.
    pub nodes: Vec<NetworkNode>,
}

impl SessionResult {
    pub fn routers(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes
            .iter()
            .filter(|node| node.has_fact(FactKind::Ipv6Router) || node.has_fact(FactKind::Ipv4Router))
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
