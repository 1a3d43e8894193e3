use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sixscout_common::network::interface::InterfaceContext;
use sixscout_common::network::node::{FactKind, NodeFact, RouterEvidence};
use sixscout_core::listener::Listener;
use sixscout_core::{CancellationToken, SharedCapture};
use sixscout_plugins::strategies::router_discovery::RouterDiscovery;
use sixscout_plugins::{ListenerPacket, ListenerPlugin, Plugin, PluginSet};

use super::engine::NoVendor;
use crate::fakes::{FakeCapture, Probe};
use crate::util::{self, ROUTER_MAC};

struct Exploding;

impl Plugin for Exploding {
    fn name(&self) -> &str {
        "Exploding"
    }
    fn initialize(&mut self, _iface: &InterfaceContext) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_listener(&mut self) -> Option<&mut dyn ListenerPlugin> {
        Some(self)
    }
}

impl ListenerPlugin for Exploding {
    fn process_packet(&mut self, _packet: &ListenerPacket) -> anyhow::Result<()> {
        panic!("malformed option")
    }
}

struct Failing;

impl Plugin for Failing {
    fn name(&self) -> &str {
        "Failing"
    }
    fn initialize(&mut self, _iface: &InterfaceContext) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_listener(&mut self) -> Option<&mut dyn ListenerPlugin> {
        Some(self)
    }
}

impl ListenerPlugin for Failing {
    fn process_packet(&mut self, _packet: &ListenerPacket) -> anyhow::Result<()> {
        anyhow::bail!("cannot handle this frame")
    }
}

struct Counting(Arc<AtomicUsize>);

impl Plugin for Counting {
    fn name(&self) -> &str {
        "Counting"
    }
    fn initialize(&mut self, _iface: &InterfaceContext) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_listener(&mut self) -> Option<&mut dyn ListenerPlugin> {
        Some(self)
    }
}

impl ListenerPlugin for Counting {
    fn process_packet(&mut self, _packet: &ListenerPacket) -> anyhow::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(super) fn listener(plugins: &PluginSet) -> Listener {
    let capture = SharedCapture::new(Box::new(FakeCapture::new(Vec::new(), Probe::default())));
    Listener::new(
        util::lan_context(),
        capture,
        plugins.listeners(),
        CancellationToken::new(),
        Duration::from_millis(1),
        Arc::new(NoVendor),
    )
}

#[test]
fn faulty_plugins_do_not_starve_healthy_ones() {
    let seen = Arc::new(AtomicUsize::new(0));
    let plugins = PluginSet::new(vec![
        Box::new(Exploding),
        Box::new(Counting(Arc::clone(&seen))),
        Box::new(Failing),
    ]);
    let mut listener = listener(&plugins);

    for i in 0..25 {
        let src = util::ip6(&format!("fe80::{:x}", i + 1));
        listener.handle_frame(util::neighbor_advertisement(ROUTER_MAC, src, 255));
    }

    assert_eq!(seen.load(Ordering::SeqCst), 25);
}

#[test]
fn repeated_pair_is_stored_once() {
    let plugins = PluginSet::default();
    let mut listener = listener(&plugins);
    let frame = util::neighbor_advertisement(ROUTER_MAC, util::ip6("fe80::beef"), 255);

    listener.handle_frame(frame.clone());
    listener.handle_frame(frame);

    let nodes = listener.nodes().snapshot();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].mac(), ROUTER_MAC);
    assert_eq!(nodes[0].addresses().count(), 1);
}

#[test]
fn routed_traffic_is_observed_but_not_kept() {
    let plugins = PluginSet::default();
    let mut listener = listener(&plugins);

    // a global source with a lowered hop limit has crossed a router
    listener.handle_frame(util::neighbor_advertisement(ROUTER_MAC, util::ip6("2a00:1450::99"), 64));
    assert!(listener.nodes().is_empty());

    // the same MAC later proves itself on-link
    listener.handle_frame(util::neighbor_advertisement(ROUTER_MAC, util::ip6("2a00:1450::99"), 255));
    assert_eq!(listener.nodes().len(), 1);
}

#[test]
fn second_router_advertisement_adds_no_fact() {
    let plugins = PluginSet::new(vec![Box::new(RouterDiscovery::new())]);
    plugins.initialize(&util::lan_context());
    let mut listener = listener(&plugins);
    let ra = util::router_advertisement(ROUTER_MAC, util::ip6("fe80::1:2"));

    listener.handle_frame(ra.clone());
    listener.handle_frame(ra);

    let nodes = listener.nodes().snapshot();
    assert_eq!(nodes.len(), 1);
    let facts: Vec<&NodeFact> = nodes[0].facts().collect();
    assert_eq!(
        facts,
        vec![&NodeFact::Ipv6Router {
            evidence: RouterEvidence::RouterAdvertisement
        }]
    );
    assert!(nodes[0].has_fact(FactKind::Ipv6Router));
}
