use std::sync::Arc;
use std::time::Duration;

use sixscout_common::config::Config;
use sixscout_core::DiscoverySession;
use sixscout_plugins::PluginSet;
use sixscout_plugins::strategies::ping6::Ping6;
use sixscout_plugins::strategies::router_discovery::RouterDiscovery;
use tracing::Level;

use super::engine::NoVendor;
use super::isolation::listener;
use crate::fakes::FakeHost;
use crate::logs::LogCapture;
use crate::util::{self, IFF_BROADCAST, IFF_UP, LOCAL_MAC, ROUTER_MAC};

const ROUTER_ANNOUNCEMENT: &str = "is an IPv6 router";
const NO_GATEWAY: &str = "Unable to determine IPv4 default gateway";

fn session() -> DiscoverySession {
    let config = Config {
        injection_delay: Duration::from_millis(1),
        plugins: vec!["router-discovery".to_string()],
        ..Config::default()
    };
    DiscoverySession::from_manifest(config, Arc::new(NoVendor)).unwrap()
}

#[test]
fn router_advertisement_is_announced_once() {
    let plugins = PluginSet::new(vec![Box::new(RouterDiscovery::new())]);
    plugins.initialize(&util::lan_context());
    let mut listener = listener(&plugins);
    let ra = util::router_advertisement(ROUTER_MAC, util::ip6("fe80::1:2"));

    let logs = LogCapture::default();
    logs.capture(|| {
        listener.handle_frame(ra.clone());
        listener.handle_frame(ra);
    });

    assert_eq!(logs.count(Level::INFO, ROUTER_ANNOUNCEMENT), 1);
}

#[test]
fn router_echo_reply_is_announced_once() {
    let plugins = PluginSet::new(vec![Box::new(Ping6::new())]);
    plugins.initialize(&util::lan_context());
    let mut listener = listener(&plugins);
    let reply = util::router_echo_reply(ROUTER_MAC, util::ip6("fe80::1:2"));

    let logs = LogCapture::default();
    logs.capture(|| {
        listener.handle_frame(reply.clone());
        listener.handle_frame(reply);
    });

    assert_eq!(logs.count(Level::INFO, ROUTER_ANNOUNCEMENT), 1);
    assert_eq!(listener.nodes().snapshot().iter().filter(|n| n.facts().count() == 1).count(), 1);
}

#[test]
fn missing_gateway_is_warned_once_per_run() {
    let wlan = util::ni(
        "wlan0",
        3,
        Some(LOCAL_MAC),
        &[util::v6("fe80::2", 64)],
        IFF_UP | IFF_BROADCAST,
    );
    let mut host = FakeHost::new(vec![util::lan_interface(), wlan], Vec::new());
    host.gateway = None;

    let logs = LogCapture::default();
    let results = logs.capture(|| session().run_with(&host, 20)).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(logs.count(Level::WARN, NO_GATEWAY), 1);
}

#[test]
fn known_gateway_is_not_warned() {
    let host = FakeHost::new(vec![util::lan_interface()], Vec::new());

    let logs = LogCapture::default();
    logs.capture(|| session().run_with(&host, 20)).unwrap();

    assert_eq!(logs.count(Level::WARN, NO_GATEWAY), 0);
    assert_eq!(logs.count(Level::DEBUG, "Default IPv4 gateway of localhost is [192.168.1.1]"), 1);
}
