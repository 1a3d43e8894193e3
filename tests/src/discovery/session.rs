use std::sync::Arc;
use std::time::Duration;

use sixscout_common::config::{Config, InterfaceFilter};
use sixscout_common::error::DiscoveryError;
use sixscout_common::network::address;
use sixscout_common::network::node::FactKind;
use sixscout_core::DiscoverySession;
use sixscout_plugins::strategies::ping6::NEIGHBOR_ID;
use sixscout_protocols::frame::Frame;
use sixscout_protocols::icmpv6::Icmpv6Body;

use super::engine::NoVendor;
use crate::fakes::{Event, FakeHost};
use crate::util::{self, IFF_BROADCAST, IFF_UP, LOCAL_MAC, ROUTER_MAC};

const ROUTER_LL: &str = "fe80::1:2";

fn config(plugins: &[&str]) -> Config {
    Config {
        injection_delay: Duration::from_millis(1),
        plugins: plugins.iter().map(|p| p.to_string()).collect(),
        ..Config::default()
    }
}

fn session(plugins: &[&str]) -> DiscoverySession {
    DiscoverySession::from_manifest(config(plugins), Arc::new(NoVendor)).unwrap()
}

fn sent_bodies(host: &FakeHost) -> Vec<Icmpv6Body> {
    host.probe
        .sent()
        .into_iter()
        .filter_map(Frame::parse)
        .filter_map(|frame| frame.icmpv6().map(|m| m.body.clone()))
        .collect()
}

#[test]
fn router_advertisement_yields_router_node_and_follow_up_probes() {
    let mut host = FakeHost::new(
        vec![util::lan_interface()],
        vec![util::router_advertisement(ROUTER_MAC, util::ip6(ROUTER_LL))],
    );
    host.warmup = 20;
    let session = session(&["router-discovery", "neighbor-discovery", "ping6"]);

    let results = session.run_with(&host, 300).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.interface.name, "eth0");
    assert!(result.internet);
    assert_eq!(result.injector.static_total, 2);
    assert_eq!(result.injector.static_sent, 2);

    let routers: Vec<_> = result.routers().collect();
    assert_eq!(routers.len(), 1);
    assert_eq!(routers[0].mac(), ROUTER_MAC);
    assert!(routers[0].has_fact(FactKind::Ipv6Router));

    let global = util::ip6("2a00:1450:4001:1::1:2");
    assert_eq!(address::interface_identifier(&global), address::interface_identifier(&util::ip6(ROUTER_LL)));

    let bodies = sent_bodies(&host);
    assert!(bodies.iter().any(|b| matches!(b, Icmpv6Body::RouterSolicitation(_))));
    assert!(
        bodies
            .iter()
            .any(|b| matches!(b, Icmpv6Body::NeighborSolicitation(ns) if ns.target == global))
    );
    assert!(
        bodies
            .iter()
            .any(|b| matches!(b, Icmpv6Body::EchoRequest(echo) if echo.identifier == NEIGHBOR_ID))
    );
}

#[test]
fn teardown_unblocks_before_reading_stats_and_closes_last() {
    let host = FakeHost::new(vec![util::lan_interface()], Vec::new());
    let results = session(&["router-discovery"]).run_with(&host, 50).unwrap();
    assert_eq!(results.len(), 1);

    let events = host.probe.events();
    let unblock = host.probe.position(&Event::Unblock).unwrap();
    let stats = host.probe.position(&Event::Stats).unwrap();
    let closed = host.probe.position(&Event::Closed).unwrap();

    assert!(unblock < stats);
    assert_eq!(stats + 1, closed);
    assert_eq!(closed + 1, events.len());
    assert!(results[0].stats.is_some());
}

#[test]
fn each_allowed_interface_gets_its_own_session() {
    let wlan = util::ni(
        "wlan0",
        3,
        Some(LOCAL_MAC),
        &[util::v6("fe80::2", 64)],
        IFF_UP | IFF_BROADCAST,
    );
    let v4_only = util::ni("eth1", 4, Some(LOCAL_MAC), &[util::v4(10, 0, 0, 2, 8)], IFF_UP);
    let host = FakeHost::new(vec![util::lan_interface(), wlan, v4_only], Vec::new());

    let all = session(&["router-discovery"]).run_with(&host, 20).unwrap();
    let names: Vec<_> = all.iter().map(|r| r.interface.name.as_str()).collect();
    assert_eq!(names, vec!["eth0", "wlan0"]);

    let filtered = DiscoverySession::from_manifest(
        Config {
            interfaces: InterfaceFilter::parse("wlan0"),
            ..config(&["router-discovery"])
        },
        Arc::new(NoVendor),
    )
    .unwrap()
    .run_with(&host, 20)
    .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].interface.name, "wlan0");
    assert!(filtered[0].interface.global_prefixes.len() == 1);
}

#[test]
fn host_without_ipv6_is_rejected() {
    let v4_only = util::ni("eth1", 4, Some(LOCAL_MAC), &[util::v4(10, 0, 0, 2, 8)], IFF_UP);
    let host = FakeHost::new(vec![v4_only], Vec::new());
    let err = session(&[]).run_with(&host, 20).unwrap_err();
    assert!(matches!(err, DiscoveryError::NoCandidateInterface));
}
