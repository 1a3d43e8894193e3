//! The listener thread.
//!
//! Reads one frame at a time from the shared capture handle, resolves both ends
//! of the frame to [`NetworkNode`]s and hands the result to every listener
//! plugin. Only nodes judged to be on the local segment are kept.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pnet::datalink::MacAddr;
use sixscout_common::network::address;
use sixscout_common::network::interface::InterfaceContext;
use sixscout_common::network::mac::VendorRepository;
use sixscout_common::network::node::{NetworkNode, NodeTable, SharedNode};
use sixscout_plugins::strategies::ping6::NEIGHBOR_ID;
use sixscout_plugins::{ListenerPacket, PluginSlot};
use sixscout_protocols::frame::Frame;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::capture::SharedCapture;

const MULTICAST_GROUPS_V4: [Ipv4Addr; 2] = [Ipv4Addr::new(224, 0, 0, 251), Ipv4Addr::new(239, 255, 255, 250)];

const MULTICAST_GROUPS_V6: [Ipv6Addr; 3] = [
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x2),
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb),
    Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xf),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    JoinedMulticastGroups,
    Running,
    Draining,
    Stopped,
}

/// What the listener hands back when its thread ends.
#[derive(Debug)]
pub struct ListenerReport {
    /// Always [`ListenerState::Stopped`] once `run` returns.
    pub state: ListenerState,
    pub nodes: NodeTable,
    pub frames: usize,
    pub read_errors: usize,
}

/// Decides whether the `(mac, addr)` end of `frame` belongs to the local segment.
///
/// The rules are checked in a fixed order and the first match wins.
pub fn is_local(iface: &InterfaceContext, frame: &Frame, mac: MacAddr, addr: IpAddr) -> bool {
    if mac == MacAddr::broadcast() {
        return false;
    }
    if addr.is_multicast() {
        return false;
    }
    if address::is_link_local(&addr) || address::is_site_local(&addr) {
        return true;
    }
    if let IpAddr::V4(v4) = addr {
        if iface.in_ipv4_subnet(v4) {
            return true;
        }
        if iface.ipv4_gateway == Some(v4) {
            return true;
        }
    }

    let Some(icmp) = frame.icmpv6() else {
        return false;
    };
    // NDP messages with hop limit 255 cannot have crossed a router
    let on_link = frame.ipv6().is_some_and(|ip| ip.hop_limit == 255);
    if icmp.neighbor_advertisement().is_some() && on_link && mac == frame.ethernet().source {
        return true;
    }
    icmp.echo_reply().is_some_and(|echo| echo.identifier == NEIGHBOR_ID)
}

pub struct Listener {
    iface: InterfaceContext,
    capture: SharedCapture,
    plugins: Vec<PluginSlot>,
    cancel: CancellationToken,
    poll_interval: Duration,
    vendors: Arc<dyn VendorRepository>,
    nodes: NodeTable,
    state: ListenerState,
    frames: usize,
    read_errors: usize,
}

impl Listener {
    pub fn new(
        iface: InterfaceContext,
        capture: SharedCapture,
        plugins: Vec<PluginSlot>,
        cancel: CancellationToken,
        poll_interval: Duration,
        vendors: Arc<dyn VendorRepository>,
    ) -> Self {
        Self {
            iface,
            capture,
            plugins,
            cancel,
            poll_interval,
            vendors,
            nodes: NodeTable::new(),
            state: ListenerState::Idle,
            frames: 0,
            read_errors: 0,
        }
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// Runs until cancelled and returns the local nodes it found.
    pub fn run(mut self) -> ListenerReport {
        debug!(interface = %self.iface.name, "Starting listener thread...");
        let memberships = join_multicast_groups(&self.iface);
        self.state = ListenerState::JoinedMulticastGroups;

        self.state = ListenerState::Running;
        while !self.cancel.is_cancelled() {
            match self.capture.read() {
                Ok(Some(data)) => self.handle_frame(data),
                Ok(None) => {
                    self.cancel.wait_timeout(self.poll_interval);
                }
                Err(e) => {
                    self.read_errors += 1;
                    debug!(interface = %self.iface.name, "Capture read failed: {e}");
                    self.cancel.wait_timeout(self.poll_interval);
                }
            }
        }

        self.state = ListenerState::Draining;
        drop(memberships);
        self.state = ListenerState::Stopped;
        debug!(interface = %self.iface.name, frames = self.frames, nodes = self.nodes.len(), "Exiting listener thread.");

        ListenerReport {
            state: self.state,
            nodes: self.nodes,
            frames: self.frames,
            read_errors: self.read_errors,
        }
    }

    /// Resolves and dispatches one captured frame. Non-IP frames are ignored.
    pub fn handle_frame(&mut self, data: Vec<u8>) {
        let Some(frame) = Frame::parse(data) else {
            return;
        };
        self.frames += 1;

        let eth = *frame.ethernet();
        let src = self.resolve_node(&frame, eth.source, frame.source_ip());
        let dst = self.resolve_node(&frame, eth.destination, frame.destination_ip());
        let packet = ListenerPacket { frame, src, dst };

        for slot in &self.plugins {
            slot.with_listener("process_packet", |plugin| plugin.process_packet(&packet));
        }
    }

    fn resolve_node(&mut self, frame: &Frame, mac: MacAddr, addr: IpAddr) -> SharedNode {
        let local = is_local(&self.iface, frame, mac, addr);

        let node = match self.nodes.get(&mac) {
            Some(node) => node,
            None => {
                let node = Arc::new(Mutex::new(NetworkNode::new(mac, local)));
                if local {
                    self.nodes.insert(Arc::clone(&node));
                }
                node
            }
        };

        if local {
            let mut guard = node.lock();
            if guard.add_address(addr) {
                info!(
                    "New node found: MAC[{}], IP[{}], Manufacturer[{}]",
                    guard.mac_label(),
                    addr,
                    guard.manufacturer(self.vendors.as_ref())
                );
            }
        }
        node
    }
}

/// Sockets holding group memberships. Dropping them leaves the groups.
struct Memberships {
    _sockets: Vec<Socket>,
}

fn join_multicast_groups(iface: &InterfaceContext) -> Memberships {
    let mut sockets = Vec::new();

    match udp_socket(Domain::IPV4, SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))) {
        Ok(socket) => {
            let local = iface.first_ipv4().unwrap_or(Ipv4Addr::UNSPECIFIED);
            for group in MULTICAST_GROUPS_V4 {
                if let Err(e) = socket.join_multicast_v4(&group, &local) {
                    report_join_failure(iface, IpAddr::V4(group), iface.ipv4_nets.is_empty(), &e);
                }
            }
            sockets.push(socket);
        }
        Err(e) => debug!(interface = %iface.name, "No IPv4 multicast socket: {e}"),
    }

    match udp_socket(Domain::IPV6, SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))) {
        Ok(socket) => {
            for group in MULTICAST_GROUPS_V6 {
                if let Err(e) = socket.join_multicast_v6(&group, iface.index) {
                    report_join_failure(iface, IpAddr::V6(group), false, &e);
                }
            }
            sockets.push(socket);
        }
        Err(e) => debug!(interface = %iface.name, "No IPv6 multicast socket: {e}"),
    }

    Memberships { _sockets: sockets }
}

fn udp_socket(domain: Domain, bind: SocketAddr) -> std::io::Result<Socket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if domain == Domain::IPV6 {
        socket.set_only_v6(true)?;
    }
    socket.bind(&bind.into())?;
    Ok(socket)
}

fn report_join_failure(iface: &InterfaceContext, group: IpAddr, family_missing: bool, e: &std::io::Error) {
    let family = if group.is_ipv4() { "IPv4" } else { "IPv6" };
    if family_missing {
        debug!(interface = %iface.name, "Unable to join multicast group [{group}], is there no assigned {family} address?");
    } else {
        warn!(interface = %iface.name, "Unable to join multicast group [{group}]: {e}");
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
