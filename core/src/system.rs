//! Everything the orchestrator asks of the host: interfaces, the default
//! gateway, internet reachability and capture handles.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::process::Command;
use std::time::Duration;

use pnet::datalink::{self, NetworkInterface};
use rayon::prelude::*;
use sixscout_common::config::Config;
use sixscout_common::error::DiscoveryError;
use sixscout_common::network::address;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::debug;

use crate::capture::{CaptureBackend, PcapBackend};

const REACHABILITY_HOST: &str = "google.com:80";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub trait SystemRepository: Send + Sync {
    fn network_interfaces(&self) -> Vec<NetworkInterface>;

    fn default_gateway(&self) -> Option<Ipv4Addr>;

    fn can_reach_internet(&self, iface: &NetworkInterface) -> bool;

    fn open_capture(&self, iface: &NetworkInterface, config: &Config) -> Result<Box<dyn CaptureBackend>, DiscoveryError>;
}

/// The real host.
pub struct SystemRepo;

impl SystemRepository for SystemRepo {
    fn network_interfaces(&self) -> Vec<NetworkInterface> {
        datalink::interfaces()
    }

    fn default_gateway(&self) -> Option<Ipv4Addr> {
        default_gateway()
    }

    fn can_reach_internet(&self, iface: &NetworkInterface) -> bool {
        can_reach_internet(iface)
    }

    fn open_capture(&self, iface: &NetworkInterface, config: &Config) -> Result<Box<dyn CaptureBackend>, DiscoveryError> {
        Ok(Box::new(PcapBackend::open(&iface.name, config)?))
    }
}

/// Default IPv4 gateway from the routing table.
pub fn default_gateway() -> Option<Ipv4Addr> {
    #[cfg(target_os = "linux")]
    if let Some(gw) = command_output("ip", &["-4", "route", "show", "default"]).and_then(|out| parse_ip_route(&out)) {
        return Some(gw);
    }

    #[cfg(target_os = "macos")]
    if let Some(gw) = command_output("route", &["-n", "get", "default"]).and_then(|out| parse_route_get(&out)) {
        return Some(gw);
    }

    command_output("netstat", &["-rn"]).and_then(|out| parse_netstat(&out))
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
        Ok(output) => {
            debug!(program, status = %output.status, "Routing table query failed");
            None
        }
        Err(e) => {
            debug!(program, "Routing table query unavailable: {e}");
            None
        }
    }
}

/// `default via 192.168.1.1 dev eth0 ...`
pub fn parse_ip_route(output: &str) -> Option<Ipv4Addr> {
    output.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        if words.next()? != "default" {
            return None;
        }
        words.skip_while(|w| *w != "via").nth(1)?.parse().ok()
    })
}

/// `    gateway: 192.168.1.1`
pub fn parse_route_get(output: &str) -> Option<Ipv4Addr> {
    output.lines().find_map(|line| line.trim().strip_prefix("gateway:")?.trim().parse().ok())
}

/// The gateway column of the `default` or `0.0.0.0` row.
pub fn parse_netstat(output: &str) -> Option<Ipv4Addr> {
    output.lines().find_map(|line| {
        let mut cols = line.split_whitespace();
        match cols.next()? {
            "default" | "0.0.0.0" => cols.next()?.parse().ok(),
            _ => None,
        }
    })
}

/// True if a TCP connection from any of the interface's non-link-local addresses
/// reaches the outside world.
pub fn can_reach_internet(iface: &NetworkInterface) -> bool {
    if iface.is_loopback() || !iface.is_up() {
        return false;
    }

    let targets: Vec<SocketAddr> = match REACHABILITY_HOST.to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(e) => {
            debug!(interface = %iface.name, "Cannot resolve {REACHABILITY_HOST}: {e}");
            return false;
        }
    };

    let sources: Vec<IpAddr> = iface
        .ips
        .iter()
        .map(|net| net.ip())
        .filter(|ip| !address::is_link_local(ip))
        .collect();

    sources.par_iter().any(|source| {
        targets
            .iter()
            .filter(|target| target.is_ipv4() == source.is_ipv4())
            .any(|target| connect_from(*source, target))
    })
}

fn connect_from(source: IpAddr, target: &SocketAddr) -> bool {
    let attempt = || -> std::io::Result<()> {
        let socket = Socket::new(Domain::for_address(*target), Type::STREAM, Some(Protocol::TCP))?;
        socket.bind(&SockAddr::from(SocketAddr::new(source, 0)))?;
        socket.connect_timeout(&SockAddr::from(*target), CONNECT_TIMEOUT)?;
        Ok(())
    };
    match attempt() {
        Ok(()) => true,
        Err(e) => {
            debug!(%source, %target, "Connect failed: {e}");
            false
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
