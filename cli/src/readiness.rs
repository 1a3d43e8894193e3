//! IPv6 readiness pre-check: can this host resolve AAAA records, reach an
//! IPv6-only service, and which interfaces carry IPv6 at all.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use pnet::datalink::{self, NetworkInterface};
use sixscout_common::utils::interface::NetworkInterfaceExtension;
use tracing::debug;

const HTTP_PORT: u16 = 80;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Default)]
pub struct Readiness {
    pub aaaa_resolvable: bool,
    pub ipv6_reachable: bool,
    pub interfaces: Vec<String>,
}

impl Readiness {
    pub fn has_ipv6_interface(&self) -> bool {
        !self.interfaces.is_empty()
    }
}

pub fn check(domains: &[String]) -> Readiness {
    let resolved: Vec<SocketAddr> = domains.iter().flat_map(|domain| resolve_v6(domain)).collect();
    let ipv6_reachable = resolved
        .iter()
        .any(|addr| match TcpStream::connect_timeout(addr, CONNECT_TIMEOUT) {
            Ok(_) => true,
            Err(e) => {
                debug!(%addr, "IPv6 connect failed: {e}");
                false
            }
        });

    Readiness {
        aaaa_resolvable: !resolved.is_empty(),
        ipv6_reachable,
        interfaces: ipv6_interfaces(&datalink::interfaces()),
    }
}

fn resolve_v6(domain: &str) -> Vec<SocketAddr> {
    match (domain, HTTP_PORT).to_socket_addrs() {
        Ok(addrs) => addrs.filter(SocketAddr::is_ipv6).collect(),
        Err(e) => {
            debug!(domain, "AAAA lookup failed: {e}");
            Vec::new()
        }
    }
}

/// Up, non-loopback interfaces that carry an IPv6 address.
pub fn ipv6_interfaces(interfaces: &[NetworkInterface]) -> Vec<String> {
    interfaces
        .iter()
        .filter(|iface| iface.is_up() && !iface.is_loopback() && iface.has_ipv6())
        .map(|iface| iface.name.clone())
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
