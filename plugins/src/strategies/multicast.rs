//! Static probes built from captured reference packets.
//!
//! Each template is re-addressed from this interface and fanned out to a fixed
//! table of well-known multicast destinations. Nothing here reacts to traffic.

use std::net::{Ipv4Addr, Ipv6Addr};

use anyhow::Context;
use pnet::datalink::MacAddr;
use sixscout_common::network::interface::InterfaceContext;
use sixscout_protocols::template::{self, Ipv4Rewrite, Ipv6Rewrite, Template, TemplateFamily};
use tracing::{debug, warn};

use crate::plugin::{InjectorPlugin, Plugin};

const V6_DESTINATIONS: [(MacAddr, Ipv6Addr); 4] = [
    (MacAddr(0x33, 0x33, 0, 0, 0, 0x0c), Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x0c)),
    (MacAddr(0x33, 0x33, 0, 0, 0, 0x0f), Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x0f)),
    (MacAddr(0x33, 0x33, 0, 0, 0, 0x01), Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x01)),
    (MacAddr(0x33, 0x33, 0, 0, 0, 0xfb), Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0xfb)),
];

const V4_MACS: [MacAddr; 5] = [
    MacAddr(0xff, 0xff, 0xff, 0xff, 0xff, 0xff),
    MacAddr(0x33, 0x33, 0x06, 0x06, 0x06, 0x06),
    MacAddr(0x01, 0x00, 0x5e, 0x7f, 0xff, 0xfa),
    MacAddr(0x01, 0x00, 0x5e, 0x00, 0x00, 0xfb),
    MacAddr(0x01, 0x00, 0x5e, 0x00, 0x00, 0x01),
];

const V4_GROUPS: [Ipv4Addr; 3] = [
    Ipv4Addr::new(224, 0, 0, 1),
    Ipv4Addr::new(224, 0, 0, 251),
    Ipv4Addr::new(239, 255, 255, 250),
];

pub struct MulticastProbe {
    name: &'static str,
    family: TemplateFamily,
    packets: Vec<Vec<u8>>,
}

impl MulticastProbe {
    fn new(name: &'static str, family: TemplateFamily) -> Self {
        Self {
            name,
            family,
            packets: Vec::new(),
        }
    }

    pub fn icmp_v4() -> Self {
        Self::new("ICMPv4", TemplateFamily::IcmpV4)
    }

    pub fn icmp_v6() -> Self {
        Self::new("ICMPv6", TemplateFamily::IcmpV6)
    }

    pub fn udp_v4() -> Self {
        Self::new("UDP IPv4", TemplateFamily::UdpV4)
    }

    pub fn udp_v6() -> Self {
        Self::new("UDP IPv6", TemplateFamily::UdpV6)
    }
}

impl Plugin for MulticastProbe {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(&mut self, iface: &InterfaceContext) -> anyhow::Result<()> {
        self.packets.clear();
        let templates = template::load_family(&iface.template_dir, self.family);
        self.packets = expand(self.family, &templates, iface)
            .with_context(|| format!("cannot prepare {} probes on {}", self.name, iface.name))?;
        debug!(plugin = self.name, templates = templates.len(), packets = self.packets.len(), "Probes ready");
        Ok(())
    }

    fn as_injector(&mut self) -> Option<&mut dyn InjectorPlugin> {
        Some(self)
    }
}

impl InjectorPlugin for MulticastProbe {
    fn injection_packets(&mut self) -> anyhow::Result<Vec<Vec<u8>>> {
        Ok(self.packets.clone())
    }
}

/// Rewrites every template for every destination of `family`.
///
/// A template with the wrong header chain is skipped. IPv4 families need an
/// IPv4 address on the interface.
pub fn expand(family: TemplateFamily, templates: &[Template], iface: &InterfaceContext) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut packets = Vec::new();

    if family.is_ipv6() {
        for tpl in templates {
            for (dst_mac, dst_ip) in V6_DESTINATIONS {
                let rewrite = Ipv6Rewrite {
                    src_mac: iface.mac,
                    dst_mac,
                    src_ip: iface.link_local,
                    dst_ip,
                };
                match template::rewrite_ipv6(&tpl.data, &rewrite) {
                    Ok(packet) => packets.push(packet),
                    Err(e) => {
                        warn!(template = %tpl.path.display(), "Invalid packet type: {e}");
                        break;
                    }
                }
            }
        }
        return Ok(packets);
    }

    let src_ip = iface
        .first_ipv4()
        .with_context(|| format!("no IPv4 source address on {}", iface.name))?;

    for tpl in templates {
        'destinations: for dst_mac in V4_MACS {
            for dst_ip in V4_GROUPS {
                let rewrite = Ipv4Rewrite {
                    src_mac: iface.mac,
                    dst_mac,
                    src_ip,
                    dst_ip,
                };
                match template::rewrite_ipv4(&tpl.data, &rewrite) {
                    Ok(packet) => packets.push(packet),
                    Err(e) => {
                        warn!(template = %tpl.path.display(), "Invalid packet type: {e}");
                        break 'destinations;
                    }
                }
            }
        }
    }
    Ok(packets)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
