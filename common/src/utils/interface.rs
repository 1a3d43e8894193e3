use std::net::{Ipv4Addr, Ipv6Addr};

use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};

use crate::network::address;

pub trait NetworkInterfaceExtension {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network>;
    fn get_ipv6_nets(&self) -> Vec<Ipv6Network>;
    fn has_ipv6(&self) -> bool;
    fn get_link_local_ipv6(&self) -> Option<Ipv6Addr>;
    fn get_first_ipv4(&self) -> Option<Ipv4Addr>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn get_ipv4_nets(&self) -> Vec<Ipv4Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V4(ipv4) = ip {
                    Some(*ipv4)
                } else {
                    None
                }
            })
            .collect()
    }

    fn get_ipv6_nets(&self) -> Vec<Ipv6Network> {
        self.ips
            .iter()
            .filter_map(|ip| {
                if let IpNetwork::V6(ipv6) = ip {
                    Some(*ipv6)
                } else {
                    None
                }
            })
            .collect()
    }

    fn has_ipv6(&self) -> bool {
        self.ips.iter().any(IpNetwork::is_ipv6)
    }

    fn get_link_local_ipv6(&self) -> Option<Ipv6Addr> {
        self.get_ipv6_nets()
            .into_iter()
            .map(|net| net.ip())
            .find(|ip| address::is_link_local(&(*ip).into()))
    }

    fn get_first_ipv4(&self) -> Option<Ipv4Addr> {
        self.get_ipv4_nets().first().map(|net| net.ip())
    }
}
