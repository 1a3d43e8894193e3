use colored::*;
use pnet::datalink;
use sixscout_common::network::interface;
use sixscout_common::utils::interface::NetworkInterfaceExtension;

use crate::terminal::{colors, print};

pub fn interfaces() {
    print::header("ipv6 interfaces");
    let candidates = interface::ipv6_candidates(datalink::interfaces());
    if candidates.is_empty() {
        print::no_results();
        return;
    }

    for (idx, iface) in candidates.iter().enumerate() {
        print::tree_head(idx, &iface.name);
        let mut details = Vec::new();
        if let Some(mac) = iface.mac {
            details.push(("MAC".to_string(), mac.to_string().to_uppercase().color(colors::MAC_ADDR)));
        }
        let state = if iface.is_up() { "up".green() } else { "down".red() };
        details.push(("State".to_string(), state));
        let ips: Vec<_> = iface.ips.iter().map(|net| net.ip()).collect();
        details.extend(print::address_details(ips.iter()));
        if let Some(link_local) = iface.get_link_local_ipv6() {
            details.push(("Source".to_string(), link_local.to_string().color(colors::IPV6_ADDR)));
        }
        print::as_tree_one_level(details);
    }
}
