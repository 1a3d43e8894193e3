use std::net::{IpAddr, Ipv6Addr};

use colored::*;

use crate::terminal::print;

pub fn classify(addresses: &[Ipv6Addr]) {
    print::header("address classification");
    for (idx, addr) in addresses.iter().enumerate() {
        print::tree_head(idx, &addr.to_string());
        let details = print::address_details([IpAddr::V6(*addr)].iter());
        print::as_tree_one_level(details);
        if idx + 1 != addresses.len() {
            print::print("");
        }
    }
    print::fat_separator();
    print::centerln(&format!("{} address(es) classified", addresses.len().to_string().green().bold()));
}
