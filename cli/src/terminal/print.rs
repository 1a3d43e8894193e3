use std::fmt::Display;
use std::net::{IpAddr, Ipv6Addr};

use colored::*;
use sixscout_common::network::address::{self, AddressScope, SixToFourInfo, TeredoInfo};
use sixscout_common::network::mac::VendorRepository;
use sixscout_common::network::node::NetworkNode;
use sixscout_core::SessionResult;
use tracing::info;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;
const KEY_WIDTH: usize = 12;

/// Events with this target are written without a status symbol.
pub const PRINT_TARGET: &str = "sixscout::print";

type Detail = (String, ColoredString);

pub trait WithDefaultColor {
    fn with_default(self, default_color: Color) -> ColoredString;
}

impl WithDefaultColor for &str {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for String {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for ColoredString {
    fn with_default(self, _default_color: Color) -> ColoredString {
        self
    }
}

pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, "{msg}");
}

pub fn banner() {
    let text = format!("⟦ SIXSCOUT v{} ⟧ ", env!("CARGO_PKG_VERSION"));
    let side = TOTAL_WIDTH.saturating_sub(text.chars().count()) / 2;
    let sep = "═".repeat(side).bright_black();
    print(&format!("{}{}{}", sep, text.bright_green().bold(), sep));
}

pub fn header(msg: &str) {
    let formatted = format!("⟦ {} ⟧", msg);
    let dash_count = TOTAL_WIDTH.saturating_sub(formatted.chars().count());
    let left = dash_count / 2;
    let right = dash_count - left;

    let line = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().bright_green(),
        "─".repeat(right)
    )
    .bright_black();
    print(&line.to_string());
}

pub fn fat_separator() {
    print(&"═".repeat(TOTAL_WIDTH).bright_black().to_string());
}

pub fn aligned_line<V>(key: &str, value: V)
where
    V: Display + WithDefaultColor,
{
    let dots = ".".repeat((KEY_WIDTH + 1).saturating_sub(key.len()));
    let colon = format!("{}{}", dots.color(colors::SEPARATOR), ":".color(colors::SEPARATOR));
    let value = value.with_default(colors::TEXT_DEFAULT);
    print_status(format!("{}{} {}", key.color(colors::PRIMARY), colon, value));
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    let prefix = ">".color(colors::SEPARATOR);
    print(&format!("{} {}", prefix, msg.as_ref().color(colors::TEXT_DEFAULT)));
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str = format!("[{}]", idx.to_string().color(colors::ACCENT));
    print(&format!("{} {}", idx_str.color(colors::SEPARATOR), name.color(colors::PRIMARY)));
}

pub fn as_tree_one_level(details: Vec<Detail>) {
    for (i, (key, value)) in details.iter().enumerate() {
        let branch = if i + 1 == details.len() { "└─" } else { "├─" }.bright_black();
        let output = format!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            ".".repeat(KEY_WIDTH.saturating_sub(key.chars().count())).color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        );
        print(&output);
    }
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(msg.chars().count()) / 2);
    print(&format!("{}{}", space, msg));
}

const NO_RESULTS: &str = r#"
         _   _  ___    _   _  ___  ____  _____ ____
        | \ | |/ _ \  | \ | |/ _ \|  _ \| ____/ ___|
        |  \| | | | | |  \| | | | | | | |  _| \___ \
        | |\  | |_| | | |\  | |_| | |_| | |___ ___) |
        |_| \_|\___/  |_| \_|\___/|____/|_____|____/
"#;

pub fn no_results() {
    print(&NO_RESULTS.red().bold().to_string());
}

/// Short label and colour for an IPv6 scope.
pub fn scope_label(addr: &Ipv6Addr) -> (AddressScope, &'static str) {
    let scope = address::classify(addr);
    let short = match scope {
        AddressScope::Global => "GUA",
        AddressScope::LinkLocal => "LLA",
        AddressScope::Ula => "ULA",
        AddressScope::SiteLocal => "SLA",
        AddressScope::GlobalTeredo => "Teredo",
        AddressScope::Global6to4 => "6to4",
        s if s.is_multicast() => "Multicast",
        _ => "IPv6",
    };
    (scope, short)
}

/// One detail per address; Teredo and 6to4 addresses get an extra line with
/// the embedded IPv4 data.
pub fn address_details<'a>(addrs: impl Iterator<Item = &'a IpAddr>) -> Vec<Detail> {
    let mut details = Vec::new();
    for addr in addrs {
        match addr {
            IpAddr::V4(v4) => details.push(("IPv4".to_string(), v4.to_string().color(colors::IPV4_ADDR))),
            IpAddr::V6(v6) => {
                let (scope, short) = scope_label(v6);
                let value = format!("{} {}", v6.to_string().color(colors::IPV6_ADDR), format!("({scope})").dimmed());
                details.push((short.to_string(), value.normal()));
                if let Some(teredo) = TeredoInfo::decode(v6) {
                    details.push(("Teredo".to_string(), teredo_summary(&teredo).normal()));
                }
                if let Some(six) = SixToFourInfo::decode(v6) {
                    details.push(("6to4".to_string(), format!("client {}", six.client).normal()));
                }
            }
        }
    }
    details
}

pub fn teredo_summary(info: &TeredoInfo) -> String {
    format!(
        "server {}, client {}:{}{}",
        info.server,
        info.client,
        info.port,
        if info.is_cone() { ", cone NAT" } else { "" }
    )
}

pub fn node_tree(idx: usize, node: &NetworkNode, vendors: &dyn VendorRepository) {
    tree_head(idx, &node.mac_label());
    let mut details = address_details(node.addresses());
    details.push(("Vendor".to_string(), node.manufacturer(vendors).normal()));
    for fact in node.facts() {
        details.push(("Role".to_string(), fact.to_string().yellow()));
    }
    as_tree_one_level(details);
}

pub fn session(result: &SessionResult, vendors: &dyn VendorRepository) {
    header(&format!("interface {}", result.interface.name));
    aligned_line("MAC", result.interface.mac.to_string().to_uppercase().color(colors::MAC_ADDR));
    aligned_line("Link-local", result.interface.link_local.to_string().color(colors::IPV6_ADDR));
    let internet = if result.internet { "reachable".green() } else { "unreachable".red() };
    aligned_line("Internet", internet);
    if let Some(stats) = result.stats {
        aligned_line("Capture", stats.to_string());
    }
    aligned_line(
        "Injected",
        format!(
            "{}/{} static, {} live, {} failed",
            result.injector.static_sent, result.injector.static_total, result.injector.live_sent, result.injector.send_failures
        ),
    );

    if result.nodes.is_empty() {
        no_results();
        return;
    }
    print("");
    for (idx, node) in result.nodes.iter().enumerate() {
        node_tree(idx, node, vendors);
        if idx + 1 != result.nodes.len() {
            print("");
        }
    }
}

pub fn summary(results: &[SessionResult], seconds: f64) {
    let nodes: usize = results.iter().map(|r| r.nodes.len()).sum();
    let routers: usize = results.iter().map(|r| r.routers().count()).sum();
    let output = format!(
        "Discovery Complete: {} nodes, {} routers on {} interface(s) in {}",
        nodes.to_string().bold().green(),
        routers.to_string().bold().yellow(),
        results.len(),
        format!("{seconds:.2}s").bold().yellow()
    );
    fat_separator();
    centerln(&output);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
