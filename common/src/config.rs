use std::path::PathBuf;
use std::time::Duration;

/// Name that disables interface filtering when present in the allow-list.
pub const ALL_INTERFACES: &str = "all";

#[derive(Debug, Clone)]
pub struct Config {
    /// How long each interface is captured, in seconds.
    pub duration_secs: u64,
    pub interfaces: InterfaceFilter,
    /// Root of the packet template store (`icmp/v4`, `icmp/v6`, `udp/v4`, `udp/v6`).
    pub template_dir: PathBuf,
    /// Pause before every transmitted frame.
    pub injection_delay: Duration,
    /// Read timeout handed to the capture handle.
    pub read_timeout: Duration,
    /// Listener back-off after an empty non-blocking read, spent outside the lock.
    pub poll_interval: Duration,
    pub snaplen: i32,
    pub promiscuous: bool,
    /// Skips the DNS/TCP readiness pre-check.
    pub skip_readiness: bool,
    /// IPv6-only names resolved by the readiness pre-check.
    pub readiness_domains: Vec<String>,
    /// Strategy ids to run. Empty runs every known strategy.
    pub plugins: Vec<String>,
}

impl Config {
    pub fn duration_millis(&self) -> u64 {
        self.duration_secs.saturating_mul(1000)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: 90,
            interfaces: InterfaceFilter::default(),
            template_dir: PathBuf::from("pcap"),
            injection_delay: Duration::from_millis(10),
            read_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(1),
            snaplen: 64 * 1024,
            promiscuous: true,
            skip_readiness: false,
            readiness_domains: vec!["ipv6.google.com".to_string()],
            plugins: Vec::new(),
        }
    }
}

/// Allow-list of interface names. Empty means every interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceFilter {
    names: Vec<String>,
}

impl InterfaceFilter {
    /// Parses a comma separated list such as `eth0,wlan0` or `all`.
    pub fn parse(list: &str) -> Self {
        let names: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if names.iter().any(|name| name.eq_ignore_ascii_case(ALL_INTERFACES)) {
            return Self::default();
        }
        Self { names }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.names.is_empty()
    }

    pub fn allows(&self, name: &str, description: &str) -> bool {
        self.is_unfiltered() || self.names.iter().any(|n| n == name || n == description)
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
