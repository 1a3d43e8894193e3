pub mod classify;
pub mod discover;
pub mod interfaces;

use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sixscout_common::config::{Config, InterfaceFilter};

#[derive(Parser)]
#[command(name = "sixscout")]
#[command(about = "Active IPv6 network discovery.")]
#[command(version)]
pub struct CommandLine {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every IPv6-capable interface and report the nodes found
    #[command(alias = "d")]
    Discover(DiscoverArgs),
    /// Print the scope of one or more IPv6 addresses
    #[command(alias = "c")]
    Classify {
        #[arg(required = true)]
        addresses: Vec<Ipv6Addr>,
    },
    /// List interfaces that carry an IPv6 address
    #[command(alias = "i")]
    Interfaces,
}

#[derive(Args)]
pub struct DiscoverArgs {
    /// Seconds spent on each interface
    #[arg(short, long, default_value_t = 90)]
    pub duration: u64,

    /// Comma separated interface names, or "all"
    #[arg(short, long, default_value = "all")]
    pub interfaces: String,

    /// Root of the packet template store
    #[arg(short, long, default_value = "pcap")]
    pub template_dir: PathBuf,

    /// Pause before each injected frame, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub delay: u64,

    /// Strategy ids to run (comma separated). Runs all when omitted.
    #[arg(short, long, value_delimiter = ',')]
    pub plugins: Vec<String>,

    /// Skip the AAAA and IPv6 reachability pre-check
    #[arg(long)]
    pub skip_readiness: bool,
}

impl DiscoverArgs {
    pub fn into_config(self) -> Config {
        Config {
            duration_secs: self.duration,
            interfaces: InterfaceFilter::parse(&self.interfaces),
            template_dir: self.template_dir,
            injection_delay: Duration::from_millis(self.delay),
            skip_readiness: self.skip_readiness,
            plugins: self.plugins,
            ..Config::default()
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
