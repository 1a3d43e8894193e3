use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use colored::*;
use is_root::is_root;
use sixscout_common::config::Config;
use sixscout_common::network::mac::OuiVendorRepository;
use sixscout_core::DiscoverySession;
use tracing::{info, warn};

use crate::readiness;
use crate::terminal::{print, spinner};

pub async fn discover(config: Config) -> anyhow::Result<()> {
    if !is_root() {
        bail!("discovery captures and injects raw frames, run it as root");
    }

    if !config.skip_readiness && !readiness_ok(&config).await? {
        return Ok(());
    }

    let session = Arc::new(
        DiscoverySession::from_manifest(config, Arc::new(OuiVendorRepository))
            .context("failed to build the discovery session")?,
    );
    info!("Loaded plugins: {}", session.plugins().names().join(", "));

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current interface...");
            cancel.cancel();
        }
    });

    print::header("discovering ipv6 nodes");
    spinner::report_interface("every IPv6 interface", session.config().duration_secs);

    let start_time = Instant::now();
    let worker = Arc::clone(&session);
    let duration_millis = session.config().duration_millis();
    let outcome = tokio::task::spawn_blocking(move || worker.run_discovery(duration_millis))
        .await
        .context("discovery worker stopped unexpectedly")?;
    spinner::finish();

    let results = outcome.context("network discovery failed")?;
    let vendors = session.vendors();
    for result in &results {
        print::session(result, vendors.as_ref());
    }
    print::summary(&results, start_time.elapsed().as_secs_f64());
    Ok(())
}

async fn readiness_ok(config: &Config) -> anyhow::Result<bool> {
    print::header("checking ipv6 readiness");
    let domains = config.readiness_domains.clone();
    let readiness = tokio::task::spawn_blocking(move || readiness::check(&domains))
        .await
        .context("readiness check stopped unexpectedly")?;

    let flag = |ok: bool| if ok { "yes".green() } else { "no".red() };
    print::aligned_line("AAAA lookup", flag(readiness.aaaa_resolvable));
    print::aligned_line("IPv6 route", flag(readiness.ipv6_reachable));
    print::aligned_line("Interfaces", readiness.interfaces.join(", "));

    if !readiness.has_ipv6_interface() {
        warn!("No interface with an IPv6 address is up, nothing to discover");
        return Ok(false);
    }
    Ok(true)
}
