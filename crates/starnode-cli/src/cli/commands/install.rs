//! `starnode install`: fetch, verify and install the stack, then configure services.

use anyhow::{Context, Result};
use starnode_core::config::StarnodeConfig;
use starnode_core::fetch::ResilientFetcher;
use starnode_core::install::{InstallReport, Installer};
use starnode_core::service::CommandServiceManager;

pub fn run_install(cfg: &StarnodeConfig, reuse: bool, skip_services: bool) -> Result<()> {
    let platform = cfg.platform()?;
    let mirrors = cfg.mirror_list();
    let layout = cfg.layout();
    let fetcher = ResilientFetcher::with_curl(cfg.curl_options(), cfg.retry_policy()?);
    let installer = Installer::new(&fetcher, &mirrors, &layout, platform.clone())
        .reuse_verified(reuse && cfg.reuse_verified_downloads);
    let artifacts = cfg.artifacts();

    tracing::info!(%platform, mirrors = mirrors.len(), "install starting");
    let report = if skip_services {
        installer.install_artifacts(&artifacts)
    } else {
        let manager = CommandServiceManager::new(cfg.service_backend());
        installer.run(&artifacts, &cfg.stack_options(), &manager)
    }
    .context("install aborted; files placed by this run were rolled back")?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &InstallReport) {
    println!("{:<14} {:<10} {:<8} {}", "ARTIFACT", "VERSION", "SOURCE", "BINARIES");
    for a in &report.artifacts {
        let bins: Vec<String> = a.binaries.iter().map(|p| p.display().to_string()).collect();
        println!(
            "{:<14} {:<10} {:<8} {}",
            a.name,
            a.version,
            if a.reused { "cached" } else { "fetched" },
            bins.join(" ")
        );
    }
    if !report.services.is_empty() {
        println!("started: {}", report.services.join(", "));
    }
}
