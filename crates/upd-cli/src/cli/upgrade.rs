//! The upgrade command.

use crate::display::{render_report, ProgressReporter};
use crate::proxy::ProxySource;
use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use upd_deps::{SelectionMode, UpgradeOptions, UpgradeReport, Upgrader};
use upd_fs::NativeFileSystem;
use upd_info::{HttpClientConfig, NpmConfig, RegistryClient};

/// Options for running an upgrade.
#[derive(Debug, Clone)]
pub struct UpgradeRunOptions {
    pub file: PathBuf,
    pub patterns: Vec<String>,
    pub concurrency: usize,
    pub dry_run: bool,
    pub greatest: bool,
    pub all: bool,
    pub quiet: bool,
    pub no_color: bool,
    pub registry: Option<String>,
    pub timeout: Duration,
    pub rate_limit: Option<u32>,
}

/// Runs an upgrade of the manifest named by `options.file` and prints the
/// report to stdout unless quiet.
pub async fn run_upgrade(
    options: &UpgradeRunOptions,
    proxy: &dyn ProxySource,
) -> Result<UpgradeReport> {
    let working_dir = std::env::current_dir().context("Failed to get current working directory")?;
    let manifest_path = working_dir.join(&options.file);
    let project_dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(working_dir);

    // Step 1: Registry client from .npmrc, flags, and proxy discovery
    let mut npm = NpmConfig::load(&project_dir).context("Failed to load npm configuration")?;
    if let Some(registry) = &options.registry {
        npm.set_registry(registry)
            .with_context(|| format!("Invalid registry URL \"{registry}\""))?;
    }
    let http = HttpClientConfig {
        timeout: options.timeout,
        proxy: proxy.proxy(&npm).await,
        requests_per_second: options.rate_limit,
        ..HttpClientConfig::default()
    };
    debug!(proxy = ?http.proxy, timeout = ?http.timeout, "registry client settings");
    let client =
        RegistryClient::with_config(&http, npm).context("Failed to initialize registry client")?;

    // Step 2: Upgrade the manifest
    let upgrader = Upgrader::new(
        client,
        UpgradeOptions {
            patterns: options.patterns.clone(),
            concurrency: options.concurrency,
            mode: if options.greatest {
                SelectionMode::Greatest
            } else {
                SelectionMode::Latest
            },
            dry_run: options.dry_run,
        },
    )?;
    let fs = Arc::new(
        NativeFileSystem::new(&project_dir)
            .with_context(|| format!("Cannot access directory {}", project_dir.display()))?,
    );
    let mut progress = ProgressReporter::new(!options.quiet, !options.no_color);
    let report = upgrader
        .upgrade_file(&fs, &manifest_path, &mut progress)
        .await
        .with_context(|| format!("Failed to upgrade {}", options.file.display()))?;

    // Step 3: Report
    if !options.quiet {
        let stdout = io::stdout();
        render_report(&mut stdout.lock(), &report, options.all)?;
    }

    Ok(report)
}
