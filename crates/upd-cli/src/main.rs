//! upd - Upgrade package.json dependencies in place.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use upd_cli::cli::{self, Cli};
use upd_cli::logging;
use upd_cli::proxy::SystemProxy;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "ERROR:".red(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::init(cli.verbose);

    if cli.version {
        cli::write_version(&mut std::io::stderr())?;
        return Ok(());
    }

    // Per-package errors are part of the report, not the exit status
    cli::run_upgrade(&cli.run_options(), &SystemProxy).await?;
    Ok(())
}
