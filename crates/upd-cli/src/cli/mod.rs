//! Command-line arguments and the commands they drive.

pub mod upgrade;

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use upd_deps::DEFAULT_CONCURRENCY;
use upd_info::DEFAULT_TIMEOUT;

pub use upgrade::{run_upgrade, UpgradeRunOptions};

#[derive(Parser, Debug)]
#[command(name = "upd")]
#[command(about = "Upgrade package.json dependencies while keeping the file's formatting", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Package name patterns selecting what to upgrade
    ///
    /// Glob patterns; a leading `!` excludes matching names. The patterns
    /// of the manifest's own "upd" field are applied first.
    ///
    /// Examples:
    ///   upd                        # Upgrade everything
    ///   upd 'react*'               # Only react and its companions
    ///   upd '!@types/*'            # Everything but type packages
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Package configuration to use
    #[arg(short, long, value_name = "FILE", default_value = "package.json")]
    pub file: PathBuf,

    /// Number of concurrent connections to the npm registry
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// No operation: report upgrades but do not modify the package configuration
    #[arg(short = 'n', long)]
    pub nop: bool,

    /// Use the greatest published version instead of the latest stable one
    #[arg(short, long)]
    pub greatest: bool,

    /// Show all packages instead of just updated ones
    #[arg(short, long)]
    pub all: bool,

    /// Quiet operation: do not output upgrade information
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not use any colors in output
    #[arg(short = 'C', long)]
    pub no_color: bool,

    /// Registry URL overriding the .npmrc configuration
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Maximum registry requests per second
    #[arg(long, value_name = "RPS")]
    pub rate_limit: Option<u32>,

    /// Verbose logging (-v for info, -vv for debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show program version information
    #[arg(short = 'V', long)]
    pub version: bool,
}

impl Cli {
    /// Options for [`run_upgrade`]
    pub fn run_options(&self) -> UpgradeRunOptions {
        UpgradeRunOptions {
            file: self.file.clone(),
            patterns: self.patterns.clone(),
            concurrency: self.concurrency,
            dry_run: self.nop,
            greatest: self.greatest,
            all: self.all,
            quiet: self.quiet,
            no_color: self.no_color,
            registry: self.registry.clone(),
            timeout: Duration::from_secs(self.timeout),
            rate_limit: self.rate_limit,
        }
    }
}

/// Write the `-V` banner: name, version, homepage, description, license
pub fn write_version<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        "upd {} <{}>",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_HOMEPAGE")
    )?;
    writeln!(writer, "{}", env!("CARGO_PKG_DESCRIPTION"))?;
    writeln!(
        writer,
        "Licensed under {} <http://spdx.org/licenses/{}.html>",
        env!("CARGO_PKG_LICENSE"),
        env!("CARGO_PKG_LICENSE")
    )
}
