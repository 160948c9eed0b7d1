//! pkgdb - installed-package database tools
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use pkgdb::cli::{Cli, Commands};
use pkgdb::config::{Config, ConfigManager};
use pkgdb::error::PkgDbResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let level = match verbose {
        0 if config.general.verbose => "info",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::new(format!("pkgdb={level}"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run() -> PkgDbResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load()?;

    init_logging(cli.verbose, &config);

    if let Some(dir) = cli.db_dir {
        debug!("Package database overridden: {}", dir.display());
        config.db.dir = dir;
    }

    match cli.command {
        Commands::Cache(args) => pkgdb::cli::commands::cache(args, &config),
        Commands::Config(args) => pkgdb::cli::commands::config(args, &config, &config_manager),
    }
}
