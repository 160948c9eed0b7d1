//! Cache command - update, rebuild or inspect the lookup cache

use crate::cache::RebuildOutcome;
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::db::{CacheUpdate, PackageDb};
use crate::error::PkgDbResult;
use crate::manifest::PackageRecord;
use console::style;

/// Execute the cache command
pub fn execute(args: CacheArgs, config: &Config) -> PkgDbResult<()> {
    let db = PackageDb::from_config(config);

    match args.action {
        CacheAction::Update => update(&db),
        CacheAction::Rebuild => {
            let outcome = db.force_rebuild()?;
            report(&db, outcome);
            Ok(())
        }
        CacheAction::Show { format } => show(&db, format),
    }
}

fn update(db: &PackageDb) -> PkgDbResult<()> {
    match db.update_cache()? {
        CacheUpdate::NoDatabase => {
            println!("No package database at {}", db.root().display());
        }
        CacheUpdate::Fresh => {
            println!("Cache is up to date: {}", db.cache_path().display());
        }
        CacheUpdate::Rebuilt(outcome) => report(db, outcome),
    }
    Ok(())
}

fn report(db: &PackageDb, outcome: RebuildOutcome) {
    match outcome {
        RebuildOutcome::NoPackages => {
            println!(
                "{} No packages in {}, cache not written",
                style("!").yellow(),
                db.root().display()
            );
        }
        RebuildOutcome::Published(stats) => {
            println!(
                "{} Cache rebuilt: {} packages, {} entries",
                style("✓").green(),
                stats.records,
                stats.entries
            );
            if stats.skipped > 0 {
                println!(
                    "{} {} entries skipped (key too long)",
                    style("!").yellow(),
                    stats.skipped
                );
            }
        }
    }
}

fn show(db: &PackageDb, format: OutputFormat) -> PkgDbResult<()> {
    let records = db.cached_records()?;

    match format {
        OutputFormat::Table => print_table(&records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

fn print_table(records: &[PackageRecord]) {
    if records.is_empty() {
        println!("No packages in cache.");
        return;
    }

    println!("{:<30} {:<15} {:<25} {:<5}", "NAME", "VERSION", "ORIGIN", "DEPS");
    println!("{}", "-".repeat(78));

    for record in records {
        println!(
            "{:<30} {:<15} {:<25} {:<5}",
            record.name,
            record.version,
            record.origin,
            record.deps.len()
        );
    }

    println!();
    println!("Total: {} package(s)", records.len());
}
