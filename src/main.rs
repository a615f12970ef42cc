//! # Webcam Archive Entry Point
//!
//! Command-line front end for the archive library. Every subcommand loads
//! the configuration, opens the archive as of the current site-local time
//! and prints its answer as JSON on stdout for an external renderer.

mod cli;
mod logging;

#[cfg(test)]
mod tests;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use webcam_lib::archive::Archive;
use webcam_lib::config::Config;
use webcam_lib::retention::{apply_plan, plan_retention, RetentionOptions, RetentionPlan};

use crate::cli::{Cli, Command, PruneArgs};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Window { date } => {
            print_json(&Archive::open_now(config).daylight_window(date))
        }
        Command::Latest { size } => {
            let archive = Archive::open_now(config);
            archive.run_maintenance();
            let contents = archive
                .latest()
                .map(|view| archive.view(&view, size.into()));
            if contents.is_none() {
                info!("no images today, this month or this year");
            }
            print_json(&contents)
        }
        Command::View { key, size } => {
            let archive = Archive::open_now(config);
            archive.run_maintenance();
            print_json(&archive.view(&key, size.into()))
        }
        Command::Links { key } => print_json(&Archive::open_now(config).links(&key)),
        Command::Rename => {
            let renamed = Archive::open_now(config).run_maintenance();
            print_json(&serde_json::json!({ "renamed": renamed }))
        }
        Command::Prune(args) => prune(config, args),
    }
}

/// Load the configuration and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_from_path(&cli.config);
    if let Some(root) = &cli.root {
        config.site.archive_root = root.clone();
    }
    if !matches!(cli.command, Command::ShowConfig) && !config.site.archive_root.is_dir() {
        anyhow::bail!(
            "archive root {} is not a directory",
            config.site.archive_root.display()
        );
    }
    Ok(config)
}

#[derive(Serialize)]
struct PruneReport {
    applied: bool,
    removed: usize,
    #[serde(flatten)]
    plan: RetentionPlan,
}

fn prune(config: Config, args: PruneArgs) -> Result<()> {
    let options = RetentionOptions {
        min_age_years: args.min_age_years,
        month: args.month,
        one_per_hour: args.one_per_hour,
    };
    let archive = Archive::open_now(config);
    let plan = plan_retention(&archive, &options);

    let removed = if args.apply {
        apply_plan(archive.index().root(), &plan).context("pruning archive")?
    } else {
        0
    };
    print_json(&PruneReport {
        applied: args.apply,
        removed,
        plan,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}
