use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use webcam_lib::config::DEFAULT_CONFIG_FILE;
use webcam_lib::retention::parse_month_filter;
use webcam_lib::view::ViewKey;
use webcam_lib::SizeVariant;

/// Daylight-aware browser for a date-organized webcam archive.
#[derive(Parser, Debug)]
#[command(
    name = "webcam-archive",
    version,
    about = "Daylight-aware navigation over a webcam photo archive"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override the archive root from the configuration.
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the most recent image.
    Latest {
        #[arg(short, long, value_enum, default_value_t = SizeArg::Full)]
        size: SizeArg,
    },
    /// Print the daylight window for a date (YYYY-MM-DD).
    Window { date: NaiveDate },
    /// List the images and links of a view.
    View {
        /// YYYYMMDDHHMMSS, YYYY-MM-DD, YYYY-MM or YYYY
        key: ViewKey,
        #[arg(short, long, value_enum, default_value_t = SizeArg::Full)]
        size: SizeArg,
    },
    /// Print previous/next/up/down links of a view.
    Links { key: ViewKey },
    /// Strip capture prefixes from files in today's directory.
    Rename,
    /// Plan (and optionally apply) deletion of images that are never shown.
    Prune(PruneArgs),
    /// Print the effective configuration as TOML.
    ShowConfig,
}

/// Arguments for the `prune` subcommand.
#[derive(clap::Args, Debug)]
pub struct PruneArgs {
    /// Actually delete files (default is a dry run).
    #[arg(long)]
    pub apply: bool,

    /// Only process this month (YYYY/MM), regardless of age.
    #[arg(long, value_parser = parse_month_filter)]
    pub month: Option<(i32, u32)>,

    /// Only process years at least this old.
    #[arg(long, default_value_t = 5)]
    pub min_age_years: i32,

    /// Keep only the image closest to each whole hour.
    #[arg(long)]
    pub one_per_hour: bool,
}

/// Preferred image size on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeArg {
    Full,
    Mini,
}

impl From<SizeArg> for SizeVariant {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::Full => SizeVariant::Full,
            SizeArg::Mini => SizeVariant::Mini,
        }
    }
}
