//! Command-line parsing tests.

use clap::Parser;
use std::path::PathBuf;
use webcam_lib::view::ViewKey;
use webcam_lib::SizeVariant;

use crate::cli::{Cli, Command, SizeArg};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("webcam-archive").chain(args.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn view_accepts_every_key_form() {
    for (text, expected) in [
        ("2023", ViewKey::Year(2023)),
        ("2023-11", ViewKey::Month(2023, 11)),
        ("20231114144049", ViewKey::Single("20231114144049".parse().unwrap())),
    ] {
        match parse(&["view", text]).command {
            Command::View { key, size } => {
                assert_eq!(key, expected);
                assert_eq!(size, SizeArg::Full);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

#[test]
fn invalid_view_key_is_rejected() {
    assert!(Cli::try_parse_from(["webcam-archive", "view", "2023-13"]).is_err());
    assert!(Cli::try_parse_from(["webcam-archive", "links", "yesterday"]).is_err());
}

#[test]
fn global_flags_work_after_subcommand() {
    let cli = parse(&["latest", "--size", "mini", "-vv", "--root", "/srv/webcam"]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.root, Some(PathBuf::from("/srv/webcam")));
    assert_eq!(cli.config, PathBuf::from("webcam-config.toml"));
    match cli.command {
        Command::Latest { size } => assert_eq!(SizeVariant::from(size), SizeVariant::Mini),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn prune_defaults_to_dry_run() {
    match parse(&["prune"]).command {
        Command::Prune(args) => {
            assert!(!args.apply);
            assert_eq!(args.min_age_years, 5);
            assert_eq!(args.month, None);
            assert!(!args.one_per_hour);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn prune_month_filter() {
    match parse(&["prune", "--month", "2018/03", "--one-per-hour", "--apply"]).command {
        Command::Prune(args) => {
            assert_eq!(args.month, Some((2018, 3)));
            assert!(args.one_per_hour);
            assert!(args.apply);
        }
        other => panic!("unexpected command {other:?}"),
    }
    assert!(Cli::try_parse_from(["webcam-archive", "prune", "--month", "2018-03"]).is_err());
}

#[test]
fn window_requires_iso_date() {
    match parse(&["window", "2024-03-20"]).command {
        Command::Window { date } => assert_eq!(date.to_string(), "2024-03-20"),
        other => panic!("unexpected command {other:?}"),
    }
    assert!(Cli::try_parse_from(["webcam-archive", "window", "20240320"]).is_err());
}
