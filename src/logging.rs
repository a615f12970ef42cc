//! Log setup for the binary.
//!
//! stdout carries the JSON answer for the renderer, so every log line goes
//! to stderr. The library only emits `tracing` events; this is the one place
//! a subscriber is installed.

use tracing_subscriber::EnvFilter;

/// Targets that log at the chosen level: the binary and the library.
const CRATE_TARGETS: &[&str] = &["webcam_archive", "webcam_lib"];

/// Level for a repeated `-v` count: warn, info, debug, then trace.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter applied when `RUST_LOG` is not set, e.g.
/// `webcam_archive=info,webcam_lib=info`. Other crates stay silent.
fn default_filter(verbosity: u8) -> String {
    let level = level_for(verbosity);
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
