#![deny(clippy::all, clippy::pedantic)]
//! # CartPole++ Runtime
//!
//! Entry point for the `cartpolepp` binary.
//!
//! Runs one or more episodes of the CartPole++ environment with a chosen
//! policy. Logs go to stderr (filtered by `RUST_LOG`, `info` when unset);
//! with `--dump-states` every observed state is written to stdout as one
//! feature-vector JSON line, so the output can be piped straight into a
//! later `--start`.

mod app;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    app::run(&app::Cli::parse())
}
