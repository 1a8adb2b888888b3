//! CLI entry point for the multi-variant image container tool

use charpack::io::cli::{Cli, CommandRunner};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> charpack::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    CommandRunner::new(cli).run()
}
