//! ano - Arduino build front-end
//!
//! Entry point for the ano command-line application.

use anyhow::Result;
use clap::Parser;

use arturo::cli::output::display_error;
use arturo::cli::Cli;
use arturo::config::defaults::{APP_NAME, BUILD_TARGET, GIT_SHA, VERSION};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .init();

    tracing::debug!("{} {} ({}, {})", APP_NAME, VERSION, GIT_SHA, BUILD_TARGET);

    match cli.run() {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
