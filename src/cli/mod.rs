//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use commands::{CommandContext, Commands};

/// ano - Arduino build front-end
///
/// Query installed Arduino hardware packages, boards, toolchains and
/// libraries, and resolve the libraries a sketch needs.
#[derive(Parser, Debug)]
#[command(name = "ano")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Extra search root, searched before configured roots (repeatable)
    #[arg(short = 'I', long = "search-path", global = true, value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// Project folder (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR", env = "ARTURO_PROJECT")]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            return Ok(());
        };

        let project_dir = match self.project {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let context = CommandContext::load(self.search_paths, project_dir, self.json)?;
        command.run(&context)
    }

    /// Tracing directive for the requested verbosity
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }
}
