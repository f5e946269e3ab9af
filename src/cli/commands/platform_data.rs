//! `ano platform-data` and `ano manifest`
//!
//! Show the macro-expanded build info of a board, optionally filtered by a
//! key pattern, or the full build manifest of the project for that board.

use anyhow::{Context, Result};
use regex::Regex;

use super::{CommandContext, TargetArgs};
use crate::cli::output::{print_json, print_key_values};
use crate::core::properties::Properties;

/// Execute the platform-data command
pub fn execute(
    context: &CommandContext,
    target: &TargetArgs,
    filter: Option<&str>,
    elide: bool,
) -> Result<()> {
    let filter = filter
        .map(|pattern| Regex::new(pattern).with_context(|| format!("Invalid --filter '{pattern}'")))
        .transpose()?;

    let config = context.configuration(target)?;
    let board = config.board()?;
    let build_info = board.process_build_info(None, elide)?;

    let selected: Properties = build_info
        .iter()
        .filter(|(key, _)| filter.as_ref().map_or(true, |filter| filter.is_match(key)))
        .map(|(key, value)| (key, value.clone()))
        .collect();

    if context.json {
        return print_json(&selected);
    }
    println!("# {} ({})", board.display_name(), board.platform().path().display());
    print_key_values(selected.iter().map(|(key, value)| (key, value.as_str())));
    Ok(())
}

/// Execute the manifest command
pub fn execute_manifest(context: &CommandContext, target: &TargetArgs, elide: bool) -> Result<()> {
    let config = context.configuration(target)?;
    let manifest = config.build_manifest(None, elide)?;
    print_json(&manifest)
}
