//! `ano list-boards`
//!
//! Lists every installed platform of every package with the boards it
//! defines and the toolchains it depends on.

use anyhow::Result;
use serde::Serialize;

use super::CommandContext;
use crate::cli::output::{print_empty, print_json};

#[derive(Debug, Serialize)]
struct BoardEntry {
    package: String,
    platform: String,
    architecture: String,
    board: String,
    name: String,
}

/// Execute the list-boards command
pub fn execute_list(context: &CommandContext, package_filter: Option<&str>) -> Result<()> {
    let packages = context.env.packages()?;
    let mut entries = Vec::new();

    for (package_name, package) in packages.iter() {
        if package_filter.is_some_and(|filter| filter != package_name) {
            continue;
        }
        if !context.json {
            println!("{package_name}");
        }
        for platform in package.platforms().values() {
            let boards = platform.boards()?;
            if !context.json {
                println!("  {}", platform.name());
                println!("    Tools");
                for toolchain in platform.toolchains(packages)? {
                    println!(
                        "      {} from {}, version {}.",
                        toolchain.name(),
                        toolchain.packager(),
                        toolchain.version()
                    );
                }
                println!("    Boards");
            }
            for (board_name, board) in boards.iter() {
                if !context.json {
                    println!("      {board_name} ({})", board.display_name());
                }
                entries.push(BoardEntry {
                    package: package_name.to_string(),
                    platform: platform.name().to_string(),
                    architecture: platform.architecture().to_string(),
                    board: board_name.to_string(),
                    name: board.display_name().to_string(),
                });
            }
        }
    }

    if context.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        print_empty("boards");
    }
    Ok(())
}
