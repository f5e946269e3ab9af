//! `ano list-tools`
//!
//! Lists every toolchain each package declares and whether a build for
//! this machine is installed or only downloadable.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::CommandContext;
use crate::cli::output::{print_empty, print_json};
use crate::core::toolchain::HostInfo;

#[derive(Debug, Serialize)]
struct ToolEntry {
    package: String,
    name: String,
    version: String,
    host: Option<String>,
    url: Option<String>,
    installed_at: Option<PathBuf>,
}

/// Execute the list-tools command
pub fn execute_list(context: &CommandContext, package_filter: Option<&str>) -> Result<()> {
    let search = context.env.search_path();
    let current_host = HostInfo::current();
    let mut entries = Vec::new();

    for (package_name, package) in context.env.packages()?.iter() {
        if package_filter.is_some_and(|filter| filter != package_name) {
            continue;
        }
        if !context.json {
            println!("{package_name}");
        }
        for versions in package.toolchains().values() {
            for toolchain in versions {
                let host = toolchain.host_toolchain();
                let installed_at = host.and_then(|host| host.path(search));

                if !context.json {
                    println!(
                        "  {} from {}, version {}.",
                        toolchain.name(),
                        package_name,
                        toolchain.version()
                    );
                    match (host, &installed_at) {
                        (Some(host), Some(path)) => {
                            println!("    {} tools are installed under {}", host.host(), path.display());
                        }
                        (Some(host), None) => {
                            println!("    {} tools are available from {}.", host.host(), host.url());
                        }
                        (None, _) => println!("    No known tools for host {current_host}."),
                    }
                }

                entries.push(ToolEntry {
                    package: package_name.to_string(),
                    name: toolchain.name().to_string(),
                    version: toolchain.version().to_string(),
                    host: host.map(|host| host.host().to_string()),
                    url: host.map(|host| host.url().to_string()),
                    installed_at,
                });
            }
        }
    }

    if context.json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        print_empty("tools");
    }
    Ok(())
}
