//! Library commands
//!
//! - `ano list-libraries` lists system, platform and project libraries
//! - `ano source-libs` lists the libraries a project's sources need
//! - `ano lib-headers` lists the include folders a library needs

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{CommandContext, TargetArgs};
use crate::cli::output::print_json;
use crate::core::library::{LibraryCollection, LibrarySummary};

#[derive(Debug, Serialize)]
struct LibraryListing {
    system: Vec<LibrarySummary>,
    platform: Vec<LibrarySummary>,
    project: Vec<LibrarySummary>,
}

/// Execute the list-libraries command
///
/// Platform libraries are listed only when the target platform is installed.
pub fn execute_list(context: &CommandContext, target: &TargetArgs) -> Result<()> {
    let env = &context.env;
    let system = env.libraries()?;
    let project = context.project.libraries(env)?;

    let package_name = target.package_name(env)?;
    let platform_name = target.platform_name(env)?;
    let platform = match env
        .package(&package_name)
        .and_then(|package| Ok(package.platform(&platform_name)?))
    {
        Ok(platform) => Some(platform.libraries()?),
        Err(e) => {
            tracing::info!("No platform libraries for {}/{}: {}", package_name, platform_name, e);
            None
        }
    };

    if context.json {
        return print_json(&LibraryListing {
            system: system.summaries(),
            platform: platform.map(LibraryCollection::summaries).unwrap_or_default(),
            project: project.summaries(),
        });
    }

    println!("System Libraries");
    print_collection(system);
    if let Some(platform) = platform {
        println!("Platform Libraries");
        print_collection(platform);
    }
    println!("Project Libraries");
    print_collection(project);
    Ok(())
}

fn print_collection(libraries: &LibraryCollection) {
    for name in libraries.names() {
        for library in libraries.versions(name) {
            match (library.platform(), library.path()) {
                (Some(platform), _) => println!("  {} -> {}", library.key(), platform),
                (None, Some(path)) => println!("  {} -> {}", library.key(), path.display()),
                (None, None) => println!("  {}", library.key()),
            }
        }
    }
}

/// Execute the source-libs command
pub fn execute_source_libs(context: &CommandContext, target: &TargetArgs, header_only: bool) -> Result<()> {
    let config = context.configuration(target)?;
    let mut resolver = config.library_resolver()?;
    if header_only {
        resolver = resolver.include_header_only();
    }
    let libraries = resolver.libs_for_files(&config.project_files()?)?;

    if context.json {
        let keys: Vec<&str> = libraries.keys().collect();
        return print_json(&keys);
    }
    for key in libraries.keys() {
        println!("{key}");
    }
    Ok(())
}

/// Execute the lib-headers command
///
/// Prints the folders holding headers of the library, of every library it
/// depends on, and of the board's core and variant.
pub fn execute_lib_headers(context: &CommandContext, target: &TargetArgs, library: &str) -> Result<()> {
    let config = context.configuration(target)?;
    let search = context.env.search_path();
    let library = config
        .libraries()?
        .find(library)
        .with_context(|| format!("No library named {library} was found."))?;

    let dependencies = config
        .library_resolver()?
        .include_header_only()
        .libs_for_library(library)?;

    let mut headers: Vec<PathBuf> = library.headers(search)?.to_vec();
    for dependency in dependencies.values() {
        headers.extend_from_slice(dependency.headers(search)?);
    }
    let platform = config.platform()?;
    let board = config.board()?;
    headers.extend_from_slice(platform.core_for(board)?.headers(search)?);
    if let Some(variant) = platform.variant_for(board)? {
        headers.extend_from_slice(variant.headers(search)?);
    }

    let folders = distinct_parents(&headers);
    if context.json {
        return print_json(&folders);
    }
    for folder in &folders {
        println!("{}", folder.display());
    }
    Ok(())
}

/// Parent folders of `files`, first-seen order
fn distinct_parents(files: &[PathBuf]) -> Vec<&Path> {
    let mut seen = HashSet::new();
    files
        .iter()
        .filter_map(|file| file.parent())
        .filter(|folder| seen.insert(*folder))
        .collect()
}
