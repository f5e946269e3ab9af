//! CLI command implementations
//!
//! Each command is implemented in its own submodule. Commands receive a
//! [`CommandContext`] holding the environment and project they work on.

pub mod boards;
pub mod libraries;
pub mod platform_data;
pub mod tools;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::core::environment::Environment;
use crate::core::global_config::GlobalConfig;
use crate::core::project::{Configuration, Project};
use crate::error::{ArturoError, SearchPathError};
use crate::infra::dirs::ArturoDirs;

/// Preference keys naming the default build target
const PREF_PACKAGE: &str = "target_package";
const PREF_PLATFORM: &str = "target_platform";
const PREF_BOARD: &str = "board";

const DEFAULT_PACKAGE: &str = "arduino";
const DEFAULT_PLATFORM: &str = "avr";

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all known board types defined in the environment
    ListBoards {
        /// Only boards of this package
        #[arg(long)]
        package: Option<String>,
    },

    /// List all known tools available in the environment
    ListTools {
        /// Only tools of this package
        #[arg(long)]
        package: Option<String>,
    },

    /// List system, platform and project libraries
    ListLibraries {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show the expanded build data of a board
    PlatformData {
        #[command(flatten)]
        target: TargetArgs,

        /// Only keys matching this regular expression
        #[arg(long)]
        filter: Option<String>,

        /// Remove macros that cannot be resolved instead of keeping them
        #[arg(long)]
        elide: bool,
    },

    /// List the libraries a project's sources need, transitively
    SourceLibs {
        #[command(flatten)]
        target: TargetArgs,

        /// Also list libraries without sources
        #[arg(long)]
        header_only: bool,
    },

    /// List the header folders a library and its dependencies need
    LibHeaders {
        #[command(flatten)]
        target: TargetArgs,

        /// Library as `name` or `name-version`
        #[arg(short, long)]
        library: String,
    },

    /// Print the resolved build manifest of a project as JSON
    Manifest {
        #[command(flatten)]
        target: TargetArgs,

        /// Remove macros that cannot be resolved instead of keeping them
        #[arg(long)]
        elide: bool,
    },
}

/// Package, platform and board selection
///
/// Missing values come from the preferences file, then from defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Hardware package (default: preference `target_package`, then `arduino`)
    #[arg(long)]
    pub package: Option<String>,

    /// Platform architecture (default: preference `target_platform`, then `avr`)
    #[arg(long)]
    pub platform: Option<String>,

    /// Board name (default: preference `board`)
    #[arg(long)]
    pub board: Option<String>,

    /// Source folder relative to the project
    #[arg(long, default_value = ".")]
    pub source_root: PathBuf,
}

impl TargetArgs {
    pub fn package_name(&self, env: &Environment) -> Result<String> {
        Ok(match &self.package {
            Some(package) => package.clone(),
            None => preference(env, PREF_PACKAGE)?.unwrap_or_else(|| DEFAULT_PACKAGE.to_string()),
        })
    }

    pub fn platform_name(&self, env: &Environment) -> Result<String> {
        Ok(match &self.platform {
            Some(platform) => platform.clone(),
            None => {
                preference(env, PREF_PLATFORM)?.unwrap_or_else(|| DEFAULT_PLATFORM.to_string())
            }
        })
    }

    pub fn board_name(&self, env: &Environment) -> Result<String> {
        match &self.board {
            Some(board) => Ok(board.clone()),
            None => preference(env, PREF_BOARD)?
                .context("No board selected. Pass --board or set 'board' in the preferences file."),
        }
    }
}

/// A preference, treating an absent preferences file as unset
fn preference(env: &Environment, key: &str) -> Result<Option<String>> {
    match env.preferences().get(key, None) {
        Ok(value) => Ok(value),
        Err(ArturoError::SearchPath(SearchPathError::MissingRequiredFile { .. })) => {
            tracing::debug!("No preferences file, '{}' is unset", key);
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to read preferences"),
    }
}

/// Environment and project shared by every command
pub struct CommandContext {
    pub env: Environment,
    pub project: Project,
    pub json: bool,
}

impl CommandContext {
    /// Load the global configuration and build the environment
    ///
    /// `extra_roots` are searched before every configured root.
    pub fn load(extra_roots: Vec<PathBuf>, project_dir: PathBuf, json: bool) -> Result<Self> {
        let dirs = ArturoDirs::new();
        let mut config = GlobalConfig::load(&dirs)?;
        config.search.paths = extra_roots
            .into_iter()
            .chain(std::mem::take(&mut config.search.paths))
            .collect();

        Ok(Self {
            env: Environment::from_config(&config, &dirs),
            project: Project::infer(&project_dir),
            json,
        })
    }

    /// The project targeted at the selected board
    pub fn configuration(&self, target: &TargetArgs) -> Result<Configuration<'_>> {
        Ok(Configuration::new(
            &self.env,
            &self.project,
            target.package_name(&self.env)?,
            target.platform_name(&self.env)?,
            target.board_name(&self.env)?,
            &target.source_root,
        ))
    }
}

impl Commands {
    /// Execute the command
    pub fn run(self, context: &CommandContext) -> Result<()> {
        match self {
            Self::ListBoards { package } => boards::execute_list(context, package.as_deref()),
            Self::ListTools { package } => tools::execute_list(context, package.as_deref()),
            Self::ListLibraries { target } => libraries::execute_list(context, &target),
            Self::PlatformData {
                target,
                filter,
                elide,
            } => platform_data::execute(context, &target, filter.as_deref(), elide),
            Self::SourceLibs {
                target,
                header_only,
            } => libraries::execute_source_libs(context, &target, header_only),
            Self::LibHeaders { target, library } => {
                libraries::execute_lib_headers(context, &target, &library)
            }
            Self::Manifest { target, elide } => {
                platform_data::execute_manifest(context, &target, elide)
            }
        }
    }
}
