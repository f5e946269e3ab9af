//! Core business logic module
//!
//! # Submodules
//!
//! - [`properties`] - Ordered maps and named property records
//! - [`keyvalue`] - `boards.txt`/`platform.txt` parser and macro expansion
//! - [`resolver`] - Macro resolvers and the resolver chain
//! - [`index`] - Package and library index documents
//! - [`package`] - Vendor packages
//! - [`platform`] - Platforms, cores and variants
//! - [`board`] - Boards and build info expansion
//! - [`toolchain`] - Toolchains and host selection
//! - [`library`] - Libraries and library discovery
//! - [`dependencies`] - `#include` scanning and library closure
//! - [`environment`] - The installed environment
//! - [`project`] - Projects, configurations and build manifests
//! - [`preferences`] - User preferences file
//! - [`global_config`] - Global configuration management
//! - [`version`] - Loose version comparison

pub mod board;
pub mod dependencies;
pub mod environment;
pub mod global_config;
pub mod index;
pub mod keyvalue;
pub mod library;
pub mod package;
pub mod platform;
pub mod preferences;
pub mod project;
pub mod properties;
pub mod resolver;
pub mod toolchain;
pub mod version;
