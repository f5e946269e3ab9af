//! Arturo - Arduino build front-end core
//!
//! This library locates installed Arduino15 hardware packages, models their
//! platforms, boards and toolchains, expands the vendor key/value macro
//! language used by `boards.txt` and `platform.txt`, and resolves the
//! libraries a sketch depends on.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Hardware model, key/value engine, library resolution
//! - [`infra`] - Search path, directory scanning and filesystem helpers
//! - [`config`] - Constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
