//! Output formatting
//!
//! Helpers for printing command results as text or JSON and for reporting
//! errors with their full cause chain.

use anyhow::Result;
use serde::Serialize;

/// Status message prefixes
pub mod status {
    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}

/// Print an error and every error that caused it to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {}", status::ERROR, error);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `key=value` lines in the key/value file format
pub fn print_key_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) {
    for (key, value) in pairs {
        println!("{key}={value}");
    }
}

/// Note that a listing came back empty
pub fn print_empty(what: &str) {
    println!("{} No {what} found.", status::WARNING);
}
