//! Infrastructure layer
//!
//! Handles filesystem access: the search path, directory scans and the
//! platform directories configuration is read from.

pub mod aggregators;
pub mod dirs;
pub mod filesystem;
pub mod search_path;
