//! Configuration and constants
//!
//! - [`defaults`] - Arduino15 layout names, extension sets and exclusions

pub mod defaults;
