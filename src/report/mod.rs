//! Report output
//!
//! JSON files for snapshots and benchmark results, and the plain-text
//! renderings printed by the CLI.

pub mod console;
mod json;

pub use json::*;
