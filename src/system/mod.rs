//! Host metrics and CPU benchmarking
//!
//! Provides:
//! - Snapshot record types
//! - The metrics provider seam and its sysinfo implementation
//! - Snapshot collection with per-item skip tracking
//! - The CPU saturation benchmark

mod benchmark;
mod collector;
mod provider;
mod snapshot;

pub use benchmark::*;
pub use collector::*;
pub use provider::*;
pub use snapshot::*;
