//! hostprobe - host system inventory and CPU/GPU saturation benchmarks
//!
//! The library behind the `hostprobe` binary: snapshot collection over an
//! injected metrics provider, the CPU and GPU benchmarks, the settings file
//! and JSON/console reports.

pub mod error;
pub mod gpu;
pub mod logging;
pub mod report;
pub mod settings;
pub mod system;
pub mod version;

pub use error::{Error, ErrorCode, ProbeError, Result};
