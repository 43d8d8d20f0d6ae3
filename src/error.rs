//! Error types for hostprobe
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Per-item collection failures (a disk that cannot be read, a process that
//! exited mid-enumeration) are not errors here: they are [`ProbeError`]s,
//! recovered inside the collector and recorded as skipped items.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hostprobe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Settings errors (1xx)
    SettingsParse = 100,
    SettingsValidation = 101,
    SettingsUnknownKey = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,
    JsonFormat = 210,

    // Benchmark errors (5xx)
    WorkerFailure = 500,
    InvalidInput = 501,

    // Device errors (8xx)
    DeviceUnavailable = 810,
    DeviceFailure = 811,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Settings errors
            200..=299 => 20, // IO errors
            500..=599 => 50, // Benchmark errors
            800..=899 => 80, // Device errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Settings Errors
    // ─────────────────────────────────────────────────────────────

    /// Settings file could not be parsed
    #[error("Failed to parse settings file {path}: {message}")]
    SettingsParse { path: PathBuf, message: String },

    /// Settings value out of range
    #[error("Invalid setting {key}: {message}")]
    SettingsValidation { key: String, message: String },

    /// Dotted key not owned by any accessor
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Benchmark Errors
    // ─────────────────────────────────────────────────────────────

    /// A benchmark worker failed; the whole run is aborted
    #[error("Benchmark worker {worker} failed: {message}")]
    WorkerFailure { worker: usize, message: String },

    /// Caller supplied an unusable parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ─────────────────────────────────────────────────────────────
    // Device Errors
    // ─────────────────────────────────────────────────────────────

    /// No accelerator device present
    #[error("No accelerator available: {message}")]
    DeviceUnavailable { message: String },

    /// Accelerator failed during a run
    #[error("Accelerator {device} failed: {message}")]
    DeviceFailure { device: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::SettingsParse { .. } => ErrorCode::SettingsParse,
            Error::SettingsValidation { .. } => ErrorCode::SettingsValidation,
            Error::UnknownSetting(_) => ErrorCode::SettingsUnknownKey,

            Error::IoRead { source, .. } | Error::IoWrite { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ErrorCode::IoPermission
            }
            Error::IoRead { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::IoNotFound
            }
            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Json(_) => ErrorCode::JsonFormat,
            Error::Toml(_) => ErrorCode::SettingsParse,

            Error::WorkerFailure { .. } => ErrorCode::WorkerFailure,
            Error::InvalidInput(_) => ErrorCode::InvalidInput,

            Error::DeviceUnavailable { .. } => ErrorCode::DeviceUnavailable,
            Error::DeviceFailure { .. } => ErrorCode::DeviceFailure,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::SettingsParse { .. } => Some(
                "Fix the settings file syntax, or run 'hostprobe config reset --force' to restore defaults.",
            ),
            Error::SettingsValidation { .. } => Some(
                "Run 'hostprobe config show' to review the current values.",
            ),
            Error::UnknownSetting(_) => Some(
                "Keys are written as section.key, e.g. benchmark.cpu_iterations.",
            ),
            Error::IoRead { .. } | Error::IoWrite { .. } => Some(
                "Check that the path exists and that you have permission to access it.",
            ),
            Error::WorkerFailure { .. } => Some(
                "The workload is deterministic; a worker failure points at the environment (memory, thread limits).",
            ),
            Error::DeviceUnavailable { .. } | Error::DeviceFailure { .. } => Some(
                "Check that the GPU driver runtime is installed, or set gpu.enable = false.",
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", self.code().as_str(), self);

        // IO errors carry the interesting part in the source
        if let Some(source) = std::error::Error::source(self) {
            output.push_str(&format!("  caused by: {}\n", source));
        }

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a settings validation error
    pub fn settings_invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SettingsValidation {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a read error for a path
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a write error for a path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::IoWrite {
            path: path.into(),
            source,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Per-item Probe Failures
// ─────────────────────────────────────────────────────────────────

/// Why a single item (partition, process, sensor bank) could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ProbeError {
    /// The caller lacks permission to read the item
    #[error("permission denied")]
    PermissionDenied,

    /// The metrics API is not implemented on this platform
    #[error("unsupported on this platform")]
    Unsupported,

    /// The item disappeared between enumeration and read
    #[error("vanished during enumeration")]
    Vanished,

    /// Anything else the OS layer reported
    #[error("{0}")]
    Other(String),
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
