//! GPU vendor handling and the stress runner
//!
//! Provides:
//! - GPU vendor identification and the configured vendor preference
//! - Device selection across an accelerator runtime's devices
//! - The matrix-multiplication stress run

mod stress;

pub use stress::*;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// GPU Vendor Identification
// ─────────────────────────────────────────────────────────────────

/// Known GPU vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    Amd,
    Nvidia,
    Intel,
    Apple,
}

impl GpuVendor {
    /// Get the human-readable vendor name
    pub fn name(&self) -> &'static str {
        match self {
            GpuVendor::Amd => "AMD",
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Intel => "Intel",
            GpuVendor::Apple => "Apple",
        }
    }

    /// Priority score for automatic selection (higher = preferred)
    pub fn priority(&self) -> u32 {
        match self {
            GpuVendor::Nvidia => 100,
            GpuVendor::Amd => 90,
            GpuVendor::Apple => 80,
            GpuVendor::Intel => 50,
        }
    }
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────
// Vendor Preference
// ─────────────────────────────────────────────────────────────────

/// The `gpu.vendor` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorPreference {
    /// Pick the best device of any vendor
    Auto,
    /// Only use devices of this vendor
    Only(GpuVendor),
    /// Never use an accelerator
    Disabled,
}

impl VendorPreference {
    /// Parse a setting value, case-insensitive
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(VendorPreference::Auto),
            "nvidia" => Ok(VendorPreference::Only(GpuVendor::Nvidia)),
            "amd" => Ok(VendorPreference::Only(GpuVendor::Amd)),
            "intel" => Ok(VendorPreference::Only(GpuVendor::Intel)),
            "apple" => Ok(VendorPreference::Only(GpuVendor::Apple)),
            "none" => Ok(VendorPreference::Disabled),
            other => Err(Error::settings_invalid(
                "gpu.vendor",
                format!("'{}' is not one of auto, nvidia, amd, intel, apple, none", other),
            )),
        }
    }
}

impl FromStr for VendorPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ─────────────────────────────────────────────────────────────────
// Device Selection
// ─────────────────────────────────────────────────────────────────

/// A device an accelerator runtime can open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Runtime-assigned index
    pub id: u32,
    pub name: String,
    pub vendor: GpuVendor,
    /// Dedicated memory in MB, 0 if unknown
    pub total_memory_mb: u64,
}

/// Select a device according to the vendor preference
pub fn select_device(devices: &[DeviceInfo], preference: VendorPreference) -> Option<&DeviceInfo> {
    match preference {
        VendorPreference::Disabled => None,
        VendorPreference::Only(vendor) => devices
            .iter()
            .filter(|d| d.vendor == vendor)
            .max_by_key(|d| d.total_memory_mb),
        VendorPreference::Auto => devices
            .iter()
            .max_by_key(|d| (d.vendor.priority(), d.total_memory_mb)),
    }
}
