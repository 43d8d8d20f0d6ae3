//! Snapshot record types
//!
//! One [`SystemSnapshot`] is a point-in-time capture of every monitored
//! metric. Anything that could not be collected is `None` and serializes as
//! JSON `null`, so a zero reading stays distinguishable from a missing one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete host snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub system: PlatformInfo,
    pub cpu: Option<CpuInfo>,
    pub memory: Option<MemoryInfo>,
    pub disks: Option<Vec<DiskPartition>>,
    pub network: Option<NetworkInfo>,
    /// Temperature readings grouped by chip; `None` when unsupported or empty
    pub sensors: Option<BTreeMap<String, Vec<SensorReading>>>,
    pub processes: Option<ProcessSummary>,
    pub uptime_seconds: u64,
}

// ─────────────────────────────────────────────────────────────────
// Platform
// ─────────────────────────────────────────────────────────────────

/// Operating system and machine identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub arch: Option<String>,
    pub processor: Option<String>,
    pub hostname: Option<String>,
    pub boot_time: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────
// CPU
// ─────────────────────────────────────────────────────────────────

/// Core counts, frequencies (MHz) and utilization (percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub freq_min: Option<f64>,
    pub freq_max: Option<f64>,
    pub freq_current: Option<f64>,
    pub usage_per_core: Vec<f32>,
    pub usage_total: f32,
}

/// Static CPU facts reported by a provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuTopology {
    pub physical_cores: Option<usize>,
    pub freq_min: Option<f64>,
    pub freq_max: Option<f64>,
    pub freq_current: Option<f64>,
}

/// One utilization sample over a sampling window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuUsage {
    pub per_core: Vec<f32>,
    pub total: f32,
}

impl CpuInfo {
    /// Combine topology and a usage sample. The logical core count is the
    /// number of per-core readings, and percentages are clamped to 0..=100.
    pub fn from_parts(topology: CpuTopology, usage: CpuUsage) -> Self {
        let usage_per_core: Vec<f32> = usage.per_core.into_iter().map(clamp_percent).collect();
        Self {
            physical_cores: topology.physical_cores,
            logical_cores: usage_per_core.len(),
            freq_min: topology.freq_min,
            freq_max: topology.freq_max,
            freq_current: topology.freq_current,
            usage_per_core,
            usage_total: clamp_percent(usage.total),
        }
    }
}

pub(crate) fn clamp_percent(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

// ─────────────────────────────────────────────────────────────────
// Memory
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    #[serde(rename = "virtual")]
    pub virtual_memory: VirtualMemory,
    pub swap: SwapMemory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMemory {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapMemory {
    pub total: u64,
    pub used: u64,
    pub percent: f64,
}

impl MemoryInfo {
    /// Build from raw byte counts. Virtual percent is the share of memory
    /// that is not available.
    pub fn from_raw(total: u64, available: u64, used: u64, swap_total: u64, swap_used: u64) -> Self {
        Self {
            virtual_memory: VirtualMemory {
                total,
                available,
                used,
                percent: percent_of(total.saturating_sub(available), total),
            },
            swap: SwapMemory {
                total: swap_total,
                used: swap_used,
                percent: percent_of(swap_used, swap_total),
            },
        }
    }
}

/// `part / whole` as a percentage rounded to one decimal, 0 for an empty whole
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = part as f64 / whole as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

// ─────────────────────────────────────────────────────────────────
// Disks
// ─────────────────────────────────────────────────────────────────

/// A mounted partition; `usage` is `None` when the probe failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskPartition {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub usage: Option<DiskUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl DiskUsage {
    pub fn from_raw(total: u64, free: u64) -> Self {
        let used = total.saturating_sub(free);
        Self {
            total,
            used,
            free,
            percent: percent_of(used, total),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Network
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub interfaces: BTreeMap<String, Vec<InterfaceAddress>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub family: AddressFamily,
    pub address: String,
}

/// Address family, named after the socket constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    #[serde(rename = "AF_INET")]
    Inet,
    #[serde(rename = "AF_INET6")]
    Inet6,
    #[serde(rename = "AF_LINK")]
    Link,
}

impl std::fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AddressFamily::Inet => "AF_INET",
            AddressFamily::Inet6 => "AF_INET6",
            AddressFamily::Link => "AF_LINK",
        };
        write!(f, "{}", name)
    }
}

// ─────────────────────────────────────────────────────────────────
// Sensors and processes
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub label: String,
    pub current_celsius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// Every enumerated process id, including skipped ones
    pub total_count: usize,
    pub top_by_memory: Vec<ProcessEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Resident set size in bytes
    pub rss: u64,
}
