//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure: fixture file paths and a
//! metrics provider with canned readings.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use hostprobe::system::{
    AddressFamily, CpuTopology, CpuUsage, DiskUsage, InterfaceAddress, MemoryInfo,
    MetricsProvider, NetworkInfo, PartitionProbe, PlatformInfo, ProcessEntry, ProcessProbe,
    SensorProbe,
};
use hostprobe::ProbeError;

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get a path to a specific fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Settings file written by hand with string values and a foreign section
pub fn legacy_settings_fixture() -> PathBuf {
    fixture_path("legacy_settings.toml")
}

// ─────────────────────────────────────────────────────────────────
// Fixture provider
// ─────────────────────────────────────────────────────────────────

/// Metrics provider with fixed readings and switchable failures
pub struct FixtureProvider {
    pub per_core_usage: Vec<f32>,
    pub memory: Result<MemoryInfo, ProbeError>,
    pub partitions: Vec<PartitionProbe>,
    pub sensors: Result<Vec<SensorProbe>, ProbeError>,
    pub processes: Vec<ProcessProbe>,
    /// Windows passed to `sample_cpu_usage`
    pub sampled_windows: Vec<Duration>,
}

impl Default for FixtureProvider {
    fn default() -> Self {
        Self {
            per_core_usage: vec![12.5, 40.0, 3.0, 97.5],
            memory: Ok(MemoryInfo::from_raw(
                16 * 1024 * 1024 * 1024,
                6 * 1024 * 1024 * 1024,
                9 * 1024 * 1024 * 1024,
                2 * 1024 * 1024 * 1024,
                512 * 1024 * 1024,
            )),
            partitions: vec![
                PartitionProbe {
                    device: "/dev/nvme0n1p2".into(),
                    mountpoint: "/".into(),
                    fstype: "ext4".into(),
                    usage: Ok(DiskUsage::from_raw(500_000_000_000, 120_000_000_000)),
                },
                PartitionProbe {
                    device: "/dev/sdb1".into(),
                    mountpoint: "/mnt/vault".into(),
                    fstype: "xfs".into(),
                    usage: Err(ProbeError::PermissionDenied),
                },
            ],
            sensors: Ok(vec![
                SensorProbe {
                    chip: "coretemp".into(),
                    label: "Package id 0".into(),
                    reading: Ok(52.0),
                },
                SensorProbe {
                    chip: "nvme".into(),
                    label: String::new(),
                    reading: Ok(38.85),
                },
            ]),
            processes: (1..=8)
                .map(|pid| process(pid, u64::from(pid) * 10 * 1024 * 1024))
                .chain(std::iter::once(ProcessProbe {
                    pid: 99,
                    entry: Err(ProbeError::Vanished),
                }))
                .collect(),
            sampled_windows: Vec::new(),
        }
    }
}

pub fn process(pid: u32, rss: u64) -> ProcessProbe {
    ProcessProbe {
        pid,
        entry: Ok(ProcessEntry {
            pid,
            name: format!("proc-{}", pid),
            rss,
        }),
    }
}

impl MetricsProvider for FixtureProvider {
    fn platform(&mut self) -> PlatformInfo {
        PlatformInfo {
            os: Some("Linux".into()),
            release: Some("6.8.0".into()),
            version: Some("Linux 24.04 Ubuntu".into()),
            arch: Some("x86_64".into()),
            processor: Some("Fixture CPU @ 3.00GHz".into()),
            hostname: Some("fixture-host".into()),
            boot_time: Utc.timestamp_opt(1_700_000_000, 0).single(),
        }
    }

    fn cpu_topology(&mut self) -> Result<CpuTopology, ProbeError> {
        Ok(CpuTopology {
            physical_cores: Some(self.per_core_usage.len() / 2),
            freq_min: Some(800.0),
            freq_max: Some(4200.0),
            freq_current: Some(3000.0),
        })
    }

    fn sample_cpu_usage(&mut self, window: Duration) -> Result<CpuUsage, ProbeError> {
        self.sampled_windows.push(window);
        let total = self.per_core_usage.iter().sum::<f32>() / self.per_core_usage.len().max(1) as f32;
        Ok(CpuUsage {
            per_core: self.per_core_usage.clone(),
            total,
        })
    }

    fn memory(&mut self) -> Result<MemoryInfo, ProbeError> {
        self.memory.clone()
    }

    fn partitions(&mut self) -> Result<Vec<PartitionProbe>, ProbeError> {
        Ok(self.partitions.clone())
    }

    fn network(&mut self) -> Result<NetworkInfo, ProbeError> {
        let mut interfaces = BTreeMap::new();
        interfaces.insert(
            "eth0".to_string(),
            vec![
                InterfaceAddress {
                    family: AddressFamily::Inet,
                    address: "192.168.1.20".into(),
                },
                InterfaceAddress {
                    family: AddressFamily::Link,
                    address: "52:54:00:12:34:56".into(),
                },
            ],
        );
        interfaces.insert(
            "lo".to_string(),
            vec![InterfaceAddress {
                family: AddressFamily::Inet,
                address: "127.0.0.1".into(),
            }],
        );

        Ok(NetworkInfo {
            bytes_sent: 1_234_567,
            bytes_received: 7_654_321,
            interfaces,
        })
    }

    fn sensors(&mut self) -> Result<Vec<SensorProbe>, ProbeError> {
        self.sensors.clone()
    }

    fn processes(&mut self) -> Result<Vec<ProcessProbe>, ProbeError> {
        Ok(self.processes.clone())
    }

    fn uptime_seconds(&mut self) -> u64 {
        93_600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_dir_exists() {
        assert!(fixtures_dir().exists(), "Fixtures directory should exist");
    }

    #[test]
    fn test_legacy_settings_exists() {
        assert!(
            legacy_settings_fixture().exists(),
            "Legacy settings fixture should exist"
        );
    }
}
