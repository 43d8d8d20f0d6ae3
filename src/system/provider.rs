//! Metrics provider seam
//!
//! [`MetricsProvider`] is the capability the collector and the CPU benchmark
//! query for raw readings. [`SysinfoProvider`] is the production
//! implementation; tests hand in fixture providers instead.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind,
    ProcessesToUpdate, RefreshKind, System,
};
use tracing::trace;

use crate::error::ProbeError;
use crate::system::snapshot::{
    AddressFamily, CpuTopology, CpuUsage, DiskUsage, InterfaceAddress, MemoryInfo, NetworkInfo,
    PlatformInfo, ProcessEntry,
};

/// A partition as enumerated, with its usage probe result
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionProbe {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub usage: Result<DiskUsage, ProbeError>,
}

/// One temperature sensor as reported by the OS
#[derive(Debug, Clone, PartialEq)]
pub struct SensorProbe {
    /// Chip or driver name the reading is grouped under
    pub chip: String,
    pub label: String,
    pub reading: Result<f32, ProbeError>,
}

/// One enumerated process id and what could be read about it
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessProbe {
    pub pid: u32,
    pub entry: Result<ProcessEntry, ProbeError>,
}

/// Raw readings for one snapshot. Each call is independent; a failing call
/// only loses its own sub-record.
pub trait MetricsProvider {
    fn platform(&mut self) -> PlatformInfo;

    fn cpu_topology(&mut self) -> Result<CpuTopology, ProbeError>;

    /// Block for `window` and report utilization over it
    fn sample_cpu_usage(&mut self, window: Duration) -> Result<CpuUsage, ProbeError>;

    fn memory(&mut self) -> Result<MemoryInfo, ProbeError>;

    fn partitions(&mut self) -> Result<Vec<PartitionProbe>, ProbeError>;

    fn network(&mut self) -> Result<NetworkInfo, ProbeError>;

    fn sensors(&mut self) -> Result<Vec<SensorProbe>, ProbeError>;

    fn processes(&mut self) -> Result<Vec<ProcessProbe>, ProbeError>;

    fn uptime_seconds(&mut self) -> u64;
}

// ─────────────────────────────────────────────────────────────────
// sysinfo-backed provider
// ─────────────────────────────────────────────────────────────────

/// Production provider backed by the `sysinfo` crate
pub struct SysinfoProvider {
    system: System,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything());

        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for SysinfoProvider {
    fn platform(&mut self) -> PlatformInfo {
        let boot_time = i64::try_from(System::boot_time())
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        PlatformInfo {
            os: System::name(),
            release: System::kernel_version(),
            version: System::long_os_version().or_else(System::os_version),
            arch: Some(std::env::consts::ARCH.to_string()),
            processor: self
                .system
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty()),
            hostname: hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
                .or_else(System::host_name),
            boot_time,
        }
    }

    fn cpu_topology(&mut self) -> Result<CpuTopology, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::Unsupported);
        }
        self.system.refresh_cpu_frequency();

        let freqs: Vec<u64> = self
            .system
            .cpus()
            .iter()
            .map(|cpu| cpu.frequency())
            .filter(|mhz| *mhz > 0)
            .collect();
        let freq_current = if freqs.is_empty() {
            None
        } else {
            Some(freqs.iter().sum::<u64>() as f64 / freqs.len() as f64)
        };

        // sysinfo does not expose the frequency range
        Ok(CpuTopology {
            physical_cores: System::physical_core_count(),
            freq_min: None,
            freq_max: None,
            freq_current,
        })
    }

    fn sample_cpu_usage(&mut self, window: Duration) -> Result<CpuUsage, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::Unsupported);
        }

        self.system.refresh_cpu_usage();
        std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();

        Ok(CpuUsage {
            per_core: self.system.cpus().iter().map(|cpu| cpu.cpu_usage()).collect(),
            total: self.system.global_cpu_usage(),
        })
    }

    fn memory(&mut self) -> Result<MemoryInfo, ProbeError> {
        self.system.refresh_memory();
        let sys = &self.system;
        if sys.total_memory() == 0 {
            return Err(ProbeError::Unsupported);
        }

        Ok(MemoryInfo::from_raw(
            sys.total_memory(),
            sys.available_memory(),
            sys.used_memory(),
            sys.total_swap(),
            sys.used_swap(),
        ))
    }

    fn partitions(&mut self) -> Result<Vec<PartitionProbe>, ProbeError> {
        let disks = Disks::new_with_refreshed_list();

        Ok(disks
            .iter()
            .map(|disk| {
                let total = disk.total_space();
                // A zero-sized mount means the statfs probe came back empty
                let usage = if total == 0 {
                    Err(ProbeError::Other("no capacity reported".to_string()))
                } else {
                    Ok(DiskUsage::from_raw(total, disk.available_space()))
                };

                PartitionProbe {
                    device: disk.name().to_string_lossy().into_owned(),
                    mountpoint: disk.mount_point().to_string_lossy().into_owned(),
                    fstype: disk.file_system().to_string_lossy().into_owned(),
                    usage,
                }
            })
            .collect())
    }

    fn network(&mut self) -> Result<NetworkInfo, ProbeError> {
        let networks = Networks::new_with_refreshed_list();
        let mut info = NetworkInfo::default();

        for (name, data) in networks.iter() {
            info.bytes_received += data.total_received();
            info.bytes_sent += data.total_transmitted();

            let mut addresses: Vec<InterfaceAddress> = data
                .ip_networks()
                .iter()
                .map(|net| InterfaceAddress {
                    family: if net.addr.is_ipv4() {
                        AddressFamily::Inet
                    } else {
                        AddressFamily::Inet6
                    },
                    address: net.addr.to_string(),
                })
                .collect();

            let mac = data.mac_address();
            if !mac.is_unspecified() {
                addresses.push(InterfaceAddress {
                    family: AddressFamily::Link,
                    address: mac.to_string(),
                });
            }

            info.interfaces.insert(name.clone(), addresses);
        }

        Ok(info)
    }

    fn sensors(&mut self) -> Result<Vec<SensorProbe>, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::Unsupported);
        }
        let components = Components::new_with_refreshed_list();

        Ok(components
            .iter()
            .map(|component| {
                let (chip, label) = split_component_label(component.label());
                SensorProbe {
                    chip,
                    label,
                    reading: component
                        .temperature()
                        .filter(|celsius| celsius.is_finite())
                        .ok_or_else(|| ProbeError::Other("no temperature reading".to_string())),
                }
            })
            .collect())
    }

    fn processes(&mut self) -> Result<Vec<ProcessProbe>, ProbeError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let probes: BTreeMap<u32, ProcessProbe> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let pid = pid.as_u32();
                let name = process.name().to_string_lossy().into_owned();
                // Unreadable processes come back without a name
                let entry = if name.is_empty() {
                    Err(ProbeError::PermissionDenied)
                } else {
                    Ok(ProcessEntry {
                        pid,
                        name,
                        rss: process.memory(),
                    })
                };
                (pid, ProcessProbe { pid, entry })
            })
            .collect();

        trace!(count = probes.len(), "Enumerated processes");
        Ok(probes.into_values().collect())
    }

    fn uptime_seconds(&mut self) -> u64 {
        System::uptime()
    }
}

/// Split a sysinfo component label such as `"coretemp Package id 0"` into
/// chip and sensor label. Labels without a space form their own chip.
fn split_component_label(raw: &str) -> (String, String) {
    let raw = raw.trim();
    match raw.split_once(' ') {
        Some((chip, label)) => (chip.to_string(), label.trim().to_string()),
        None => (raw.to_string(), String::new()),
    }
}
