//! Snapshot collector
//!
//! Queries a [`MetricsProvider`] for each sub-record independently. A failed
//! sub-record becomes `None` in the snapshot and a [`SkippedItem`] in the
//! capture; the rest of the capture carries on.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ProbeError;
use crate::system::provider::{MetricsProvider, ProcessProbe, SensorProbe, SysinfoProvider};
use crate::system::snapshot::{
    CpuInfo, DiskPartition, ProcessEntry, ProcessSummary, SensorReading, SystemSnapshot,
};

/// Default number of processes kept in `top_by_memory`
pub const DEFAULT_TOP_PROCESSES: usize = 5;

/// Default CPU usage sampling window
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// What kind of item was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Cpu,
    Memory,
    Disks,
    DiskUsage,
    Network,
    Sensors,
    Sensor,
    Processes,
    Process,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemKind::Cpu => "cpu",
            ItemKind::Memory => "memory",
            ItemKind::Disks => "disks",
            ItemKind::DiskUsage => "disk_usage",
            ItemKind::Network => "network",
            ItemKind::Sensors => "sensors",
            ItemKind::Sensor => "sensor",
            ItemKind::Processes => "processes",
            ItemKind::Process => "process",
        };
        write!(f, "{}", name)
    }
}

/// An item left out of a snapshot and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub kind: ItemKind,
    /// Mountpoint, pid, sensor name, or the sub-record name
    pub id: String,
    pub reason: ProbeError,
}

/// A snapshot with every skipped item
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub snapshot: SystemSnapshot,
    pub skipped: Vec<SkippedItem>,
}

/// Captures [`SystemSnapshot`]s from a provider
pub struct MetricsCollector<P = SysinfoProvider> {
    provider: P,
    top_processes: usize,
    sample_interval: Duration,
}

impl MetricsCollector<SysinfoProvider> {
    /// Collector backed by the host's metrics
    pub fn system() -> Self {
        Self::new(SysinfoProvider::new())
    }
}

impl<P: MetricsProvider> MetricsCollector<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            top_processes: DEFAULT_TOP_PROCESSES,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Number of processes kept in `top_by_memory`
    pub fn with_top_processes(mut self, count: usize) -> Self {
        self.top_processes = count;
        self
    }

    /// CPU usage sampling window
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Capture a snapshot, logging skipped items at debug level
    pub fn capture(&mut self) -> SystemSnapshot {
        let capture = self.capture_detailed();
        for item in &capture.skipped {
            debug!(kind = %item.kind, id = %item.id, reason = %item.reason, "Skipped item");
        }
        capture.snapshot
    }

    /// Capture a snapshot together with the items that were skipped
    pub fn capture_detailed(&mut self) -> Capture {
        let mut skipped = Vec::new();

        let system = self.provider.platform();
        let cpu = self.collect_cpu(&mut skipped);

        let memory = self
            .provider
            .memory()
            .map_err(|reason| skip(&mut skipped, ItemKind::Memory, "memory", reason))
            .ok();

        let disks = self.collect_disks(&mut skipped);

        let network = self
            .provider
            .network()
            .map_err(|reason| skip(&mut skipped, ItemKind::Network, "network", reason))
            .ok();

        let sensors = self.collect_sensors(&mut skipped);
        let processes = self.collect_processes(&mut skipped);
        let uptime_seconds = self.provider.uptime_seconds();

        info!(skipped = skipped.len(), "Snapshot captured");

        Capture {
            snapshot: SystemSnapshot {
                system,
                cpu,
                memory,
                disks,
                network,
                sensors,
                processes,
                uptime_seconds,
            },
            skipped,
        }
    }

    /// Read temperature sensors only. `Ok(None)` means the platform
    /// supports sensors but none reported a reading.
    pub fn capture_sensors(
        &mut self,
    ) -> Result<Option<BTreeMap<String, Vec<SensorReading>>>, ProbeError> {
        let probes = self.provider.sensors()?;
        let mut skipped = Vec::new();
        let groups = group_sensors(probes, &mut skipped);
        for item in &skipped {
            debug!(id = %item.id, reason = %item.reason, "Skipped sensor");
        }
        Ok(groups)
    }

    fn collect_cpu(&mut self, skipped: &mut Vec<SkippedItem>) -> Option<CpuInfo> {
        let topology = self
            .provider
            .cpu_topology()
            .map_err(|reason| skip(skipped, ItemKind::Cpu, "topology", reason))
            .unwrap_or_default();

        match self.provider.sample_cpu_usage(self.sample_interval) {
            Ok(usage) => Some(CpuInfo::from_parts(topology, usage)),
            Err(reason) => {
                skip(skipped, ItemKind::Cpu, "usage", reason);
                None
            }
        }
    }

    fn collect_disks(&mut self, skipped: &mut Vec<SkippedItem>) -> Option<Vec<DiskPartition>> {
        let probes = match self.provider.partitions() {
            Ok(probes) => probes,
            Err(reason) => {
                skip(skipped, ItemKind::Disks, "partitions", reason);
                return None;
            }
        };

        let partitions = probes
            .into_iter()
            .map(|probe| {
                let usage = match probe.usage {
                    Ok(usage) => Some(usage),
                    Err(reason) => {
                        skip(skipped, ItemKind::DiskUsage, &probe.mountpoint, reason);
                        None
                    }
                };
                DiskPartition {
                    device: probe.device,
                    mountpoint: probe.mountpoint,
                    fstype: probe.fstype,
                    usage,
                }
            })
            .collect();

        Some(partitions)
    }

    fn collect_sensors(
        &mut self,
        skipped: &mut Vec<SkippedItem>,
    ) -> Option<BTreeMap<String, Vec<SensorReading>>> {
        match self.provider.sensors() {
            Ok(probes) => group_sensors(probes, skipped),
            Err(reason) => {
                skip(skipped, ItemKind::Sensors, "sensors", reason);
                None
            }
        }
    }

    fn collect_processes(&mut self, skipped: &mut Vec<SkippedItem>) -> Option<ProcessSummary> {
        match self.provider.processes() {
            Ok(probes) => Some(summarize_processes(probes, self.top_processes, skipped)),
            Err(reason) => {
                skip(skipped, ItemKind::Processes, "processes", reason);
                None
            }
        }
    }
}

fn skip(skipped: &mut Vec<SkippedItem>, kind: ItemKind, id: &str, reason: ProbeError) {
    skipped.push(SkippedItem {
        kind,
        id: id.to_string(),
        reason,
    });
}

/// Group readings by chip; `None` when nothing usable was read
fn group_sensors(
    probes: Vec<SensorProbe>,
    skipped: &mut Vec<SkippedItem>,
) -> Option<BTreeMap<String, Vec<SensorReading>>> {
    let mut groups: BTreeMap<String, Vec<SensorReading>> = BTreeMap::new();

    for probe in probes {
        let label = if probe.label.trim().is_empty() {
            "N/A".to_string()
        } else {
            probe.label
        };
        match probe.reading {
            Ok(current_celsius) => groups.entry(probe.chip).or_default().push(SensorReading {
                label,
                current_celsius,
            }),
            Err(reason) => skip(skipped, ItemKind::Sensor, &format!("{}/{}", probe.chip, label), reason),
        }
    }

    if groups.is_empty() {
        None
    } else {
        Some(groups)
    }
}

/// Count every pid, keep the `top` largest by RSS. Ties break on pid so the
/// result does not depend on enumeration order.
fn summarize_processes(
    probes: Vec<ProcessProbe>,
    top: usize,
    skipped: &mut Vec<SkippedItem>,
) -> ProcessSummary {
    let total_count = probes.len();
    let mut entries: Vec<ProcessEntry> = Vec::with_capacity(total_count);

    for probe in probes {
        match probe.entry {
            Ok(entry) => entries.push(entry),
            Err(reason) => skip(skipped, ItemKind::Process, &probe.pid.to_string(), reason),
        }
    }

    entries.sort_by(|a, b| b.rss.cmp(&a.rss).then(a.pid.cmp(&b.pid)));
    entries.truncate(top);

    ProcessSummary {
        total_count,
        top_by_memory: entries,
    }
}
