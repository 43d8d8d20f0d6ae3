//! Human-readable console reports

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::error::ProbeError;
use crate::gpu::{GpuStressReport, StressStatus};
use crate::system::{BenchmarkResult, ItemKind, SensorReading, SkippedItem, SystemSnapshot};

const NA: &str = "N/A";

/// Bytes as gigabytes with two decimals
pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
}

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{} {} {}", "=".repeat(10), title, "=".repeat(10));
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| NA.to_string())
}

fn mhz(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0} MHz", v)).unwrap_or_else(|| NA.to_string())
}

/// Full snapshot report, one section per sub-record. `skipped` supplies the
/// reason shown for partitions without usage.
pub fn render_snapshot(snapshot: &SystemSnapshot, skipped: &[SkippedItem]) -> String {
    let mut out = String::new();

    // SYSTEM
    let sys = &snapshot.system;
    header(&mut out, "SYSTEM");
    let _ = writeln!(out, "OS: {} {}", or_na(sys.os.as_deref()), sys.release.as_deref().unwrap_or(""));
    let _ = writeln!(out, "OS Version: {}", or_na(sys.version.as_deref()));
    let _ = writeln!(out, "Architecture: {}", or_na(sys.arch.as_deref()));
    let _ = writeln!(out, "Processor: {}", or_na(sys.processor.as_deref()));
    let _ = writeln!(out, "Hostname: {}", or_na(sys.hostname.as_deref()));
    let _ = writeln!(
        out,
        "Boot Time: {}",
        or_na(sys.boot_time.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC")))
    );

    // CPU
    header(&mut out, "CPU");
    match &snapshot.cpu {
        Some(cpu) => {
            let _ = writeln!(out, "Physical cores: {}", or_na(cpu.physical_cores));
            let _ = writeln!(out, "Total cores: {}", cpu.logical_cores);
            let _ = writeln!(out, "Max Frequency: {}", mhz(cpu.freq_max));
            let _ = writeln!(out, "Min Frequency: {}", mhz(cpu.freq_min));
            let _ = writeln!(out, "Current Frequency: {}", mhz(cpu.freq_current));
            let _ = writeln!(out, "\nCPU Usage Per Core:");
            for (i, pct) in cpu.usage_per_core.iter().enumerate() {
                let _ = writeln!(out, "Core {}: {:.1}%", i, pct);
            }
            let _ = writeln!(out, "Total CPU Usage: {:.1}%", cpu.usage_total);
        }
        None => {
            let _ = writeln!(out, "{}", NA);
        }
    }

    // MEMORY
    header(&mut out, "MEMORY");
    match &snapshot.memory {
        Some(mem) => {
            let vm = &mem.virtual_memory;
            let _ = writeln!(out, "Total RAM: {}", format_gb(vm.total));
            let _ = writeln!(out, "Available RAM: {}", format_gb(vm.available));
            let _ = writeln!(out, "Used RAM: {}", format_gb(vm.used));
            let _ = writeln!(out, "RAM Usage: {}%", vm.percent);
            let _ = writeln!(out, "\nSwap Total: {}", format_gb(mem.swap.total));
            let _ = writeln!(out, "Swap Used: {}", format_gb(mem.swap.used));
            let _ = writeln!(out, "Swap Usage: {}%", mem.swap.percent);
        }
        None => {
            let _ = writeln!(out, "{}", NA);
        }
    }

    // DISKS
    header(&mut out, "DISKS");
    match &snapshot.disks {
        Some(disks) => {
            for disk in disks {
                let _ = writeln!(out, "\nDevice: {}", disk.device);
                let _ = writeln!(out, "Mountpoint: {}", disk.mountpoint);
                let _ = writeln!(out, "Filesystem: {}", disk.fstype);
                match &disk.usage {
                    Some(usage) => {
                        let _ = writeln!(out, "Total Size: {}", format_gb(usage.total));
                        let _ = writeln!(out, "Used: {}", format_gb(usage.used));
                        let _ = writeln!(out, "Free: {}", format_gb(usage.free));
                        let _ = writeln!(out, "Usage: {}%", usage.percent);
                    }
                    None => {
                        let reason = skipped
                            .iter()
                            .find(|s| s.kind == ItemKind::DiskUsage && s.id == disk.mountpoint)
                            .map(|s| &s.reason);
                        let _ = match reason {
                            Some(ProbeError::PermissionDenied) => writeln!(out, "Permission denied"),
                            Some(reason) => writeln!(out, "Usage: {} ({})", NA, reason),
                            None => writeln!(out, "Usage: {}", NA),
                        };
                    }
                }
            }
        }
        None => {
            let _ = writeln!(out, "{}", NA);
        }
    }

    // NETWORK
    header(&mut out, "NETWORK");
    match &snapshot.network {
        Some(net) => {
            let _ = writeln!(out, "Bytes Sent: {}", format_gb(net.bytes_sent));
            let _ = writeln!(out, "Bytes Received: {}", format_gb(net.bytes_received));
            let _ = writeln!(out, "\nInterfaces:");
            for (name, addrs) in &net.interfaces {
                let _ = writeln!(out, "\n{}:", name);
                for addr in addrs {
                    let _ = writeln!(out, "  {} {}", addr.family, addr.address);
                }
            }
        }
        None => {
            let _ = writeln!(out, "{}", NA);
        }
    }

    // SENSORS
    header(&mut out, "SENSORS");
    match &snapshot.sensors {
        Some(groups) => write_sensor_groups(&mut out, groups),
        None => {
            let _ = writeln!(out, "No temperature sensors available");
        }
    }

    // PROCESSES
    header(&mut out, "PROCESSES");
    match &snapshot.processes {
        Some(procs) => {
            let _ = writeln!(out, "Total running processes: {}", procs.total_count);
            let _ = writeln!(out, "\nTop {} processes by memory usage:", procs.top_by_memory.len());
            for p in &procs.top_by_memory {
                let _ = writeln!(out, "PID {} | {} | RAM {}", p.pid, p.name, format_gb(p.rss));
            }
        }
        None => {
            let _ = writeln!(out, "{}", NA);
        }
    }

    // UPTIME
    header(&mut out, "UPTIME");
    let _ = writeln!(
        out,
        "System Uptime: {:.2} hours",
        snapshot.uptime_seconds as f64 / 3600.0
    );

    out
}

fn write_sensor_groups(out: &mut String, groups: &BTreeMap<String, Vec<SensorReading>>) {
    for (name, readings) in groups {
        let _ = writeln!(out, "\n{}:", name);
        for r in readings {
            let _ = writeln!(out, "  {}: {:.1} °C", r.label, r.current_celsius);
        }
    }
}

/// Temperature listing for the `temps` command
pub fn render_temperatures(
    sensors: &Result<Option<BTreeMap<String, Vec<SensorReading>>>, ProbeError>,
) -> String {
    let mut out = String::new();
    match sensors {
        Ok(Some(groups)) => write_sensor_groups(&mut out, groups),
        Ok(None) => out.push_str("No temperature sensors detected\n"),
        Err(ProbeError::Unsupported) => {
            out.push_str("Temperature sensors API not available on this platform\n")
        }
        Err(e) => {
            let _ = writeln!(out, "Temperature sensors could not be read: {}", e);
        }
    }
    out
}

/// CPU benchmark summary
pub fn render_benchmark(result: &BenchmarkResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Benchmark Results ({} cores, {} iterations each):", result.core_count, result.iterations);
    let _ = writeln!(out, "  Completed in:          {:.2} seconds", result.total_elapsed_seconds);
    let _ = writeln!(out, "  Average time per core: {:.2} seconds", result.per_core_seconds);

    match &result.per_core_usage_percent {
        Some(usage) => {
            let _ = writeln!(out, "\nCPU Usage per core after benchmark (percent):");
            for (i, pct) in usage.iter().enumerate() {
                let _ = writeln!(out, "  Core {}: {:.1}%", i, pct);
            }
        }
        None => {
            let _ = writeln!(out, "\nCPU usage monitoring: disabled");
        }
    }
    out
}

/// GPU stress summary
pub fn render_gpu_stress(report: &GpuStressReport) -> String {
    match report.status {
        StressStatus::Unavailable => "No GPU detected\n".to_string(),
        StressStatus::Completed => {
            let mut out = String::new();
            let _ = writeln!(out, "GPU Stress Results ({}):", or_na(report.device.as_deref()));
            let _ = writeln!(out, "  Matrix size:  {}x{}", report.matrix_size, report.matrix_size);
            let _ = writeln!(out, "  Iterations:   {}", report.iterations);
            let _ = writeln!(
                out,
                "  Completed in: {}",
                or_na(report.elapsed_seconds.map(|s| format!("{:.2} seconds", s)))
            );
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{DiskPartition, PlatformInfo};

    fn empty_snapshot() -> SystemSnapshot {
        SystemSnapshot {
            system: PlatformInfo::default(),
            cpu: None,
            memory: None,
            disks: Some(vec![
                DiskPartition {
                    device: "/dev/sda1".into(),
                    mountpoint: "/secret".into(),
                    fstype: "ext4".into(),
                    usage: None,
                },
                DiskPartition {
                    device: "tmpfs".into(),
                    mountpoint: "/run/empty".into(),
                    fstype: "tmpfs".into(),
                    usage: None,
                },
            ]),
            network: None,
            sensors: None,
            processes: None,
            uptime_seconds: 7200,
        }
    }

    #[test]
    fn test_format_gb() {
        assert_eq!(format_gb(0), "0.00 GB");
        assert_eq!(format_gb(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_gb(3 * 512 * 1024 * 1024), "1.50 GB");
    }

    #[test]
    fn test_snapshot_sections_and_unavailable_values() {
        let skipped = vec![
            SkippedItem {
                kind: ItemKind::DiskUsage,
                id: "/secret".into(),
                reason: ProbeError::PermissionDenied,
            },
            SkippedItem {
                kind: ItemKind::DiskUsage,
                id: "/run/empty".into(),
                reason: ProbeError::Other("no capacity reported".into()),
            },
        ];
        let text = render_snapshot(&empty_snapshot(), &skipped);

        for section in ["SYSTEM", "CPU", "MEMORY", "DISKS", "NETWORK", "SENSORS", "PROCESSES", "UPTIME"] {
            assert!(text.contains(section), "missing section {}", section);
        }
        assert!(text.contains("Hostname: N/A"));
        assert!(text.contains("Device: /dev/sda1"));
        assert_eq!(text.matches("Permission denied").count(), 1);
        assert!(text.contains("Usage: N/A (no capacity reported)"));
        assert!(text.contains("System Uptime: 2.00 hours"));
    }

    #[test]
    fn test_disk_without_skip_reason() {
        let text = render_snapshot(&empty_snapshot(), &[]);
        assert!(!text.contains("Permission denied"));
        assert_eq!(text.matches("Usage: N/A").count(), 2);
    }

    #[test]
    fn test_temperatures_rendering() {
        assert_eq!(render_temperatures(&Ok(None)), "No temperature sensors detected\n");

        let mut groups = BTreeMap::new();
        groups.insert(
            "coretemp".to_string(),
            vec![SensorReading {
                label: "N/A".into(),
                current_celsius: 45.0,
            }],
        );
        let text = render_temperatures(&Ok(Some(groups)));
        assert!(text.contains("coretemp:"));
        assert!(text.contains("N/A: 45.0 °C"));
    }

    #[test]
    fn test_benchmark_rendering() {
        let result = BenchmarkResult {
            timestamp: chrono::Utc::now(),
            iterations: 1000,
            core_count: 2,
            total_elapsed_seconds: 3.0,
            per_core_seconds: 1.5,
            per_core_usage_percent: Some(vec![99.0, 97.5]),
        };
        let text = render_benchmark(&result);
        assert!(text.contains("3.00 seconds"));
        assert!(text.contains("1.50 seconds"));
        assert!(text.contains("Core 1: 97.5%"));
    }
}
