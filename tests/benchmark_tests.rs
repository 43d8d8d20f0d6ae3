//! CPU benchmark and GPU stress tests

mod common;

use std::time::{Duration, Instant};

use common::FixtureProvider;
use hostprobe::gpu::{run_gpu_stress, GpuStressRunner, NoAccelerator, StressStatus, VendorPreference};
use hostprobe::report::{read_json, write_json};
use hostprobe::system::{run_cpu_benchmark, run_workers, BenchmarkResult, CpuBenchmark};
use hostprobe::Error;
use tempfile::TempDir;

#[test]
fn test_worker_sums_are_bit_identical() {
    let first = run_workers(200_000, 4).unwrap();
    let second = run_workers(200_000, 4).unwrap();

    assert_eq!(first.len(), 4);
    let bits: Vec<u64> = first.iter().map(|s| s.to_bits()).collect();
    assert_eq!(bits, second.iter().map(|s| s.to_bits()).collect::<Vec<_>>());
}

#[test]
fn test_result_fields() {
    let mut provider = FixtureProvider::default();
    let result = CpuBenchmark::new(100_000, 3)
        .with_usage_sampling(Duration::from_millis(10))
        .run(&mut provider)
        .unwrap();

    assert_eq!(result.core_count, 3);
    assert_eq!(result.iterations, 100_000);
    assert!(result.total_elapsed_seconds > 0.0);
    assert!((result.per_core_seconds * 3.0 - result.total_elapsed_seconds).abs() < 1e-9);
    assert_eq!(
        result.per_core_usage_percent,
        Some(vec![12.5, 40.0, 3.0, 97.5])
    );
    assert_eq!(provider.sampled_windows, vec![Duration::from_millis(10)]);
}

#[test]
fn test_usage_monitoring_disabled() {
    let mut provider = FixtureProvider::default();
    let result = CpuBenchmark::new(10_000, 2).run(&mut provider).unwrap();

    assert!(result.per_core_usage_percent.is_none());
    assert!(provider.sampled_windows.is_empty());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["per_core_usage_percent"].is_null());
}

#[test]
fn test_usage_samples_are_clamped() {
    let mut provider = FixtureProvider {
        per_core_usage: vec![f32::NAN, 120.0, -3.0, 50.0],
        ..Default::default()
    };
    let result = CpuBenchmark::new(1_000, 2)
        .with_usage_sampling(Duration::from_millis(1))
        .run(&mut provider)
        .unwrap();

    assert_eq!(result.per_core_usage_percent, Some(vec![0.0, 100.0, 0.0, 50.0]));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.json");
    write_json(&result, &path).unwrap();
    let back: BenchmarkResult = read_json(&path).unwrap();
    assert_eq!(back.per_core_usage_percent, result.per_core_usage_percent);
}

#[test]
fn test_run_cpu_benchmark_on_host() {
    let result = run_cpu_benchmark(10_000, 2).unwrap();

    assert_eq!(result.core_count, 2);
    assert_eq!(result.iterations, 10_000);
    if let Some(usage) = &result.per_core_usage_percent {
        assert!(!usage.is_empty());
        assert!(usage.iter().all(|u| (0.0..=100.0).contains(u)));
    }
}

#[test]
fn test_invalid_parameters() {
    let mut provider = FixtureProvider::default();
    assert!(matches!(
        CpuBenchmark::new(0, 2).run(&mut provider),
        Err(Error::InvalidInput(_))
    ));
    assert!(matches!(
        CpuBenchmark::new(1_000, 0).run(&mut provider),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn test_elapsed_does_not_scale_linearly_with_cores() {
    let cores = num_cpus::get().min(4);
    if cores < 2 {
        return;
    }
    let iterations = 5_000_000;

    let start = Instant::now();
    run_workers(iterations, 1).unwrap();
    let single = start.elapsed().as_secs_f64();

    let start = Instant::now();
    run_workers(iterations, cores).unwrap();
    let parallel = start.elapsed().as_secs_f64();

    assert!(
        parallel < single * cores as f64 * 0.9,
        "{} workers took {:.3}s vs {:.3}s for one",
        cores,
        parallel,
        single
    );
}

#[test]
fn test_result_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.json");
    let result = CpuBenchmark::new(1_000, 2)
        .run(&mut FixtureProvider::default())
        .unwrap();

    write_json(&result, &path).unwrap();
    let back: BenchmarkResult = read_json(&path).unwrap();

    assert_eq!(back.core_count, result.core_count);
    assert_eq!(back.iterations, result.iterations);
    assert_eq!(back.per_core_usage_percent, result.per_core_usage_percent);
}

// ─────────────────────────────────────────────────────────────────
// GPU
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_gpu_stress_without_accelerator() {
    let report = run_gpu_stress(4096, 100).unwrap();

    assert_eq!(report.status, StressStatus::Unavailable);
    assert_eq!(report.matrix_size, 4096);
    assert!(report.elapsed_seconds.is_none());
}

#[test]
fn test_gpu_stress_vendor_none() {
    let report = GpuStressRunner::new(NoAccelerator)
        .with_preference(VendorPreference::parse("none").unwrap())
        .run(128, 10)
        .unwrap();

    assert_eq!(report.status, StressStatus::Unavailable);
}
