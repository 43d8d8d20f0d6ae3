//! CPU saturation benchmark
//!
//! One worker thread per requested core, each summing `sqrt(i)` for
//! `i` in `1..iterations`. The batch is timed as a whole; afterwards
//! per-core utilization is sampled from a [`MetricsProvider`].

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::system::provider::{MetricsProvider, SysinfoProvider};
use crate::system::snapshot::clamp_percent;

// ─────────────────────────────────────────────────────────────────
// Benchmark Results
// ─────────────────────────────────────────────────────────────────

/// Outcome of one CPU benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// When the run finished
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Iterations per worker
    pub iterations: u64,

    /// Number of workers spawned
    pub core_count: usize,

    /// Wall time for the whole batch
    pub total_elapsed_seconds: f64,

    /// `total_elapsed_seconds / core_count`
    pub per_core_seconds: f64,

    /// Utilization sampled after the run; `None` when monitoring is off
    pub per_core_usage_percent: Option<Vec<f32>>,
}

/// The per-worker workload
pub fn cpu_task(iterations: u64) -> f64 {
    (1..iterations).map(|i| (i as f64).sqrt()).sum()
}

// ─────────────────────────────────────────────────────────────────
// Benchmark Runner
// ─────────────────────────────────────────────────────────────────

/// Configured CPU benchmark
#[derive(Debug, Clone)]
pub struct CpuBenchmark {
    iterations: u64,
    core_count: usize,
    usage_window: Option<Duration>,
}

impl CpuBenchmark {
    /// Benchmark without usage sampling
    pub fn new(iterations: u64, core_count: usize) -> Self {
        Self {
            iterations,
            core_count,
            usage_window: None,
        }
    }

    /// Sample per-core utilization over `window` after the workers finish
    pub fn with_usage_sampling(mut self, window: Duration) -> Self {
        self.usage_window = Some(window);
        self
    }

    /// Run the benchmark, sampling usage from `provider` if enabled
    pub fn run<P: MetricsProvider>(&self, provider: &mut P) -> Result<BenchmarkResult> {
        info!(
            iterations = self.iterations,
            cores = self.core_count,
            "Starting CPU benchmark"
        );

        let start = Instant::now();
        let sums = run_workers(self.iterations, self.core_count)?;
        let elapsed = start.elapsed().as_secs_f64();
        debug!(workers = sums.len(), elapsed_secs = elapsed, "All workers joined");

        let per_core_usage_percent = match self.usage_window {
            Some(window) => match provider.sample_cpu_usage(window) {
                Ok(usage) => Some(usage.per_core.into_iter().map(clamp_percent).collect()),
                Err(e) => {
                    warn!(error = %e, "CPU usage sampling failed");
                    None
                }
            },
            None => None,
        };

        let result = BenchmarkResult {
            timestamp: chrono::Utc::now(),
            iterations: self.iterations,
            core_count: self.core_count,
            total_elapsed_seconds: elapsed,
            per_core_seconds: elapsed / self.core_count as f64,
            per_core_usage_percent,
        };

        info!(
            total_secs = result.total_elapsed_seconds,
            per_core_secs = result.per_core_seconds,
            "CPU benchmark complete"
        );

        Ok(result)
    }
}

/// Run the benchmark on the host, sampling usage over one second
pub fn run_cpu_benchmark(iterations: u64, core_count: usize) -> Result<BenchmarkResult> {
    CpuBenchmark::new(iterations, core_count)
        .with_usage_sampling(Duration::from_secs(1))
        .run(&mut SysinfoProvider::new())
}

/// Spawn `core_count` workers and return their sums in worker order.
/// A panicking worker fails the whole batch.
pub fn run_workers(iterations: u64, core_count: usize) -> Result<Vec<f64>> {
    if iterations == 0 {
        return Err(Error::InvalidInput("iterations must be greater than 0".into()));
    }
    run_workers_with(core_count, move |_| cpu_task(iterations))
}

/// Run `task(worker)` on `core_count` threads, joining every one of them
fn run_workers_with<F>(core_count: usize, task: F) -> Result<Vec<f64>>
where
    F: Fn(usize) -> f64 + Send + Sync + Clone + 'static,
{
    if core_count == 0 {
        return Err(Error::InvalidInput("core count must be greater than 0".into()));
    }

    let handles: Vec<_> = (0..core_count)
        .map(|worker| {
            let task = task.clone();
            thread::Builder::new()
                .name(format!("cpu-bench-{}", worker))
                .spawn(move || task(worker))
                .map_err(|e| Error::WorkerFailure {
                    worker,
                    message: format!("failed to spawn: {}", e),
                })
        })
        .collect::<Result<_>>()?;

    let mut sums = Vec::with_capacity(core_count);
    let mut failure = None;
    for (worker, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(sum) => sums.push(sum),
            Err(payload) => {
                // Keep joining so no thread outlives the batch
                failure.get_or_insert(Error::WorkerFailure {
                    worker,
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(sums),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_task_small_values() {
        assert_eq!(cpu_task(1), 0.0);
        assert_eq!(cpu_task(2), 1.0);
        let expected = 1.0 + 2f64.sqrt() + 3f64.sqrt();
        assert_eq!(cpu_task(4), expected);
    }

    #[test]
    fn test_workers_are_deterministic() {
        let first = run_workers(50_000, 3).unwrap();
        let second = run_workers(50_000, 3).unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first.iter().all(|s| s.to_bits() == first[0].to_bits()));
    }

    #[test]
    fn test_rejects_zero_inputs() {
        assert!(matches!(run_workers(0, 2), Err(Error::InvalidInput(_))));
        assert!(matches!(run_workers(10, 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_panicking_worker_fails_the_batch() {
        let result = run_workers_with(3, |worker| {
            if worker == 1 {
                panic!("worker {} hit a fault", worker);
            }
            cpu_task(1_000)
        });

        match result {
            Err(Error::WorkerFailure { worker, message }) => {
                assert_eq!(worker, 1);
                assert!(message.contains("hit a fault"));
            }
            other => panic!("expected a worker failure, got {:?}", other),
        }
    }

    #[test]
    fn test_first_failure_is_reported() {
        let result = run_workers_with(4, |worker| {
            if worker >= 2 {
                panic!("bad worker");
            }
            0.0
        });
        assert!(matches!(result, Err(Error::WorkerFailure { worker: 2, .. })));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
