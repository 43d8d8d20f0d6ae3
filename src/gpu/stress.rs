//! GPU stress run
//!
//! Drives a [`ComputeDevice`] through a timed loop of square matrix
//! multiplications. The accelerator runtime is an external collaborator;
//! [`NoAccelerator`] is the runtime used when none is linked in.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::gpu::{select_device, DeviceInfo, VendorPreference};

/// Default matrix edge length
pub const DEFAULT_MATRIX_SIZE: usize = 4096;

/// Progress is logged every this many iterations
pub const PROGRESS_EVERY: u64 = 10;

// ─────────────────────────────────────────────────────────────────
// Accelerator seam
// ─────────────────────────────────────────────────────────────────

/// An opened accelerator device
pub trait ComputeDevice {
    fn info(&self) -> &DeviceInfo;

    /// Allocate two random `size x size` matrices on the device
    fn allocate(&mut self, size: usize) -> Result<()>;

    /// Multiply the allocated matrices once
    fn multiply(&mut self) -> Result<()>;

    /// Block until queued work has finished
    fn synchronize(&mut self) -> Result<()>;
}

/// Enumerates and opens accelerator devices
pub trait AcceleratorRuntime {
    fn devices(&self) -> Vec<DeviceInfo>;

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn ComputeDevice>>;
}

/// Runtime with no devices
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAccelerator;

impl AcceleratorRuntime for NoAccelerator {
    fn devices(&self) -> Vec<DeviceInfo> {
        Vec::new()
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn ComputeDevice>> {
        Err(Error::DeviceUnavailable {
            message: format!("no accelerator runtime to open {}", device.name),
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressStatus {
    Completed,
    Unavailable,
}

/// Outcome of one stress run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuStressReport {
    pub status: StressStatus,
    /// Device name, absent when no device was used
    pub device: Option<String>,
    pub matrix_size: usize,
    pub iterations: u64,
    /// Timed region only; absent when nothing ran
    pub elapsed_seconds: Option<f64>,
}

impl GpuStressReport {
    fn unavailable(matrix_size: usize, iterations: u64) -> Self {
        Self {
            status: StressStatus::Unavailable,
            device: None,
            matrix_size,
            iterations,
            elapsed_seconds: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────────────

/// Stress runner over an accelerator runtime
pub struct GpuStressRunner<R> {
    runtime: R,
    preference: VendorPreference,
}

impl<R: AcceleratorRuntime> GpuStressRunner<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            preference: VendorPreference::Auto,
        }
    }

    pub fn with_preference(mut self, preference: VendorPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Run `iterations` multiplications of `matrix_size` matrices.
    /// Finding no usable device is reported, not an error.
    pub fn run(&self, matrix_size: usize, iterations: u64) -> Result<GpuStressReport> {
        if matrix_size == 0 {
            return Err(Error::InvalidInput("matrix size must be greater than 0".into()));
        }
        if iterations == 0 {
            return Err(Error::InvalidInput("iterations must be greater than 0".into()));
        }

        let devices = self.runtime.devices();
        let Some(selected) = select_device(&devices, self.preference) else {
            info!(preference = ?self.preference, "No GPU detected, skipping stress run");
            return Ok(GpuStressReport::unavailable(matrix_size, iterations));
        };

        let mut device = self.runtime.open(selected)?;
        let name = device.info().name.clone();
        info!(device = %name, matrix_size, iterations, "Starting GPU stress run");

        device
            .allocate(matrix_size)
            .map_err(|e| device_failure(&name, "allocate", e))?;
        device
            .synchronize()
            .map_err(|e| device_failure(&name, "synchronize", e))?;

        let start = Instant::now();
        for i in 0..iterations {
            device
                .multiply()
                .map_err(|e| device_failure(&name, "multiply", e))?;
            if is_progress_step(i) {
                info!(iteration = i + 1, total = iterations, "GPU stress progress");
            }
        }
        device
            .synchronize()
            .map_err(|e| device_failure(&name, "synchronize", e))?;
        let elapsed = start.elapsed().as_secs_f64();

        debug!(device = %name, elapsed_secs = elapsed, "GPU stress run finished");

        Ok(GpuStressReport {
            status: StressStatus::Completed,
            device: Some(name),
            matrix_size,
            iterations,
            elapsed_seconds: Some(elapsed),
        })
    }
}

/// Progress is reported on the first iteration and every
/// `PROGRESS_EVERY` after it (zero-based index)
fn is_progress_step(index: u64) -> bool {
    index % PROGRESS_EVERY == 0
}

/// Wrap an error from a device step, keeping failures already attributed to
/// the device as they are
fn device_failure(device: &str, step: &str, err: Error) -> Error {
    match err {
        Error::DeviceFailure { .. } => err,
        other => Error::DeviceFailure {
            device: device.to_string(),
            message: format!("{} failed: {}", step, other),
        },
    }
}

/// Run the stress loop on the default runtime
pub fn run_gpu_stress(matrix_size: usize, iterations: u64) -> Result<GpuStressReport> {
    GpuStressRunner::new(NoAccelerator).run(matrix_size, iterations)
}
