//! Host Sampler - sysinfo-backed CPU and Memory Readings
//!
//! Reads the 1-minute load average and available/total memory from the
//! operating system on every call. Logical core count is every CPU the
//! host reports, not the share a cgroup grants this process, since the
//! load average it divides is host-wide too.

use std::sync::Mutex;

use sysinfo::System;

use crate::domain::system::{cpu_usage_percent, memory_usage_percent};
use crate::error::SamplingError;
use crate::ports::sampler::SystemSampler;

/// Samples the machine the service runs on.
pub struct HostSampler {
    /// Reused between samples; sysinfo refreshes in place.
    system: Mutex<System>,
    /// Decimal places kept in reported percentages.
    precision: u32,
}

impl HostSampler {
    /// Create a sampler reporting percentages with `precision` decimals.
    pub fn new(precision: u32) -> Self {
        Self {
            system: Mutex::new(System::new()),
            precision,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, System>, SamplingError> {
        self.system
            .lock()
            .map_err(|_| SamplingError::Unavailable("sampler lock poisoned".to_string()))
    }
}

/// Logical CPUs on the host, falling back to the scheduler's view when
/// sysinfo lists none.
fn logical_cores(system: &System) -> Result<usize, SamplingError> {
    match system.cpus().len() {
        0 => std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .map_err(|e| SamplingError::Unavailable(format!("logical core count: {e}"))),
        n => Ok(n),
    }
}

/// `(total, available)` bytes. Available counts reclaimable page cache
/// as free (Linux `MemAvailable`), not just untouched pages.
fn memory_reading(system: &System) -> (u64, u64) {
    (system.total_memory(), system.available_memory())
}

impl SystemSampler for HostSampler {
    fn sample_cpu(&self) -> Result<f64, SamplingError> {
        let cores = {
            let mut system = self.lock()?;
            system.refresh_cpu_all();
            logical_cores(&system)?
        };
        let load = System::load_average();

        cpu_usage_percent(load.one, cores, self.precision)
            .ok_or_else(|| SamplingError::Unavailable("no logical cores reported".to_string()))
    }

    fn sample_memory(&self) -> Result<f64, SamplingError> {
        let mut system = self.lock()?;
        system.refresh_memory();

        let (total, available) = memory_reading(&system);
        memory_usage_percent(total, available, self.precision)
            .ok_or_else(|| SamplingError::Unavailable("total memory reported as 0".to_string()))
    }
}
