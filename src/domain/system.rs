//! Host utilization math.
//!
//! Pure conversions from raw host statistics to the percentages reported
//! in the `cpu` and `memory` gauges. Reading the statistics themselves is
//! the job of the `SystemSampler` port.

/// Host utilization captured at flush time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemSample {
    /// 1-minute load average per logical core, as a percentage (uncapped).
    pub cpu_percent: f64,
    /// Used memory as a percentage of total memory.
    pub memory_percent: f64,
}

/// Round `value` to `precision` decimal places.
fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// CPU usage: load ratio rounded to `precision` places, then scaled by 100.
///
/// Load ratios above 1.0 produce values above 100; they are reported as-is.
/// Returns `None` when `cores` is zero.
pub fn cpu_usage_percent(load_one: f64, cores: usize, precision: u32) -> Option<f64> {
    if cores == 0 {
        return None;
    }
    let ratio = load_one / cores as f64;
    let scale = 10f64.powi(precision as i32);
    // Multiply before dividing so 0.29 yields 29.0, not 28.999999999999996.
    Some((ratio * scale).round() * 100.0 / scale)
}

/// Memory usage: `(total - available) / total * 100`, rounded to `precision`.
///
/// Returns `None` when `total` is zero.
pub fn memory_usage_percent(total: u64, available: u64, precision: u32) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available) as f64;
    Some(round_to(used / total as f64 * 100.0, precision))
}
