//! System uptime from /proc/uptime.

use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// Seconds since boot and aggregate idle seconds (summed across CPUs, so
/// idle can exceed uptime on multicore hosts).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Uptime {
    pub uptime_secs: f64,
    pub idle_secs: f64,
}

impl Uptime {
    /// Whole hours, minutes, and seconds of uptime, for display.
    pub fn hms(&self) -> (u64, u64, u64) {
        let total = self.uptime_secs as u64;
        (total / 3600, (total % 3600) / 60, total % 60)
    }
}

pub fn read_uptime() -> Result<Uptime, SampleError> {
    let text = std::fs::read_to_string("/proc/uptime")
        .map_err(|e| SampleError::acquire("/proc/uptime", e))?;
    parse_uptime(&text)
}

/// Parse the two-float /proc/uptime line, e.g. `351735.47 2347882.90`.
pub fn parse_uptime(text: &str) -> Result<Uptime, SampleError> {
    let bad = || SampleError::malformed("/proc/uptime", text.trim());
    let mut parts = text.split_whitespace();

    let uptime_secs = parts.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
    let idle_secs = parts.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;

    Ok(Uptime {
        uptime_secs,
        idle_secs,
    })
}
