//! Load averages: /proc/loadavg on Linux, getloadavg(3) elsewhere.

use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// One reading of the scheduler load averages.
///
/// The run-queue pair and last PID come from /proc/loadavg and only exist
/// on Linux; the libc fallback leaves them `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
    /// Currently runnable scheduling entities.
    pub running: Option<u64>,
    /// Total scheduling entities.
    pub total: Option<u64>,
    /// PID most recently handed out by the kernel.
    pub last_pid: Option<u64>,
}

#[cfg(target_os = "linux")]
pub fn read_loadavg() -> Result<LoadAvg, SampleError> {
    let text = std::fs::read_to_string("/proc/loadavg")
        .map_err(|e| SampleError::acquire("/proc/loadavg", e))?;
    parse_loadavg(&text)
}

#[cfg(not(target_os = "linux"))]
pub fn read_loadavg() -> Result<LoadAvg, SampleError> {
    let mut values = [0.0_f64; 3];
    // SAFETY: `getloadavg` writes up to `n` doubles to a valid buffer.
    let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
    if n < 3 {
        return Err(SampleError::acquire(
            "getloadavg",
            std::io::Error::new(std::io::ErrorKind::Unsupported, "getloadavg failed"),
        ));
    }
    Ok(LoadAvg {
        one: values[0],
        five: values[1],
        fifteen: values[2],
        running: None,
        total: None,
        last_pid: None,
    })
}

/// Parse the five-field /proc/loadavg line, e.g.
/// `0.52 0.58 0.59 2/1385 12354`.
///
/// The three averages are required; the `running/total` pair and PID are
/// kept when present.
pub fn parse_loadavg(text: &str) -> Result<LoadAvg, SampleError> {
    let bad = || SampleError::malformed("/proc/loadavg", text.trim());
    let mut parts = text.split_whitespace();

    let one = parts.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
    let five = parts.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;
    let fifteen = parts.next().and_then(|t| t.parse().ok()).ok_or_else(bad)?;

    let (running, total) = match parts.next().and_then(|t| t.split_once('/')) {
        Some((r, t)) => (r.parse().ok(), t.parse().ok()),
        None => (None, None),
    };
    let last_pid = parts.next().and_then(|t| t.parse().ok());

    Ok(LoadAvg {
        one,
        five,
        fifteen,
        running,
        total,
        last_pid,
    })
}
