//! The /proc/meminfo keys the report shows, in KiB.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SampleError;

/// Subset of /proc/meminfo backing the memory report line, all in KiB as
/// the kernel prints them. Display scaling happens in the reporting layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

pub fn read_meminfo() -> Result<MemoryInfo, SampleError> {
    meminfo_from_path(Path::new("/proc/meminfo"))
}

/// Same as [`read_meminfo`] but from an explicit path, for tests.
pub fn meminfo_from_path(path: &Path) -> Result<MemoryInfo, SampleError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| SampleError::acquire(path.display().to_string(), e))?;
    Ok(parse_meminfo(&text))
}

/// Pick the known keys out of meminfo text; every other key is skipped.
/// Lines look like `MemTotal:       16314372 kB`.
pub fn parse_meminfo(text: &str) -> MemoryInfo {
    let mut info = MemoryInfo::default();
    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(value) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
        else {
            continue;
        };
        match key {
            "MemTotal" => info.total = value,
            "MemFree" => info.free = value,
            "MemAvailable" => info.available = value,
            "Buffers" => info.buffers = value,
            "Cached" => info.cached = value,
            "SwapTotal" => info.swap_total = value,
            "SwapFree" => info.swap_free = value,
            _ => {}
        }
    }
    info
}
