//! Per-device I/O counters from /proc/diskstats.

use std::fs;
use std::path::PathBuf;

use crate::counters::{DISK_FIELDS, DiskCounters};
use crate::error::SampleError;
use crate::rate::{DiskRates, RateSet, disk_rates};
use crate::sampler::CounterSource;

const PROC_DISKSTATS: &str = "/proc/diskstats";

/// Reads every device row from /proc/diskstats.
///
/// Rows are kept unfiltered — partitions and dm/loop devices rank alongside
/// whole disks, and the name-keyed pairing in the rate computer keeps them
/// straight when the set changes.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    path: PathBuf,
}

impl DiskProbe {
    pub fn new() -> Self {
        DiskProbe {
            path: PathBuf::from(PROC_DISKSTATS),
        }
    }

    /// A probe reading an alternate file; tests point this at fixtures.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        DiskProbe { path: path.into() }
    }
}

impl Default for DiskProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for DiskProbe {
    type Raw = DiskCounters;
    type Rate = DiskRates;

    fn name(&self) -> &'static str {
        "disk"
    }

    fn read(&mut self) -> Result<Vec<DiskCounters>, SampleError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| SampleError::acquire(self.path.display().to_string(), e))?;
        parse_diskstats(&text)
    }

    fn rates(&self, previous: &[DiskCounters], current: &[DiskCounters]) -> RateSet<DiskRates> {
        disk_rates(previous, current)
    }
}

/// Parse /proc/diskstats text into device rows.
///
/// A row is `major minor name` followed by the value fields. Kernels before
/// 4.18 stop after the eleven classic I/O fields; the discard and flush
/// fields then read as zero. Anything shorter than those eleven is
/// malformed. An empty file parses to an empty set (seen in minimal
/// containers), which is not an error.
pub fn parse_diskstats(text: &str) -> Result<Vec<DiskCounters>, SampleError> {
    let mut rows = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(major), Some(minor), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SampleError::malformed("/proc/diskstats", line));
        };
        let major = major
            .parse()
            .map_err(|_| SampleError::malformed("/proc/diskstats", line))?;
        let minor = minor
            .parse()
            .map_err(|_| SampleError::malformed("/proc/diskstats", line))?;

        let mut values = [0u64; DISK_FIELDS];
        let mut got = 0;
        for slot in values.iter_mut() {
            match parts.next() {
                Some(tok) => {
                    *slot = tok
                        .parse()
                        .map_err(|_| SampleError::malformed("/proc/diskstats", line))?;
                    got += 1;
                }
                None => break,
            }
        }
        if got < 11 {
            return Err(SampleError::malformed("/proc/diskstats", line));
        }

        rows.push(DiskCounters {
            major,
            minor,
            name: name.to_string(),
            values,
        });
    }

    Ok(rows)
}
