//! Per-CPU time-in-state counters from /proc/stat, plus topology facts from
//! /proc/cpuinfo.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::counters::{CPU_FIELDS, CpuTimes};
use crate::error::SampleError;
use crate::rate::{CpuRates, RateSet, cpu_rates};
use crate::sampler::CounterSource;

const PROC_STAT: &str = "/proc/stat";
const PROC_CPUINFO: &str = "/proc/cpuinfo";

/// Reads the aggregate `cpu` row and every `cpuN` row from /proc/stat.
#[derive(Debug, Clone)]
pub struct CpuProbe {
    stat_path: PathBuf,
}

impl CpuProbe {
    pub fn new() -> Self {
        CpuProbe {
            stat_path: PathBuf::from(PROC_STAT),
        }
    }

    /// A probe reading an alternate stat file; tests point this at fixtures.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        CpuProbe {
            stat_path: path.into(),
        }
    }
}

impl Default for CpuProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for CpuProbe {
    type Raw = CpuTimes;
    type Rate = CpuRates;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn read(&mut self) -> Result<Vec<CpuTimes>, SampleError> {
        let text = fs::read_to_string(&self.stat_path)
            .map_err(|e| SampleError::acquire(self.stat_path.display().to_string(), e))?;
        parse_stat(&text)
    }

    fn rates(&self, previous: &[CpuTimes], current: &[CpuTimes]) -> RateSet<CpuRates> {
        cpu_rates(previous, current)
    }
}

/// Parse /proc/stat text into CPU rows, aggregate (`cpu`) first.
///
/// Non-CPU rows (`intr`, `ctxt`, `btime`, ...) are ignored. Kernels older
/// than 2.6.33 emit fewer than ten time fields per row; missing trailing
/// fields read as zero. A row needs at least the classic four
/// (user/nice/system/idle) to count.
pub fn parse_stat(text: &str) -> Result<Vec<CpuTimes>, SampleError> {
    let mut rows = Vec::new();

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else { continue };
        let Some(rest) = label.strip_prefix("cpu") else {
            continue;
        };
        if !(rest.is_empty() || rest.bytes().all(|b| b.is_ascii_digit())) {
            continue;
        }

        let mut ticks = [0u64; CPU_FIELDS];
        for (i, slot) in ticks.iter_mut().enumerate() {
            match parts.next() {
                Some(tok) => {
                    *slot = tok
                        .parse()
                        .map_err(|_| SampleError::malformed("/proc/stat", line))?;
                }
                None if i >= 4 => break,
                None => return Err(SampleError::malformed("/proc/stat", line)),
            }
        }
        rows.push(CpuTimes {
            label: label.to_string(),
            ticks,
        });
    }

    if rows.is_empty() {
        return Err(SampleError::malformed("/proc/stat", "no cpu rows present"));
    }
    Ok(rows)
}

/// Static header facts for the report: logical CPU count and clock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuTopology {
    /// Logical CPUs (`processor` entries).
    pub logical: usize,
    /// Hardware threads per package, from `siblings`.
    pub siblings: u32,
    /// Physical cores per package, from `cpu cores`.
    pub cores: u32,
    /// Reported clock of the last core listed, MHz.
    pub mhz: f64,
}

/// Read topology facts from /proc/cpuinfo.
pub fn cpu_topology() -> Result<CpuTopology, SampleError> {
    topology_from_path(Path::new(PROC_CPUINFO))
}

/// Same as [`cpu_topology`] but from an explicit path, for tests.
pub fn topology_from_path(path: &Path) -> Result<CpuTopology, SampleError> {
    let text = fs::read_to_string(path)
        .map_err(|e| SampleError::acquire(path.display().to_string(), e))?;
    Ok(parse_cpuinfo(&text))
}

/// Best-effort /proc/cpuinfo scan. The keys are x86-flavored; architectures
/// that omit them (most ARM boards) yield zeros rather than an error.
pub fn parse_cpuinfo(text: &str) -> CpuTopology {
    let mut topo = CpuTopology::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "processor" => topo.logical += 1,
            "siblings" => topo.siblings = value.parse().unwrap_or(0),
            "cpu cores" => topo.cores = value.parse().unwrap_or(0),
            "cpu MHz" => topo.mhz = value.parse().unwrap_or(0.0),
            _ => {}
        }
    }
    topo
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::counters::CpuField;

    const STAT: &str = "\
cpu  1723 5 1241 83462 358 0 92 0 0 0
cpu0 862 3 640 41650 190 0 61 0 0 0
cpu1 861 2 601 41812 168 0 31 0 0 0
intr 12409516 18 0 0 0
ctxt 23223194
btime 1734000000
processes 12001
";

    #[test]
    fn parses_aggregate_and_per_core_rows() {
        let rows = parse_stat(STAT).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "cpu");
        assert_eq!(rows[1].label, "cpu0");
        assert_eq!(rows[2].label, "cpu1");

        assert_eq!(rows[0].value(CpuField::User), 1723);
        assert_eq!(rows[1].value(CpuField::Idle), 41650);
        assert_eq!(rows[2].value(CpuField::Softirq), 31);
        assert_eq!(rows[0].total(), 1723 + 5 + 1241 + 83462 + 358 + 92);
    }

    #[test]
    fn short_rows_from_old_kernels_zero_fill() {
        // Seven fields, as a 2.6.18-era kernel would print.
        let rows = parse_stat("cpu 10 20 30 40 50 60 70\n").unwrap();
        assert_eq!(rows[0].value(CpuField::Softirq), 70);
        assert_eq!(rows[0].value(CpuField::Steal), 0);
        assert_eq!(rows[0].value(CpuField::GuestNice), 0);
    }

    #[test]
    fn nonnumeric_field_is_malformed() {
        let err = parse_stat("cpu 10 twenty 30 40\n").unwrap_err();
        assert!(matches!(err, SampleError::Malformed { .. }));
    }

    #[test]
    fn too_few_fields_is_malformed() {
        assert!(parse_stat("cpu 10 20 30\n").is_err());
    }

    #[test]
    fn text_without_cpu_rows_is_malformed() {
        assert!(parse_stat("intr 5\nctxt 9\n").is_err());
        // `cpufreq` must not be mistaken for a cpu row.
        assert!(parse_stat("cpufreq 1 2 3 4 5\n").is_err());
    }

    #[test]
    fn probe_reads_from_an_alternate_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STAT.as_bytes()).unwrap();

        let mut probe = CpuProbe::with_path(file.path());
        let rows = probe.read().unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn missing_stat_file_is_an_acquire_error() {
        let mut probe = CpuProbe::with_path("/nonexistent/stat");
        assert!(matches!(
            probe.read(),
            Err(SampleError::Acquire { .. })
        ));
    }

    const CPUINFO: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7
cpu MHz\t\t: 3400.102
siblings\t: 8
cpu cores\t: 4

processor\t: 1
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7
cpu MHz\t\t: 3192.550
siblings\t: 8
cpu cores\t: 4
";

    #[test]
    fn cpuinfo_counts_processors_and_keeps_last_clock() {
        let topo = parse_cpuinfo(CPUINFO);
        assert_eq!(topo.logical, 2);
        assert_eq!(topo.siblings, 8);
        assert_eq!(topo.cores, 4);
        assert_eq!(topo.mhz, 3192.550);
    }

    #[test]
    fn cpuinfo_without_x86_keys_yields_zeros() {
        let topo = parse_cpuinfo("processor\t: 0\nBogoMIPS\t: 48.00\n");
        assert_eq!(topo.logical, 1);
        assert_eq!(topo.siblings, 0);
        assert_eq!(topo.mhz, 0.0);
    }
}
