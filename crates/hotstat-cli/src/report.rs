//! Per-tick report assembly and formatting.
//!
//! One [`TickReport`] is built per tick from whatever the samplers and
//! passthrough readers produced, then rendered as the one-block text layout
//! or serialized as JSON. Keeping assembly separate from rendering means the
//! two output modes can never disagree about what a tick contained.

use std::fmt::Write as _;
use std::str::FromStr;

use hotstat_core::{
    CpuField, CpuRates, CpuTopology, DiskField, DiskRates, LoadAvg, MemoryInfo, Uptime,
};
use serde::Serialize;

/// Memory display unit parsed from `--mem-scale`.
///
/// One letter: lowercase is 1024-based (KiB, MiB, ...), uppercase is
/// 1000-based (kB, MB, ...), plus `b` for raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemScale {
    unit: char,
    divisor: u64,
}

impl MemScale {
    /// Scale a KiB quantity (the /proc/meminfo unit) into display units.
    pub fn apply(self, kib: u64) -> u64 {
        (kib * 1024) / self.divisor
    }

    /// The unit letter, echoed after scaled values.
    pub fn suffix(self) -> char {
        self.unit
    }
}

impl Default for MemScale {
    fn default() -> Self {
        MemScale {
            unit: 'm',
            divisor: 1 << 20,
        }
    }
}

impl FromStr for MemScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(unit), None) = (chars.next(), chars.next()) else {
            return Err(format!("memory scale must be one character, got {s:?}"));
        };
        let divisor = match unit {
            'b' => 1,
            'k' => 1 << 10,
            'K' => 1_000,
            'm' => 1 << 20,
            'M' => 1_000_000,
            'g' => 1 << 30,
            'G' => 1_000_000_000,
            't' => 1 << 40,
            'T' => 1_000_000_000_000,
            _ => {
                return Err(format!(
                    "unknown memory scale '{unit}' (one of: b k K m M g G t T)"
                ));
            }
        };
        Ok(MemScale { unit, divisor })
    }
}

/// Everything one tick reports.
///
/// In disks-only mode the header and memory parts are `None`/empty and only
/// the disk line renders.
#[derive(Debug, Serialize)]
pub struct TickReport<'a> {
    pub topology: &'a CpuTopology,
    pub uptime: Option<Uptime>,
    pub load: Option<LoadAvg>,
    pub memory: Option<MemoryInfo>,
    pub cpu_metric: CpuField,
    pub cpus: Vec<CpuRates>,
    pub disk_metric: DiskField,
    pub disks: Vec<DiskRates>,
    #[serde(skip)]
    pub mem_scale: MemScale,
}

impl TickReport<'_> {
    /// Render the one-block-per-tick text layout: header, per-CPU lines,
    /// memory line, disk line. Sections whose data is absent are omitted.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        // Each header fact stands alone; a failed uptime read must not take
        // the load fragment (or the static topology facts) with it.
        if self.uptime.is_some() || self.load.is_some() || !self.cpus.is_empty() {
            let mut head: Vec<String> = Vec::new();
            if let Some(up) = &self.uptime {
                let (h, m, s) = up.hms();
                head.push(format!("up: {h}:{m:02}:{s:02}"));
            }
            if let Some(load) = &self.load {
                match (load.running, load.total) {
                    (Some(r), Some(t)) => head.push(format!("r/t: {r}/{t}")),
                    _ => head.push("r/t: -/-".to_string()),
                }
                head.push(format!(
                    "la: {:.2},{:.2},{:.2}",
                    load.one, load.five, load.fifteen
                ));
            }
            head.push(format!(
                "vc:{} f:{:.2}",
                self.topology.siblings,
                self.topology.mhz / 1000.0
            ));
            let _ = writeln!(out, "{}", head.join("  "));
        }

        for cpu in &self.cpus {
            let _ = writeln!(
                out,
                "{}: usr:{:.2} sys:{:.2} idle:{:.2} iowait:{:.2} irq:{:.2} softirq:{:.2} \
                 steal:{:.2} guest:{:.2} gnice:{:.2}",
                cpu.label,
                cpu.value(CpuField::User),
                cpu.value(CpuField::System),
                cpu.value(CpuField::Idle),
                cpu.value(CpuField::Iowait),
                cpu.value(CpuField::Irq),
                cpu.value(CpuField::Softirq),
                cpu.value(CpuField::Steal),
                cpu.value(CpuField::Guest),
                cpu.value(CpuField::GuestNice),
            );
        }

        if let Some(mem) = &self.memory {
            let u = self.mem_scale.suffix();
            let _ = writeln!(
                out,
                "mem: free/tot: {}/{}{u}  buff/cache: {}/{}{u}",
                self.mem_scale.apply(mem.free),
                self.mem_scale.apply(mem.total),
                self.mem_scale.apply(mem.buffers),
                self.mem_scale.apply(mem.cached),
            );
        }

        if !self.disks.is_empty() {
            out.push_str("disks:");
            for disk in &self.disks {
                let _ = write!(out, " {}:{:.0}", disk.name, disk.value(self.disk_metric));
            }
            out.push('\n');
        }

        if out.ends_with('\n') {
            out.pop();
        }
        out
    }
}

/// Placeholder for the priming tick when `--warmup` is set.
pub fn warmup_line() -> String {
    "priming counters; first rates next tick".to_string()
}
