//! Raw counter records and the field catalogs that pin their layout.
//!
//! Each monitored category stores its counters in a fixed array whose order
//! is defined by the matching field enum ([`CpuField`], [`DiskField`]).
//! Probes fill the arrays in enum order, the rate computer iterates the same
//! enums, and ranking keys index into derived records through them, so the
//! column layout is written down exactly once.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic kind of one counter field.
///
/// Cumulative fields only ever grow and are differenced between snapshots.
/// Gauges describe the current instant and are copied through unchanged; a
/// gauge delta is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterKind {
    /// Monotonically non-decreasing; rate = current − previous.
    Cumulative,
    /// Instantaneous; rate = current value, no delta.
    Gauge,
}

/// Time-in-state fields in a /proc/stat CPU row.
pub const CPU_FIELDS: usize = 10;

/// Value fields in a /proc/diskstats row.
pub const DISK_FIELDS: usize = 17;

// ---------------------------------------------------------------------------
// CPU
// ---------------------------------------------------------------------------

/// One CPU row from /proc/stat: the aggregate `cpu` line or one `cpuN` core.
///
/// Tick counts are in the kernel's USER_HZ unit. The unit cancels out of the
/// fractions the rate computer produces, so it is never converted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTimes {
    /// Row label: `"cpu"` for the aggregate, `"cpu0"`, `"cpu1"`, ... per
    /// core. Doubles as the entity identity.
    pub label: String,
    /// Tick counts in [`CpuField`] order.
    pub ticks: [u64; CPU_FIELDS],
}

impl CpuTimes {
    /// Total ticks across every state; the denominator for rate fractions.
    pub fn total(&self) -> u64 {
        self.ticks.iter().sum()
    }

    /// Value of one field.
    pub fn value(&self, field: CpuField) -> u64 {
        self.ticks[field as usize]
    }
}

/// Per-CPU time-in-state fields, in /proc/stat column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuField {
    User,
    Nice,
    System,
    Idle,
    Iowait,
    Irq,
    Softirq,
    Steal,
    Guest,
    GuestNice,
}

impl CpuField {
    /// Every field, in column (and array) order.
    pub const ALL: [CpuField; CPU_FIELDS] = [
        CpuField::User,
        CpuField::Nice,
        CpuField::System,
        CpuField::Idle,
        CpuField::Iowait,
        CpuField::Irq,
        CpuField::Softirq,
        CpuField::Steal,
        CpuField::Guest,
        CpuField::GuestNice,
    ];

    /// Every /proc/stat time field accumulates; the row has no gauges.
    pub fn kind(self) -> CounterKind {
        CounterKind::Cumulative
    }

    pub fn name(self) -> &'static str {
        match self {
            CpuField::User => "user",
            CpuField::Nice => "nice",
            CpuField::System => "system",
            CpuField::Idle => "idle",
            CpuField::Iowait => "iowait",
            CpuField::Irq => "irq",
            CpuField::Softirq => "softirq",
            CpuField::Steal => "steal",
            CpuField::Guest => "guest",
            CpuField::GuestNice => "guest_nice",
        }
    }
}

impl fmt::Display for CpuField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CpuField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "user" => Ok(CpuField::User),
            "nice" => Ok(CpuField::Nice),
            "system" | "sys" => Ok(CpuField::System),
            "idle" => Ok(CpuField::Idle),
            "iowait" => Ok(CpuField::Iowait),
            "irq" => Ok(CpuField::Irq),
            "softirq" => Ok(CpuField::Softirq),
            "steal" => Ok(CpuField::Steal),
            "guest" => Ok(CpuField::Guest),
            "guest_nice" => Ok(CpuField::GuestNice),
            _ => Err(format!(
                "unknown cpu field '{s}' (one of: user, nice, system, idle, \
                 iowait, irq, softirq, steal, guest, guest_nice)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Disk
// ---------------------------------------------------------------------------

/// One device row from /proc/diskstats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCounters {
    pub major: u32,
    pub minor: u32,
    /// Kernel device name (`sda`, `nvme0n1`, `dm-3`, ...); the stable
    /// identity used to pair snapshots.
    pub name: String,
    /// Values in [`DiskField`] order.
    pub values: [u64; DISK_FIELDS],
}

impl DiskCounters {
    /// Value of one field.
    pub fn value(&self, field: DiskField) -> u64 {
        self.values[field as usize]
    }
}

/// Per-device I/O fields, in /proc/diskstats column order (columns 4..20 of
/// the row, after major/minor/name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskField {
    ReadsCompleted,
    ReadsMerged,
    SectorsRead,
    MsReading,
    WritesCompleted,
    WritesMerged,
    SectorsWritten,
    MsWriting,
    IosInProgress,
    MsDoingIo,
    MsWeightedIo,
    DiscardsCompleted,
    DiscardsMerged,
    SectorsDiscarded,
    MsDiscarding,
    FlushesCompleted,
    MsFlushing,
}

impl DiskField {
    /// Every field, in column (and array) order.
    pub const ALL: [DiskField; DISK_FIELDS] = [
        DiskField::ReadsCompleted,
        DiskField::ReadsMerged,
        DiskField::SectorsRead,
        DiskField::MsReading,
        DiskField::WritesCompleted,
        DiskField::WritesMerged,
        DiskField::SectorsWritten,
        DiskField::MsWriting,
        DiskField::IosInProgress,
        DiskField::MsDoingIo,
        DiskField::MsWeightedIo,
        DiskField::DiscardsCompleted,
        DiskField::DiscardsMerged,
        DiskField::SectorsDiscarded,
        DiskField::MsDiscarding,
        DiskField::FlushesCompleted,
        DiskField::MsFlushing,
    ];

    /// `ios_in_progress` is the one gauge in the row: it counts requests in
    /// flight right now and goes down as well as up.
    pub fn kind(self) -> CounterKind {
        match self {
            DiskField::IosInProgress => CounterKind::Gauge,
            _ => CounterKind::Cumulative,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DiskField::ReadsCompleted => "reads_completed",
            DiskField::ReadsMerged => "reads_merged",
            DiskField::SectorsRead => "sectors_read",
            DiskField::MsReading => "ms_reading",
            DiskField::WritesCompleted => "writes_completed",
            DiskField::WritesMerged => "writes_merged",
            DiskField::SectorsWritten => "sectors_written",
            DiskField::MsWriting => "ms_writing",
            DiskField::IosInProgress => "ios_in_progress",
            DiskField::MsDoingIo => "ms_doing_io",
            DiskField::MsWeightedIo => "ms_weighted_io",
            DiskField::DiscardsCompleted => "discards_completed",
            DiskField::DiscardsMerged => "discards_merged",
            DiskField::SectorsDiscarded => "sectors_discarded",
            DiskField::MsDiscarding => "ms_discarding",
            DiskField::FlushesCompleted => "flushes_completed",
            DiskField::MsFlushing => "ms_flushing",
        }
    }
}

impl fmt::Display for DiskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiskField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        DiskField::ALL
            .into_iter()
            .find(|f| f.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = DiskField::ALL.iter().map(|f| f.name()).collect();
                format!("unknown disk field '{s}' (one of: {})", names.join(", "))
            })
    }
}
