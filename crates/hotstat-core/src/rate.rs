//! Pure pairwise delta-rate computation over snapshot pairs.
//!
//! Nothing here does I/O or holds state: both entry points take a previous
//! and a current snapshot and return derived records plus the list of
//! entities that could not be paired. Policy decisions live here so every
//! caller gets them identically:
//!
//! - counters that went backwards clamp to a zero delta and flag the record
//!   `reset` instead of producing a negative rate;
//! - a zero CPU tick denominator yields an all-zero vector flagged
//!   `stalled`, never NaN or infinity;
//! - gauge fields are copied from the current snapshot, never differenced;
//! - unpaired entities are skipped and reported, not errors — one unplugged
//!   disk must not cost the whole tick.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::counters::{
    CPU_FIELDS, CounterKind, CpuField, CpuTimes, DISK_FIELDS, DiskCounters, DiskField,
};

/// Clamped counter delta: `current − previous`, or zero when the counter
/// went backwards (wrap, reset, device replaced). The flag reports whether
/// clamping happened.
fn clamped_delta(current: u64, previous: u64) -> (u64, bool) {
    if current >= previous {
        (current - previous, false)
    } else {
        (0, true)
    }
}

/// Anything the ranking heap can order: a derived record with a stable
/// entity identity for tie-breaking and display.
pub trait RateRecord {
    /// Stable entity identifier (CPU row label or device name).
    fn entity(&self) -> &str;
}

/// Per-CPU rate vector: every time-in-state field as a fraction of the
/// total ticks elapsed between the two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuRates {
    pub label: String,
    /// Fractions in [`CpuField`] order, each in `[0, 1]` for healthy
    /// counters.
    pub fractions: [f64; CPU_FIELDS],
    /// Some counter went backwards and its delta was clamped to zero.
    pub reset: bool,
    /// Zero ticks elapsed between the snapshots; the vector is all zeros.
    pub stalled: bool,
}

impl CpuRates {
    pub fn value(&self, field: CpuField) -> f64 {
        self.fractions[field as usize]
    }
}

impl RateRecord for CpuRates {
    fn entity(&self) -> &str {
        &self.label
    }
}

/// Per-disk rate vector: cumulative fields as raw per-interval deltas,
/// gauge fields copied from the current snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskRates {
    pub name: String,
    pub major: u32,
    pub minor: u32,
    /// Values in [`DiskField`] order.
    pub values: [f64; DISK_FIELDS],
    /// Some counter went backwards and its delta was clamped to zero.
    pub reset: bool,
}

impl DiskRates {
    pub fn value(&self, field: DiskField) -> f64 {
        self.values[field as usize]
    }
}

impl RateRecord for DiskRates {
    fn entity(&self) -> &str {
        &self.name
    }
}

/// Result of one pairwise rate computation.
///
/// `skipped` lists entities present in only one of the two snapshots (or
/// whose identity shifted), sorted and deduplicated; the tick continues
/// with whatever paired.
#[derive(Debug, Clone)]
pub struct RateSet<R> {
    pub records: Vec<R>,
    pub skipped: Vec<String>,
}

/// Compute per-CPU fractions from two consecutive /proc/stat snapshots.
///
/// Rows pair by position with label verification, so a core going offline
/// mid-run skips the affected rows rather than silently misattributing
/// deltas to the wrong core.
pub fn cpu_rates(previous: &[CpuTimes], current: &[CpuTimes]) -> RateSet<CpuRates> {
    let mut records = Vec::with_capacity(current.len());
    let mut skipped = Vec::new();

    for (i, cur) in current.iter().enumerate() {
        let prev = match previous.get(i) {
            Some(prev) if prev.label == cur.label => prev,
            Some(prev) => {
                // Identity shifted at this index; neither row is usable.
                skipped.push(cur.label.clone());
                skipped.push(prev.label.clone());
                continue;
            }
            None => {
                skipped.push(cur.label.clone());
                continue;
            }
        };

        let (denom, total_reset) = clamped_delta(cur.total(), prev.total());
        if denom == 0 {
            records.push(CpuRates {
                label: cur.label.clone(),
                fractions: [0.0; CPU_FIELDS],
                reset: total_reset,
                stalled: true,
            });
            continue;
        }

        let mut fractions = [0.0; CPU_FIELDS];
        let mut reset = false;
        for field in CpuField::ALL {
            let (delta, clamped) = clamped_delta(cur.value(field), prev.value(field));
            reset |= clamped;
            fractions[field as usize] = delta as f64 / denom as f64;
        }
        records.push(CpuRates {
            label: cur.label.clone(),
            fractions,
            reset,
            stalled: false,
        });
    }

    // Rows that existed before but are gone from the new snapshot.
    for prev in previous.iter().skip(current.len()) {
        skipped.push(prev.label.clone());
    }

    finish("cpu", records, skipped)
}

/// Compute per-disk deltas from two consecutive /proc/diskstats snapshots.
///
/// Devices pair by name, so adding or removing one device never misaligns
/// the others. Delta-vs-passthrough is dispatched on each field's
/// [`CounterKind`].
pub fn disk_rates(previous: &[DiskCounters], current: &[DiskCounters]) -> RateSet<DiskRates> {
    let by_name: HashMap<&str, &DiskCounters> =
        previous.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut records = Vec::with_capacity(current.len());
    let mut skipped = Vec::new();

    for cur in current {
        let Some(prev) = by_name.get(cur.name.as_str()) else {
            skipped.push(cur.name.clone());
            continue;
        };

        let mut values = [0.0; DISK_FIELDS];
        let mut reset = false;
        for field in DiskField::ALL {
            values[field as usize] = match field.kind() {
                CounterKind::Cumulative => {
                    let (delta, clamped) = clamped_delta(cur.value(field), prev.value(field));
                    reset |= clamped;
                    delta as f64
                }
                CounterKind::Gauge => cur.value(field) as f64,
            };
        }
        records.push(DiskRates {
            name: cur.name.clone(),
            major: cur.major,
            minor: cur.minor,
            values,
            reset,
        });
    }

    let current_names: HashSet<&str> = current.iter().map(|d| d.name.as_str()).collect();
    for prev in previous {
        if !current_names.contains(prev.name.as_str()) {
            skipped.push(prev.name.clone());
        }
    }

    finish("disk", records, skipped)
}

fn finish<R>(category: &str, records: Vec<R>, mut skipped: Vec<String>) -> RateSet<R> {
    skipped.sort();
    skipped.dedup();
    if !skipped.is_empty() {
        warn!(
            "{category} snapshot shape changed; unavailable this tick: {}",
            skipped.join(", ")
        );
    }
    RateSet { records, skipped }
}
