//! # hotstat-core
//!
//! Delta-rate sampling and bounded top-K ranking over Linux procfs
//! counters.
//!
//! The kernel exports CPU time-in-state and per-disk I/O activity as
//! monotonically accumulating counters. One reading of those numbers says
//! nothing about *now*; two consecutive readings do. This crate owns that
//! two-snapshot window: it rotates snapshots, turns counter deltas into
//! per-entity rate vectors, and pulls the busiest entities through a
//! bounded max-heap instead of sorting the whole set.
//!
//! ## Quick start
//!
//! ```no_run
//! use hotstat_core::{CpuField, CpuProbe, SampleError, Sampler};
//!
//! fn main() -> Result<(), SampleError> {
//!     let mut cpus = Sampler::new(CpuProbe::new(), |r| r.value(CpuField::User));
//!
//!     cpus.sample()?; // priming read; no rates yet
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//!     cpus.sample()?;
//!
//!     for rate in cpus.top(4)? {
//!         println!("{}: user {:.3}", rate.label, rate.value(CpuField::User));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`counters`] — raw record types and the field catalogs pinning their
//!   layout, with counter/gauge kind tags.
//! - [`store`] — the two-slot [`SnapshotStore`] and the warm-up
//!   [`SampleState`] machine.
//! - [`rate`] — pure pairwise delta-rate computation and its edge-case
//!   policies (clamping, zero denominators, unpaired entities).
//! - [`rank`] — the one-shot [`TopK`] max-heap with an injected ranking
//!   key.
//! - [`sampler`] — the [`CounterSource`] seam and the per-tick [`Sampler`]
//!   engine gluing the above together.
//! - [`sources`] — the procfs probes plus the load/uptime/memory
//!   passthrough readers shown alongside the rankings.

pub mod counters;
pub mod error;
pub mod rank;
pub mod rate;
pub mod sampler;
pub mod sources;
pub mod store;

pub use counters::{
    CPU_FIELDS, CounterKind, CpuField, CpuTimes, DISK_FIELDS, DiskCounters, DiskField,
};
pub use error::SampleError;
pub use rank::TopK;
pub use rate::{CpuRates, DiskRates, RateRecord, RateSet, cpu_rates, disk_rates};
pub use sampler::{CounterSource, SampleOutcome, Sampler};
pub use sources::cpu::{CpuProbe, CpuTopology, cpu_topology, topology_from_path};
pub use sources::disk::DiskProbe;
pub use sources::load::{LoadAvg, read_loadavg};
pub use sources::memory::{MemoryInfo, meminfo_from_path, read_meminfo};
pub use sources::uptime::{Uptime, read_uptime};
pub use store::{SampleState, SnapshotStore};

/// Crate version, wired into the CLI's `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
