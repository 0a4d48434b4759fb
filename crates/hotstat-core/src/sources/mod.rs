//! Counter probes and single-value passthrough readers.
//!
//! The cpu and disk modules implement [`CounterSource`](crate::CounterSource)
//! over /proc; load, memory, and uptime are one-shot reads with no derived
//! state, printed alongside the rankings.

pub mod cpu;
pub mod disk;
pub mod load;
pub mod memory;
pub mod uptime;
