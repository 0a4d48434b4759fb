//! One-shot hot-entity report.
//!
//! Takes two snapshots one second apart and prints the five busiest CPUs
//! by user-time share and the five busiest disks by completed writes.
//!
//! Run: `cargo run --example basic`

use std::thread;
use std::time::Duration;

use hotstat_core::{CpuField, CpuProbe, CpuRates, DiskField, DiskProbe, DiskRates, Sampler};

fn main() {
    let mut cpus = Sampler::new(CpuProbe::new(), |r: &CpuRates| r.value(CpuField::User));
    let mut disks = Sampler::new(DiskProbe::new(), |r: &DiskRates| {
        r.value(DiskField::WritesCompleted)
    });

    // The first snapshot primes the window; the second makes rates available.
    cpus.sample().expect("reading /proc/stat");
    disks.sample().expect("reading /proc/diskstats");
    thread::sleep(Duration::from_secs(1));
    cpus.sample().expect("reading /proc/stat");
    disks.sample().expect("reading /proc/diskstats");

    println!("Top CPUs by user share:");
    for r in cpus.top(5).expect("ranked cpus") {
        println!("  {}: {:.3}", r.label, r.value(CpuField::User));
    }

    println!("\nTop disks by completed writes:");
    for r in disks.top(5).expect("ranked disks") {
        println!("  {}: {:.0}", r.name, r.value(DiskField::WritesCompleted));
    }
}
