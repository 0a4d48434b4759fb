//! Watch the busiest CPU over a few ticks.
//!
//! Samples /proc/stat once per second for ten ticks and prints whichever
//! row spent the largest share of the interval in user time.
//!
//! Run: `cargo run --example watch`

use std::thread;
use std::time::Duration;

use hotstat_core::{CpuField, CpuProbe, CpuRates, SampleState, Sampler};

fn main() {
    let mut sampler = Sampler::new(CpuProbe::new(), |r: &CpuRates| r.value(CpuField::User));

    for tick in 0..10 {
        let outcome = sampler.sample().expect("reading /proc/stat");
        if outcome.state != SampleState::Steady {
            println!("tick {tick}: warming up");
        } else {
            let top = sampler.top(1).expect("ranked cpus");
            let r = &top[0];
            println!(
                "tick {tick}: {} at {:.3} user ({} rows)",
                r.label,
                r.value(CpuField::User),
                outcome.records
            );
        }
        thread::sleep(Duration::from_secs(1));
    }
}
