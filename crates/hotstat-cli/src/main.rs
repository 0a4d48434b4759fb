//! hotstat — find the busiest CPUs and disks, one tick at a time.

mod report;

use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use hotstat_core::{
    CpuField, CpuProbe, CpuRates, CpuTopology, DiskField, DiskProbe, DiskRates, SampleError,
    SampleState, Sampler, cpu_topology, read_loadavg, read_meminfo, read_uptime,
};
use log::{debug, warn};

use report::{MemScale, TickReport};

#[derive(Parser)]
#[command(name = "hotstat")]
#[command(about = "Watch the busiest CPUs and disks on a Linux host")]
#[command(version = hotstat_core::VERSION)]
struct Args {
    /// Sample interval, e.g. "500ms", "2s", "1m" (bare numbers are seconds)
    #[arg(short, long, default_value = "1s")]
    interval: String,

    /// How many hot CPUs to display
    #[arg(short, long, default_value_t = 8)]
    cpus: usize,

    /// How many hot disks to display
    #[arg(short, long, default_value_t = 8)]
    disks: usize,

    /// Memory display unit: lowercase 1024-based, uppercase 1000-based
    #[arg(short, long, default_value = "m", value_name = "b|k|K|m|M|g|G|t|T")]
    mem_scale: MemScale,

    /// Show only disk activity
    #[arg(short = 'D', long)]
    disks_only: bool,

    /// CPU ranking field (user, system, iowait, ...)
    #[arg(long, default_value = "user")]
    cpu_metric: CpuField,

    /// Disk ranking field (writes-completed, sectors-read, ...)
    #[arg(long, default_value = "writes-completed")]
    disk_metric: DiskField,

    /// Stop after N reports (0 = run until Ctrl+C)
    #[arg(short = 'n', long, default_value_t = 0)]
    count: u64,

    /// Emit one JSON object per tick instead of text
    #[arg(long)]
    json: bool,

    /// Print a placeholder for the priming tick instead of staying quiet
    #[arg(long)]
    warmup: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let Some(interval) = parse_interval(&args.interval) else {
        eprintln!("Invalid interval: {}", args.interval);
        process::exit(1);
    };

    // Static header facts; zeros on kernels/arches that do not expose them.
    let topology = match cpu_topology() {
        Ok(t) => t,
        Err(e) => {
            warn!("cpu topology unavailable: {e}");
            CpuTopology::default()
        }
    };

    let cpu_metric = args.cpu_metric;
    let disk_metric = args.disk_metric;
    let mut cpus = Sampler::new(CpuProbe::new(), move |r: &CpuRates| r.value(cpu_metric));
    let mut disks = Sampler::new(DiskProbe::new(), move |r: &DiskRates| r.value(disk_metric));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let mut reports = 0u64;
    while running.load(Ordering::SeqCst) {
        match tick(&args, &topology, &mut cpus, &mut disks) {
            Ok(TickOutput::Report(text)) => {
                if !text.is_empty() {
                    println!("{text}");
                }
                reports += 1;
            }
            Ok(TickOutput::Warmup(line)) => println!("{line}"),
            Ok(TickOutput::Quiet) => {}
            Err(e) => warn!("tick skipped: {e}"),
        }

        if args.count != 0 && reports >= args.count {
            break;
        }

        // Sleep in short slices so Ctrl+C lands between ticks promptly.
        let deadline = Instant::now() + interval;
        while Instant::now() < deadline && running.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(10));
        }
    }
}

/// What one cycle produced for the display.
///
/// Only a `Report` counts toward `--count`; the `--warmup` placeholder is
/// display-only.
enum TickOutput {
    Report(String),
    Warmup(String),
    Quiet,
}

/// One sample → rate → rank → report cycle.
///
/// An `Err` means the tick was lost to an acquisition failure and the loop
/// should just go around again.
fn tick(
    args: &Args,
    topology: &CpuTopology,
    cpus: &mut Sampler<CpuProbe>,
    disks: &mut Sampler<DiskProbe>,
) -> Result<TickOutput, SampleError> {
    let disk_outcome = disks.sample()?;
    let cpu_outcome = if args.disks_only {
        None
    } else {
        Some(cpus.sample()?)
    };

    let steady = disk_outcome.state == SampleState::Steady
        && cpu_outcome
            .as_ref()
            .is_none_or(|o| o.state == SampleState::Steady);
    if !steady {
        debug!("priming tick, no rates yet");
        return Ok(if args.warmup {
            TickOutput::Warmup(report::warmup_line())
        } else {
            TickOutput::Quiet
        });
    }

    let (uptime, load, memory, cpu_top) = if args.disks_only {
        (None, None, None, Vec::new())
    } else {
        (
            try_read("uptime", read_uptime()),
            try_read("load average", read_loadavg()),
            try_read("meminfo", read_meminfo()),
            cpus.top(args.cpus)?,
        )
    };

    let report = TickReport {
        topology,
        uptime,
        load,
        memory,
        cpu_metric: args.cpu_metric,
        cpus: cpu_top,
        disk_metric: args.disk_metric,
        disks: disks.top(args.disks)?,
        mem_scale: args.mem_scale,
    };

    if args.json {
        match serde_json::to_string(&report) {
            Ok(line) => Ok(TickOutput::Report(line)),
            Err(e) => {
                warn!("json encoding failed: {e}");
                Ok(TickOutput::Quiet)
            }
        }
    } else {
        Ok(TickOutput::Report(report.to_text()))
    }
}

/// A passthrough read feeds one report section; losing it costs the section,
/// not the tick.
fn try_read<T>(what: &str, result: Result<T, SampleError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{what} unavailable: {e}");
            None
        }
    }
}

/// Parse an interval like "500ms", "2s", "1m", "1h"; bare numbers are
/// seconds. Zero is rejected — the tick loop needs a real period.
fn parse_interval(s: &str) -> Option<Duration> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        // Assume seconds
        (s, 1000)
    };

    let value: u64 = numeric.parse().ok()?;
    if value == 0 {
        return None;
    }
    Some(Duration::from_millis(value * multiplier))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn fixture_samplers() -> (
        tempfile::NamedTempFile,
        tempfile::NamedTempFile,
        Sampler<CpuProbe>,
        Sampler<DiskProbe>,
    ) {
        let mut stat = tempfile::NamedTempFile::new().unwrap();
        writeln!(stat, "cpu 100 0 100 800 0 0 0 0 0 0").unwrap();
        writeln!(stat, "cpu0 100 0 100 800 0 0 0 0 0 0").unwrap();
        let mut diskstats = tempfile::NamedTempFile::new().unwrap();
        writeln!(diskstats, "8 0 sda 10 0 80 4 20 0 160 9 0 13 13").unwrap();

        let cpus = Sampler::new(CpuProbe::with_path(stat.path()), |r: &CpuRates| {
            r.value(CpuField::User)
        });
        let disks = Sampler::new(DiskProbe::with_path(diskstats.path()), |r: &DiskRates| {
            r.value(DiskField::WritesCompleted)
        });
        (stat, diskstats, cpus, disks)
    }

    #[test]
    fn test_warmup_placeholder_is_not_a_report() {
        let (_stat, _diskstats, mut cpus, mut disks) = fixture_samplers();
        let args = Args::parse_from(["hotstat", "--warmup"]);
        let topology = CpuTopology::default();

        // Priming tick: the placeholder prints but must not count toward -n.
        let first = tick(&args, &topology, &mut cpus, &mut disks).unwrap();
        assert!(matches!(first, TickOutput::Warmup(_)));

        let second = tick(&args, &topology, &mut cpus, &mut disks).unwrap();
        assert!(matches!(second, TickOutput::Report(_)));
    }

    #[test]
    fn test_priming_tick_is_quiet_by_default() {
        let (_stat, _diskstats, mut cpus, mut disks) = fixture_samplers();
        let args = Args::parse_from(["hotstat"]);
        let topology = CpuTopology::default();

        let first = tick(&args, &topology, &mut cpus, &mut disks).unwrap();
        assert!(matches!(first, TickOutput::Quiet));
    }

    #[test]
    fn test_parse_interval_suffixes() {
        assert_eq!(parse_interval("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_interval("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_interval("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_interval("1h"), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_interval_bare_number_is_seconds() {
        assert_eq!(parse_interval("3"), Some(Duration::from_secs(3)));
        assert_eq!(parse_interval(" 1 "), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_parse_interval_rejects_zero_and_junk() {
        assert_eq!(parse_interval("0"), None);
        assert_eq!(parse_interval("0ms"), None);
        assert_eq!(parse_interval("fast"), None);
        assert_eq!(parse_interval(""), None);
        assert_eq!(parse_interval("-1s"), None);
    }

    #[test]
    fn test_args_parse_with_defaults() {
        let args = Args::parse_from(["hotstat"]);
        assert_eq!(args.interval, "1s");
        assert_eq!(args.cpus, 8);
        assert_eq!(args.disks, 8);
        assert_eq!(args.cpu_metric, CpuField::User);
        assert_eq!(args.disk_metric, DiskField::WritesCompleted);
        assert_eq!(args.count, 0);
        assert!(!args.disks_only && !args.json && !args.warmup);
    }

    #[test]
    fn test_args_parse_short_flags() {
        let args = Args::parse_from([
            "hotstat", "-i", "250ms", "-c", "4", "-d", "2", "-m", "g", "-D", "-n", "10",
        ]);
        assert_eq!(args.interval, "250ms");
        assert_eq!(args.cpus, 4);
        assert_eq!(args.disks, 2);
        assert_eq!(args.mem_scale.suffix(), 'g');
        assert!(args.disks_only);
        assert_eq!(args.count, 10);
    }

    #[test]
    fn test_args_parse_metric_flags() {
        let args = Args::parse_from([
            "hotstat",
            "--cpu-metric",
            "iowait",
            "--disk-metric",
            "sectors-read",
        ]);
        assert_eq!(args.cpu_metric, CpuField::Iowait);
        assert_eq!(args.disk_metric, DiskField::SectorsRead);
    }
}
