//! The per-tick engine: acquire, rotate, rate, rank.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SampleError;
use crate::rank::TopK;
use crate::rate::{RateRecord, RateSet};
use crate::store::{SampleState, SnapshotStore};

/// One monitored counter category: how to acquire its raw records and how to
/// turn a previous/current snapshot pair into rate records.
///
/// [`CpuProbe`](crate::CpuProbe) and [`DiskProbe`](crate::DiskProbe) are the
/// procfs implementations; tests drive the engine with scripted ones.
pub trait CounterSource {
    /// Raw accumulating counters for one entity.
    type Raw;
    /// Derived per-entity record.
    type Rate: RateRecord;

    /// Stable category name used in logs.
    fn name(&self) -> &'static str;

    /// Read the current raw counters for every entity in the set.
    fn read(&mut self) -> Result<Vec<Self::Raw>, SampleError>;

    /// Pairwise rates for a previous/current snapshot pair.
    fn rates(&self, previous: &[Self::Raw], current: &[Self::Raw]) -> RateSet<Self::Rate>;
}

/// What one [`Sampler::sample`] call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleOutcome {
    /// Warm-up state after the advance.
    pub state: SampleState,
    /// Rate records computed this tick (zero while priming).
    pub records: usize,
    /// Entities present in only one of the two snapshots.
    pub skipped: Vec<String>,
}

/// Drives one counter category through the sample → rate → rank cycle.
///
/// The sampler owns its snapshot store and the per-tick ranking heap
/// exclusively. The driving loop calls [`sample`](Self::sample) once per
/// tick and then drains [`top`](Self::top); nothing here is shared, so no
/// locking is involved.
pub struct Sampler<S: CounterSource> {
    source: S,
    store: SnapshotStore<S::Raw>,
    key: Box<dyn Fn(&S::Rate) -> f64 + Send>,
    ranking: Option<TopK<S::Rate>>,
}

impl<S: CounterSource> Sampler<S> {
    /// A sampler over `source`, ranking by `key`.
    ///
    /// The key is fixed at configuration time; pass a field accessor such as
    /// `|r| r.value(CpuField::User)`.
    pub fn new<K>(source: S, key: K) -> Self
    where
        K: Fn(&S::Rate) -> f64 + Send + 'static,
    {
        Sampler {
            source,
            store: SnapshotStore::new(),
            key: Box::new(key),
            ranking: None,
        }
    }

    /// Advance the snapshot state and rebuild this tick's ranking.
    ///
    /// On an acquisition error the stored snapshots stay as they were, any
    /// unconsumed ranking is dropped, and the next call simply retries; a
    /// flaky counter source costs ticks, never the process.
    pub fn sample(&mut self) -> Result<SampleOutcome, SampleError> {
        let snapshot = match self.source.read() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.ranking = None;
                return Err(e);
            }
        };
        debug!("{}: read {} entities", self.source.name(), snapshot.len());

        let Some((previous, current)) = self.store.advance(snapshot) else {
            // First snapshot; nothing to rank yet.
            self.ranking = None;
            return Ok(SampleOutcome {
                state: self.store.state(),
                records: 0,
                skipped: Vec::new(),
            });
        };

        let RateSet { records, skipped } = self.source.rates(previous, current);
        let count = records.len();
        self.ranking = Some(TopK::build(records, |r| (self.key)(r)));

        Ok(SampleOutcome {
            state: self.store.state(),
            records: count,
            skipped,
        })
    }

    /// Drain up to `n` records in rank order, consuming this tick's heap.
    ///
    /// Returns [`SampleError::NotReady`] until two snapshots exist and
    /// [`SampleError::Exhausted`] when called again without an intervening
    /// [`sample`](Self::sample).
    pub fn top(&mut self, n: usize) -> Result<Vec<S::Rate>, SampleError> {
        if self.store.state() != SampleState::Steady {
            return Err(SampleError::NotReady);
        }
        let mut ranking = self.ranking.take().ok_or(SampleError::Exhausted)?;
        Ok(ranking.take(n))
    }

    /// Warm-up state of the underlying store.
    pub fn state(&self) -> SampleState {
        self.store.state()
    }

    /// Category name of the underlying source.
    pub fn name(&self) -> &'static str {
        self.source.name()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;
    use crate::counters::{CPU_FIELDS, CpuField, CpuTimes};
    use crate::rate::{CpuRates, cpu_rates};

    /// Serves pre-scripted snapshots in order, then errors.
    struct MockSource {
        frames: VecDeque<Vec<CpuTimes>>,
    }

    impl MockSource {
        fn new(frames: Vec<Vec<CpuTimes>>) -> Self {
            MockSource {
                frames: frames.into(),
            }
        }
    }

    impl CounterSource for MockSource {
        type Raw = CpuTimes;
        type Rate = CpuRates;

        fn name(&self) -> &'static str {
            "mock"
        }

        fn read(&mut self) -> Result<Vec<CpuTimes>, SampleError> {
            self.frames.pop_front().ok_or_else(|| {
                SampleError::acquire(
                    "mock",
                    io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"),
                )
            })
        }

        fn rates(&self, previous: &[CpuTimes], current: &[CpuTimes]) -> RateSet<CpuRates> {
            cpu_rates(previous, current)
        }
    }

    /// Always fails to read.
    struct FailingSource;

    impl CounterSource for FailingSource {
        type Raw = CpuTimes;
        type Rate = CpuRates;

        fn name(&self) -> &'static str {
            "failing"
        }

        fn read(&mut self) -> Result<Vec<CpuTimes>, SampleError> {
            Err(SampleError::acquire(
                "/proc/nowhere",
                io::Error::new(io::ErrorKind::NotFound, "gone"),
            ))
        }

        fn rates(&self, previous: &[CpuTimes], current: &[CpuTimes]) -> RateSet<CpuRates> {
            cpu_rates(previous, current)
        }
    }

    fn frame(rows: &[(u64, u64)]) -> Vec<CpuTimes> {
        rows.iter()
            .enumerate()
            .map(|(i, &(user, idle))| {
                let mut ticks = [0; CPU_FIELDS];
                ticks[CpuField::User as usize] = user;
                ticks[CpuField::Idle as usize] = idle;
                CpuTimes {
                    label: format!("cpu{i}"),
                    ticks,
                }
            })
            .collect()
    }

    fn user_key(r: &CpuRates) -> f64 {
        r.value(CpuField::User)
    }

    #[test]
    fn top_is_not_ready_until_two_samples_exist() {
        // cpu0 runs at 0.2 user over the pair, cpu1 at 0.1.
        let source = MockSource::new(vec![
            frame(&[(10, 1000), (10, 1000)]),
            frame(&[(30, 1080), (20, 1090)]),
        ]);
        let mut sampler = Sampler::new(source, user_key);

        assert_eq!(sampler.state(), SampleState::Empty);
        assert!(matches!(sampler.top(2), Err(SampleError::NotReady)));

        let outcome = sampler.sample().unwrap();
        assert_eq!(outcome.state, SampleState::Primed);
        assert_eq!(outcome.records, 0);
        assert!(matches!(sampler.top(2), Err(SampleError::NotReady)));

        let outcome = sampler.sample().unwrap();
        assert_eq!(outcome.state, SampleState::Steady);
        assert_eq!(outcome.records, 2);

        let top = sampler.top(2).unwrap();
        assert_eq!(top[0].label, "cpu0");
        assert_eq!(top[0].value(CpuField::User), 0.2);
        assert_eq!(top[1].label, "cpu1");
        assert_eq!(top[1].value(CpuField::User), 0.1);
    }

    #[test]
    fn second_top_in_one_cycle_is_exhausted() {
        let source = MockSource::new(vec![frame(&[(0, 0)]), frame(&[(5, 95)]), frame(&[(9, 191)])]);
        let mut sampler = Sampler::new(source, user_key);

        sampler.sample().unwrap();
        sampler.sample().unwrap();

        assert_eq!(sampler.top(1).unwrap().len(), 1);
        assert!(matches!(sampler.top(1), Err(SampleError::Exhausted)));

        // A fresh sample rebuilds the ranking.
        sampler.sample().unwrap();
        assert_eq!(sampler.top(1).unwrap().len(), 1);
    }

    #[test]
    fn top_caps_at_the_entity_count() {
        let source = MockSource::new(vec![frame(&[(1, 10), (2, 10), (3, 10)]), frame(&[(2, 20), (4, 20), (6, 20)])]);
        let mut sampler = Sampler::new(source, user_key);
        sampler.sample().unwrap();
        sampler.sample().unwrap();

        assert_eq!(sampler.top(100).unwrap().len(), 3);
    }

    #[test]
    fn acquisition_failure_skips_the_tick_not_the_process() {
        let source = MockSource::new(vec![frame(&[(10, 100)]), frame(&[(20, 200)])]);
        let mut sampler = Sampler::new(source, user_key);

        sampler.sample().unwrap();
        sampler.sample().unwrap();
        let _ = sampler.top(1).unwrap();

        // Script ran dry: the read fails, the sampler stays Steady and the
        // next successful read would resume where it left off.
        assert!(matches!(
            sampler.sample(),
            Err(SampleError::Acquire { .. })
        ));
        assert_eq!(sampler.state(), SampleState::Steady);
        assert!(matches!(sampler.top(1), Err(SampleError::Exhausted)));
    }

    #[test]
    fn failing_source_never_primes() {
        let mut sampler = Sampler::new(FailingSource, user_key);

        for _ in 0..3 {
            assert!(sampler.sample().is_err());
        }
        assert_eq!(sampler.state(), SampleState::Empty);
        assert!(matches!(sampler.top(1), Err(SampleError::NotReady)));
    }

    #[test]
    fn outcome_reports_entities_skipped_by_shape_changes() {
        // Second frame lost cpu1.
        let source = MockSource::new(vec![frame(&[(10, 0), (10, 0)]), frame(&[(30, 100)])]);
        let mut sampler = Sampler::new(source, user_key);

        sampler.sample().unwrap();
        let outcome = sampler.sample().unwrap();
        assert_eq!(outcome.records, 1);
        assert_eq!(outcome.skipped, ["cpu1"]);
    }
}
