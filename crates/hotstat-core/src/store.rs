//! Two-slot snapshot storage and the warm-up state machine.

use serde::{Deserialize, Serialize};

/// Where a store (or its sampler) is in the warm-up sequence.
///
/// The sequence only ever moves forward: `Empty` → `Primed` on the first
/// snapshot, `Primed` → `Steady` on the second, then `Steady` for the life
/// of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleState {
    /// No snapshot taken yet.
    Empty,
    /// Exactly one snapshot taken; a delta needs one more.
    Primed,
    /// Two or more snapshots taken; rates are available every tick.
    Steady,
}

/// Holds exactly the previous and current snapshot of one entity set.
///
/// Both slots are owned values: rotating never aliases or mutates a
/// snapshot, so `previous` and `current` stay independently readable until
/// the next [`advance`](Self::advance).
#[derive(Debug)]
pub struct SnapshotStore<T> {
    previous: Option<Vec<T>>,
    current: Option<Vec<T>>,
}

impl<T> SnapshotStore<T> {
    pub fn new() -> Self {
        SnapshotStore {
            previous: None,
            current: None,
        }
    }

    /// Install `snapshot` as current, demoting the old current to previous.
    ///
    /// Returns the `(previous, current)` pair once a previous exists, or
    /// `None` on the first call — no delta is derivable from one point.
    pub fn advance(&mut self, snapshot: Vec<T>) -> Option<(&[T], &[T])> {
        self.previous = self.current.take();
        self.current = Some(snapshot);
        match (&self.previous, &self.current) {
            (Some(prev), Some(cur)) => Some((prev.as_slice(), cur.as_slice())),
            _ => None,
        }
    }

    pub fn state(&self) -> SampleState {
        match (&self.previous, &self.current) {
            (None, None) => SampleState::Empty,
            (None, Some(_)) => SampleState::Primed,
            (Some(_), _) => SampleState::Steady,
        }
    }

    /// The snapshot installed by the latest `advance`, if any.
    pub fn current(&self) -> Option<&[T]> {
        self.current.as_deref()
    }

    /// The snapshot from the advance before that, if any.
    pub fn previous(&self) -> Option<&[T]> {
        self.previous.as_deref()
    }
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
