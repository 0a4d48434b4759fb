//! Bounded top-K selection over rate records.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::rate::RateRecord;

/// Heap entry: the key is extracted once at build time so pops never call
/// back into user code.
struct Entry<R> {
    key: f64,
    id: String,
    record: R,
}

impl<R> Ord for Entry<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest key pops first; equal keys pop in ascending entity order,
        // so rankings are deterministic under ties.
        self.key
            .total_cmp(&other.key)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl<R> PartialOrd for Entry<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R> PartialEq for Entry<R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R> Eq for Entry<R> {}

/// A one-shot max-heap of rate records keyed by an injected metric.
///
/// Built in bulk from the full record set of one tick (O(n) heapify), popped
/// up to K times (O(log n) each), then discarded — cheaper than sorting
/// whenever K is small against the entity count, and cheap enough to rebuild
/// every tick at the entity counts involved here.
pub struct TopK<R> {
    heap: BinaryHeap<Entry<R>>,
}

impl<R: RateRecord> TopK<R> {
    /// Build the heap over `records`, ranking by `key`.
    ///
    /// The key is any metric extractor, typically a field accessor like
    /// `|r| r.value(CpuField::User)`; ordering uses the IEEE total order,
    /// so keys should be finite for the ranking to mean anything.
    pub fn build<K>(records: Vec<R>, key: K) -> Self
    where
        K: Fn(&R) -> f64,
    {
        let entries: Vec<Entry<R>> = records
            .into_iter()
            .map(|record| Entry {
                key: key(&record),
                id: record.entity().to_string(),
                record,
            })
            .collect();
        TopK {
            heap: BinaryHeap::from(entries),
        }
    }

    /// Pop the highest-ranked remaining record; `None` once drained.
    pub fn pop(&mut self) -> Option<R> {
        self.heap.pop().map(|e| e.record)
    }

    /// Pop up to `n` records in rank order; fewer if the heap drains first.
    pub fn take(&mut self, n: usize) -> Vec<R> {
        let mut out = Vec::with_capacity(n.min(self.heap.len()));
        while out.len() < n {
            match self.pop() {
                Some(record) => out.push(record),
                None => break,
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        busy: f64,
        other: f64,
    }

    impl RateRecord for Row {
        fn entity(&self) -> &str {
            self.id
        }
    }

    fn row(id: &'static str, busy: f64, other: f64) -> Row {
        Row { id, busy, other }
    }

    #[test]
    fn pops_in_descending_key_order() {
        let rows = vec![row("a", 0.1, 0.0), row("b", 0.9, 0.0), row("c", 0.5, 0.0)];
        let mut top = TopK::build(rows, |r| r.busy);

        let picked = top.take(2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].id, "b");
        assert_eq!(picked[1].id, "c");
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn equal_keys_break_ties_by_entity_ascending() {
        let rows = vec![row("sdc", 1.0, 0.0), row("sda", 1.0, 0.0), row("sdb", 1.0, 0.0)];
        let mut top = TopK::build(rows, |r| r.busy);

        let ids: Vec<&str> = top.take(3).iter().map(|r| r.id).collect();
        assert_eq!(ids, ["sda", "sdb", "sdc"]);
    }

    #[test]
    fn key_injection_changes_the_ranking() {
        let rows = vec![row("a", 0.9, 1.0), row("b", 0.1, 9.0)];

        let mut by_busy = TopK::build(rows.clone(), |r| r.busy);
        assert_eq!(by_busy.pop().unwrap().id, "a");

        let mut by_other = TopK::build(rows, |r| r.other);
        assert_eq!(by_other.pop().unwrap().id, "b");
    }

    #[test]
    fn empty_heap_pops_none_not_panic() {
        let mut top: TopK<Row> = TopK::build(Vec::new(), |r| r.busy);
        assert!(top.is_empty());
        assert!(top.pop().is_none());
        assert!(top.take(5).is_empty());
    }

    #[test]
    fn take_past_the_end_drains_and_stops() {
        let rows = vec![row("a", 2.0, 0.0), row("b", 1.0, 0.0)];
        let mut top = TopK::build(rows, |r| r.busy);

        let picked = top.take(10);
        assert_eq!(picked.len(), 2);
        assert_eq!(top.len(), 0);
        assert!(top.pop().is_none());
    }
}
