use parking_lot::RwLock;
use thermowatch_protocol::Reading;
use thermowatch_protocol::constants::DEFAULT_HISTORY_CAPACITY;

use crate::buffer::RingBuffer;

/// Copy of the history window together with the sequence number of its
/// newest reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub readings: Vec<Reading>,
    /// Sequence number of the newest reading ever appended at the time of the
    /// snapshot; `0` if nothing was appended yet.
    pub last_seq: u64,
}

#[derive(Debug)]
struct Window {
    readings: RingBuffer<Reading>,
    last_seq: u64,
}

/// Bounded, ordered store of recent readings.
///
/// Every append gets a strictly increasing sequence number. All access goes
/// through one lock, so a snapshot observes either all or none of an append.
#[derive(Debug)]
pub struct HistoryStore {
    window: RwLock<Window>,
}

impl HistoryStore {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RwLock::new(Window {
                readings: RingBuffer::new(capacity),
                last_seq: 0,
            }),
        }
    }

    /// Appends a reading at the tail and returns its sequence number.
    ///
    /// Readings are kept in append order even if a timestamp is earlier than
    /// the current tail.
    pub fn append(&self, reading: Reading) -> u64 {
        let mut window = self.window.write();
        window.last_seq += 1;
        let seq = window.last_seq;
        if let Some(evicted) = window.readings.push(reading) {
            tracing::trace!(seq, evicted = evicted.value, "oldest reading evicted");
        }
        seq
    }

    /// Ordered copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<Reading> {
        self.window.read().readings.to_vec()
    }

    /// Ordered copy of the window plus the sequence number it reflects.
    pub fn sequenced_snapshot(&self) -> Snapshot {
        let window = self.window.read();
        Snapshot {
            readings: window.readings.to_vec(),
            last_seq: window.last_seq,
        }
    }

    /// The newest reading, if any.
    pub fn current(&self) -> Option<Reading> {
        self.window.read().readings.last().copied()
    }

    pub fn last_seq(&self) -> u64 {
        self.window.read().last_seq
    }

    pub fn len(&self) -> usize {
        self.window.read().readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.read().readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.read().readings.capacity()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn reading(value: f64) -> Reading {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Reading::new(value, base + Duration::seconds(value as i64))
    }

    fn values(readings: &[Reading]) -> Vec<f64> {
        readings.iter().map(|r| r.value).collect()
    }

    #[test]
    fn capacity_three_scenario() {
        let store = HistoryStore::new(3);
        for v in [0.0, 1.0, 2.0, 3.0] {
            store.append(reading(v));
        }

        assert_eq!(values(&store.snapshot()), vec![1.0, 2.0, 3.0]);
        assert_eq!(store.current().map(|r| r.value), Some(3.0));
    }

    #[test]
    fn window_is_bounded_for_any_overflow() {
        for cap in [1usize, 2, 5, 17] {
            for extra in 0..10usize {
                let store = HistoryStore::new(cap);
                let total = cap + extra;
                for i in 0..total {
                    store.append(reading(i as f64));
                }

                let snap = store.snapshot();
                assert_eq!(snap.len(), cap.min(total));
                let expected: Vec<f64> = (total - snap.len()..total).map(|i| i as f64).collect();
                assert_eq!(values(&snap), expected, "cap={cap} total={total}");
            }
        }
    }

    #[test]
    fn partial_fill_keeps_everything() {
        let store = HistoryStore::new(10);
        store.append(reading(1.0));
        store.append(reading(2.0));

        assert_eq!(store.len(), 2);
        assert_eq!(values(&store.snapshot()), vec![1.0, 2.0]);
    }

    #[test]
    fn empty_store() {
        let store = HistoryStore::default();

        assert!(store.is_empty());
        assert!(store.current().is_none());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(store.sequenced_snapshot().last_seq, 0);
    }

    #[test]
    fn out_of_order_timestamp_is_kept_in_append_order() {
        let store = HistoryStore::new(5);
        let late = reading(10.0);
        let early = reading(1.0);

        store.append(late);
        store.append(early);

        assert_eq!(store.snapshot(), vec![late, early]);
        assert_eq!(store.current(), Some(early));
    }

    #[test]
    fn sequence_numbers_increase_past_eviction() {
        let store = HistoryStore::new(2);
        let seqs: Vec<u64> = (0..5).map(|i| store.append(reading(i as f64))).collect();

        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        let snap = store.sequenced_snapshot();
        assert_eq!(snap.last_seq, 5);
        assert_eq!(values(&snap.readings), vec![3.0, 4.0]);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = HistoryStore::new(3);
        store.append(reading(1.0));
        let snap = store.snapshot();

        store.append(reading(2.0));

        assert_eq!(values(&snap), vec![1.0]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_snapshots_never_tear() {
        const CAP: usize = 16;
        const TOTAL: u64 = 20_000;

        let store = Arc::new(HistoryStore::new(CAP));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                for i in 0..TOTAL {
                    store.append(reading(i as f64));
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                std::thread::spawn(move || {
                    while !done.load(Ordering::SeqCst) {
                        let snap = store.sequenced_snapshot();
                        let n = snap.readings.len() as u64;
                        assert_eq!(n, snap.last_seq.min(CAP as u64));

                        // Reading i was appended with sequence number i + 1,
                        // so a consistent snapshot ends at last_seq - 1 and is
                        // contiguous.
                        for (offset, r) in snap.readings.iter().enumerate() {
                            let expected = snap.last_seq - n + offset as u64;
                            assert_eq!(r.value, expected as f64);
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.last_seq(), TOTAL);
    }
}
