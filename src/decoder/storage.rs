//! Per-data-unit recovery storage
//!
//! Flat preallocated arrays over the configured frame horizon: recovered
//! bytes, received flags, and per-unit decoding delay. A unit, once stored,
//! is sticky: later stores for the same index are ignored, so no recovery
//! path can revise or double-count it.

use bitvec::prelude::*;
use tracing::debug;

use super::stats::{DecodeResults, RecoveryPhase};

pub(crate) struct RecoveryStore {
    unit_size: usize,
    data: Vec<u8>,
    received: BitVec,
    delay: Vec<u32>,
    recovered: u32,
    phase_counts: [u32; 5],
    permanently_lost: u32,
}

impl RecoveryStore {
    pub(crate) fn new(unit_size: usize, horizon: usize) -> RecoveryStore {
        RecoveryStore {
            unit_size,
            data: vec![0; unit_size * horizon],
            received: bitvec![0; horizon],
            delay: vec![0; horizon],
            recovered: 0,
            phase_counts: [0; 5],
            permanently_lost: 0,
        }
    }

    pub(crate) fn horizon(&self) -> usize {
        self.received.len()
    }

    pub(crate) fn recovered(&self) -> u32 {
        self.recovered
    }

    pub(crate) fn is_received(&self, index: usize) -> bool {
        self.received[index]
    }

    pub(crate) fn unit(&self, index: usize) -> &[u8] {
        &self.data[index * self.unit_size..(index + 1) * self.unit_size]
    }

    pub(crate) fn delay_of(&self, index: usize) -> u32 {
        self.delay[index]
    }

    /// Store data unit `fcnt` (1-based), recovered at frame `current_fcnt`.
    pub(crate) fn store(&mut self, fcnt: u32, bytes: &[u8], current_fcnt: u32, phase: RecoveryPhase) {
        let index = fcnt as usize - 1;
        if self.received[index] {
            return;
        }
        self.data[index * self.unit_size..(index + 1) * self.unit_size].copy_from_slice(bytes);
        self.delay[index] = current_fcnt - fcnt;
        self.received.set(index, true);
        self.recovered += 1;
        self.phase_counts[phase.slot()] += 1;
        debug!(fcnt, phase = phase as u8, delay = current_fcnt - fcnt, "data unit stored");
    }

    /// Record that a data unit fell out of every reachable window.
    pub(crate) fn note_permanent_loss(&mut self, index: usize) {
        self.permanently_lost += 1;
        tracing::warn!(index, "data unit can no longer be recovered");
    }

    pub(crate) fn results(&self) -> DecodeResults {
        let mut delay_sum = 0.0;
        let mut count = 0u32;
        for index in self.received.iter_ones() {
            delay_sum += f64::from(self.delay[index]);
            count += 1;
        }
        let mean_delay = if count > 0 { delay_sum / f64::from(count) } else { 0.0 };

        let mut var_sum = 0.0;
        for index in self.received.iter_ones() {
            let diff = f64::from(self.delay[index]) - mean_delay;
            var_sum += diff * diff;
        }
        let delay_variance = if count > 0 { var_sum / f64::from(count) } else { 0.0 };

        DecodeResults {
            recovered: self.recovered,
            phase_counts: self.phase_counts,
            mean_delay,
            delay_variance,
            permanently_lost: self.permanently_lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_sticky() {
        let mut store = RecoveryStore::new(2, 10);
        store.store(3, &[0xaa, 0xbb], 3, RecoveryPhase::Direct);
        store.store(3, &[0xcc, 0xdd], 7, RecoveryPhase::Elimination);
        assert_eq!(store.unit(2), &[0xaa, 0xbb]);
        assert_eq!(store.delay_of(2), 0);
        assert_eq!(store.recovered(), 1);
        assert_eq!(store.results().phase_counts, [1, 0, 0, 0, 0]);
    }

    #[test]
    fn phase_counters_sum_to_recovered() {
        let mut store = RecoveryStore::new(1, 10);
        store.store(1, &[1], 1, RecoveryPhase::Direct);
        store.store(2, &[2], 4, RecoveryPhase::FreshParity);
        store.store(3, &[3], 5, RecoveryPhase::PeeledBuffer);
        store.store(4, &[4], 9, RecoveryPhase::Elimination);
        let results = store.results();
        assert_eq!(results.phase_counts.iter().sum::<u32>(), results.recovered);
    }

    #[test]
    fn delay_statistics() {
        let mut store = RecoveryStore::new(1, 4);
        store.store(1, &[1], 1, RecoveryPhase::Direct);
        store.store(2, &[2], 4, RecoveryPhase::FreshParity); // delay 2
        store.store(3, &[3], 7, RecoveryPhase::PeeledBuffer); // delay 4
        let results = store.results();
        assert_eq!(results.mean_delay, 2.0);
        // delays {0, 2, 4}: variance 8/3
        assert!((results.delay_variance - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_store_reports_zero_statistics() {
        let store = RecoveryStore::new(2, 5);
        let results = store.results();
        assert_eq!(results.recovered, 0);
        assert_eq!(results.mean_delay, 0.0);
        assert_eq!(results.delay_variance, 0.0);
    }
}
