//! Bounded sample history.
//!
//! FIFO ring of the most recent samples. Capacity is fixed at construction;
//! pushing into a full history evicts the oldest sample.

use std::collections::VecDeque;
use std::sync::Arc;

use super::sample::LocationSample;

/// Default number of samples retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Most recent N samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<Arc<LocationSample>>,
    capacity: usize,
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SampleHistory {
    /// Create an empty history. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, returning the evicted one if the history was full.
    pub fn push(&mut self, sample: Arc<LocationSample>) -> Option<Arc<LocationSample>> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<&Arc<LocationSample>> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<LocationSample>> {
        self.samples.iter()
    }

    /// Snapshot oldest to newest.
    pub fn to_vec(&self) -> Vec<Arc<LocationSample>> {
        self.samples.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::state::SampleSource;
    use chrono::Utc;

    fn sample(i: usize) -> Arc<LocationSample> {
        Arc::new(
            LocationSample::new(i as f64 * 0.1, 0.0, Utc::now(), SampleSource::Foreground)
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_history() {
        let history = SampleHistory::default();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = SampleHistory::new(3);

        for i in 0..3 {
            assert!(history.push(sample(i)).is_none());
        }

        let evicted = history.push(sample(3)).expect("full history evicts");
        assert_eq!(evicted.latitude(), 0.0);
        assert_eq!(history.len(), 3);

        let lats: Vec<f64> = history.iter().map(|s| s.latitude()).collect();
        assert_eq!(lats, vec![0.1, 0.2, 0.30000000000000004]);
    }

    #[test]
    fn test_150_into_100() {
        let mut history = SampleHistory::new(100);
        let mut evicted = 0;

        for i in 0..150 {
            if history.push(sample(i)).is_some() {
                evicted += 1;
            }
        }

        assert_eq!(history.len(), 100);
        assert_eq!(evicted, 50);
        assert!(Arc::ptr_eq(
            history.latest().unwrap(),
            history.to_vec().last().unwrap()
        ));
        assert_eq!(history.to_vec()[0].latitude(), 50.0 * 0.1);
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let mut history = SampleHistory::new(0);
        assert_eq!(history.capacity(), 1);

        history.push(sample(1));
        history.push(sample(2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().latitude(), 2.0 * 0.1);
    }
}
