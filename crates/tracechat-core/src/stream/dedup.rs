//! Per-connection duplicate frame suppression.

use std::collections::{HashSet, VecDeque};

use crate::config::DEFAULT_SEEN_EVENT_CAPACITY;

/// Bounded memory of `(event, data)` keys seen on one connection.
///
/// Keys are evicted oldest-first once `capacity` is reached, so a
/// long-lived stream cannot grow this without limit.
#[derive(Debug, Clone)]
pub struct SeenEvents {
    capacity: usize,
    order: VecDeque<String>,
    keys: HashSet<String>,
}

impl SeenEvents {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            keys: HashSet::with_capacity(capacity),
        }
    }

    /// Records the frame key and returns `true` if it was not seen before.
    /// A `false` return means the frame must be dropped.
    pub fn check_and_record(&mut self, event: &str, data: &str) -> bool {
        let key = format!("{event}-{data}");
        if self.keys.contains(&key) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
        self.keys.insert(key.clone());
        self.order.push_back(key);
        true
    }

    pub fn contains(&self, event: &str, data: &str) -> bool {
        self.keys.contains(&format!("{event}-{data}"))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.keys.clear();
    }
}

impl Default for SeenEvents {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SEEN_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_identical_frame_is_rejected() {
        let mut seen = SeenEvents::default();
        assert!(seen.check_and_record("done", "{}"));
        assert!(!seen.check_and_record("done", "{}"));
        assert!(seen.check_and_record("done", "{ }"));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_oldest_key_is_evicted() {
        let mut seen = SeenEvents::with_capacity(2);
        seen.check_and_record("a", "1");
        seen.check_and_record("b", "2");
        seen.check_and_record("c", "3");

        assert_eq!(seen.len(), 2);
        assert!(!seen.contains("a", "1"));
        assert!(seen.contains("c", "3"));
        // An evicted key is accepted again.
        assert!(seen.check_and_record("a", "1"));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut seen = SeenEvents::default();
        seen.check_and_record("x", "y");
        seen.clear();
        assert!(seen.is_empty());
        assert!(seen.check_and_record("x", "y"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(SeenEvents::with_capacity(0).capacity(), 1);
    }
}
