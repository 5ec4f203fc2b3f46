//! Per-chain last-rendered height, used to emphasise rows that advanced.

#![allow(missing_docs)]

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    heights: HashMap<String, u64>,
}

impl ChangeTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `height` for `id`; true when it differs from the stored height
    /// or nothing was stored yet.
    pub fn mark_and_check(&mut self, id: &str, height: u64) -> bool {
        match self.heights.get_mut(id) {
            Some(stored) if *stored == height => false,
            Some(stored) => {
                *stored = height;
                true
            }
            None => {
                self.heights.insert(id.to_string(), height);
                true
            }
        }
    }

    #[must_use]
    pub fn last_height(&self, id: &str) -> Option<u64> {
        self.heights.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn reset(&mut self) {
        self.heights.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_a_change() {
        let mut tracker = ChangeTracker::new();
        assert!(tracker.mark_and_check("a", 100));
        assert_eq!(tracker.last_height("a"), Some(100));
    }

    #[test]
    fn same_height_twice_is_not_a_change() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_and_check("a", 100);
        assert!(!tracker.mark_and_check("a", 100));
        assert!(tracker.mark_and_check("a", 101));
        assert!(!tracker.mark_and_check("a", 101));
    }

    #[test]
    fn any_difference_counts_including_regressions() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_and_check("a", 100);
        assert!(tracker.mark_and_check("a", 90));
        assert_eq!(tracker.last_height("a"), Some(90));
    }

    #[test]
    fn identities_are_independent() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_and_check("a", 1);
        assert!(tracker.mark_and_check("b", 1));
        assert!(!tracker.mark_and_check("a", 1));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_and_check("a", 1);
        tracker.reset();
        assert!(tracker.is_empty());
        assert!(tracker.mark_and_check("a", 1));
    }
}
