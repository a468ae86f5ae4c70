//! Sorted, distinct timestamp sets.
//!
//! Edge timestamps are seconds as `f64`, exactly as the transmission feed
//! delivers them. `f64` has no total order in the standard collections, so
//! the set is a vector kept sorted under `f64::total_cmp`; the feed rejects
//! non-finite values before they reach this type.

use serde::{Deserialize, Serialize};

/// A sorted set of distinct transmission timestamps (seconds).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampSet(Vec<f64>);

impl TimestampSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary-order timestamps, sorting and deduplicating.
    pub fn from_unsorted(mut timestamps: Vec<f64>) -> Self {
        timestamps.sort_by(f64::total_cmp);
        timestamps.dedup();
        Self(timestamps)
    }

    /// Insert one timestamp, keeping the set sorted and distinct.
    pub fn insert(&mut self, t: f64) {
        match self.0.binary_search_by(|probe| probe.total_cmp(&t)) {
            Ok(_) => {}
            Err(pos) => self.0.insert(pos, t),
        }
    }

    /// Union `other` into this set.
    pub fn merge(&mut self, other: &TimestampSet) {
        for t in other.iter() {
            self.insert(t);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<f64> for TimestampSet {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_unsorted_sorts_and_dedups() {
        let set = TimestampSet::from_unsorted(vec![10.5, 10.0, 10.5, 9.9]);
        assert_eq!(set.as_slice(), &[9.9, 10.0, 10.5]);
    }

    #[test]
    fn insert_keeps_order_and_distinctness() {
        let mut set = TimestampSet::new();
        set.insert(2.0);
        set.insert(1.0);
        set.insert(2.0);
        set.insert(3.0);
        assert_eq!(set.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn merge_is_a_union() {
        let mut a = TimestampSet::from_unsorted(vec![1.0, 3.0]);
        let b = TimestampSet::from_unsorted(vec![2.0, 3.0]);
        a.merge(&b);
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0]);
    }
}
