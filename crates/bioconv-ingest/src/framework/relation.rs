//! Relationship construction helpers
//!
//! Relationships between resolved entities are deduplicated by a composite
//! key. Undirected sources are expanded into both directions; a self pair
//! yields a single direction.

use std::collections::HashSet;
use std::hash::Hash;

/// Composite key of a directed relationship: `source->target`
pub fn composite_key(source: &str, target: &str) -> String {
    format!("{}->{}", source, target)
}

/// Directed pairs for an undirected relationship
///
/// `(a, b)` becomes `[(a, b), (b, a)]`; a self pair becomes `[(a, a)]`.
pub fn symmetric_pairs<T: PartialEq + Clone>(a: T, b: T) -> Vec<(T, T)> {
    if a == b {
        vec![(a.clone(), b)]
    } else {
        vec![(a.clone(), b.clone()), (b, a)]
    }
}

/// Remembers unordered pairs so `(a, b)` and `(b, a)` count once
#[derive(Debug)]
pub struct PairTracker<K> {
    seen: HashSet<(K, K)>,
}

impl<K> Default for PairTracker<K> {
    fn default() -> Self {
        Self { seen: HashSet::new() }
    }
}

impl<K: Eq + Hash + Ord + Clone> PairTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a pair is seen in either orientation
    pub fn first_sight(&mut self, a: &K, b: &K) -> bool {
        let pair = if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        self.seen.insert(pair)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_composite_key() {
        assert_eq!(composite_key("G1", "G2"), "G1->G2");
    }

    #[test]
    fn test_symmetric_pairs() {
        assert_eq!(symmetric_pairs("A", "B"), vec![("A", "B"), ("B", "A")]);
        assert_eq!(symmetric_pairs("A", "A"), vec![("A", "A")]);
    }

    #[test]
    fn test_pair_tracker_is_orientation_free() {
        let mut tracker = PairTracker::new();
        assert!(tracker.first_sight(&"P1".to_string(), &"P2".to_string()));
        assert!(!tracker.first_sight(&"P2".to_string(), &"P1".to_string()));
        assert!(tracker.first_sight(&"P1".to_string(), &"P3".to_string()));
        assert_eq!(tracker.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_symmetric_pairs_are_swapped(a in "[A-Z]{1,3}", b in "[A-Z]{1,3}") {
            let pairs = symmetric_pairs(a.clone(), b.clone());
            if a == b {
                prop_assert_eq!(pairs, vec![(a.clone(), a)]);
            } else {
                prop_assert_eq!(pairs.len(), 2);
                prop_assert_eq!(&pairs[0], &(a.clone(), b.clone()));
                prop_assert_eq!(&pairs[1], &(b, a));
            }
        }
    }
}
