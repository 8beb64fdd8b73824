//! Bounded top-K selection by size.

use spacehog_core::FileEntry;

/// Anything that can be ranked by size.
pub trait HasSize {
    /// Size used for ranking.
    fn size(&self) -> u64;
}

impl HasSize for FileEntry {
    fn size(&self) -> u64 {
        self.size
    }
}

impl HasSize for u64 {
    fn size(&self) -> u64 {
        *self
    }
}

/// Keeps the `capacity` largest items seen so far, sorted descending.
///
/// Memory is O(K) regardless of how many items are offered. Once full, an
/// item no larger than the current floor is rejected in O(1); since most
/// files fall below the floor, that path dominates on large trees. Items of
/// equal size keep their insertion order.
#[derive(Debug, Clone)]
pub struct TopKSelector<T> {
    capacity: usize,
    items: Vec<T>,
}

impl<T: HasSize> TopKSelector<T> {
    /// Create a selector holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            // Avoid pre-allocating absurd capacities for "keep everything" configs.
            items: Vec::with_capacity(capacity.min(1024)),
        }
    }

    /// Check if an item of `size` would currently be kept.
    pub fn admits(&self, size: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        self.items.len() < self.capacity || self.floor().is_some_and(|floor| size > floor)
    }

    /// Offer an item. Returns `true` if it was kept.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.admits(item.size()) {
            return false;
        }

        let size = item.size();
        // First position whose size is strictly smaller: ties go after equals.
        let pos = self.items.partition_point(|held| held.size() >= size);
        self.items.insert(pos, item);
        if self.items.len() > self.capacity {
            self.items.pop();
        }
        true
    }

    /// Smallest size currently held.
    pub fn floor(&self) -> Option<u64> {
        self.items.last().map(HasSize::size)
    }

    /// Remove every item matching `predicate`. Returns how many were removed.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    /// Held items, largest first.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of items held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all held items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Take the held items, largest first.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: HasSize + Clone> TopKSelector<T> {
    /// Clone the held items, largest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn entry(name: &str, size: u64) -> FileEntry {
        FileEntry::new(
            format!("/r/{name}"),
            size,
            SystemTime::UNIX_EPOCH,
            Default::default(),
        )
    }

    #[test]
    fn test_keeps_largest_sorted() {
        let mut top = TopKSelector::new(2);
        for size in [100u64, 200, 300, 400, 500] {
            top.insert(size);
        }
        assert_eq!(top.as_slice(), &[500, 400]);
    }

    #[test]
    fn test_length_is_min_k_n() {
        let mut top = TopKSelector::new(10);
        for size in [3u64, 1, 2] {
            top.insert(size);
        }
        assert_eq!(top.into_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_rejects_at_or_below_floor_when_full() {
        let mut top = TopKSelector::new(2);
        assert!(top.insert(10u64));
        assert!(top.insert(20));
        assert!(!top.insert(10));
        assert!(!top.insert(5));
        assert!(top.insert(11));
        assert_eq!(top.as_slice(), &[20, 11]);
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let mut top = TopKSelector::new(0);
        assert!(!top.insert(u64::MAX));
        assert!(top.is_empty());
        assert!(!top.admits(1));
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let mut top = TopKSelector::new(4);
        top.insert(entry("first", 50));
        top.insert(entry("big", 90));
        top.insert(entry("second", 50));
        top.insert(entry("third", 50));
        top.insert(entry("fourth", 50));

        let names: Vec<_> = top
            .as_slice()
            .iter()
            .map(|e| e.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["big", "first", "second", "third"]);
    }

    #[test]
    fn test_zero_size_sorts_last() {
        let mut top = TopKSelector::new(3);
        top.insert(entry("empty", 0));
        top.insert(entry("some", 7));
        assert_eq!(top.as_slice()[1].size, 0);
        assert_eq!(top.floor(), Some(0));
    }

    #[test]
    fn test_remove_where() {
        let mut top = TopKSelector::new(5);
        for size in [1u64, 2, 3, 4] {
            top.insert(size);
        }
        assert_eq!(top.remove_where(|s| s % 2 == 0), 2);
        assert_eq!(top.as_slice(), &[3, 1]);
    }

    #[test]
    fn test_sorted_for_arbitrary_sequence() {
        let mut top = TopKSelector::new(7);
        let mut seed = 17u64;
        let mut all = Vec::new();
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let size = (seed >> 33) % 1000;
            all.push(size);
            top.insert(size);
        }
        all.sort_unstable_by(|a, b| b.cmp(a));
        all.truncate(7);
        assert_eq!(top.into_vec(), all);
    }
}
