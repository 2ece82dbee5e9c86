use std::collections::HashMap;
use std::hash::Hash;

/// Binary min-heap that tracks where each key sits, so entries can be
/// re-prioritised or removed from the middle.
#[derive(Debug, Clone)]
pub struct IndexedHeap<K> {
    entries: Vec<(f32, K)>,
    positions: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> Default for IndexedHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> IndexedHeap<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    pub fn priority(&self, key: &K) -> Option<f32> {
        self.positions.get(key).map(|&i| self.entries[i].0)
    }

    pub fn peek(&self) -> Option<(K, f32)> {
        self.entries.first().map(|&(p, k)| (k, p))
    }

    /// Insert `key`, or replace its priority if already queued.
    pub fn push(&mut self, key: K, priority: f32) {
        if let Some(&i) = self.positions.get(&key) {
            self.entries[i].0 = priority;
            self.sift_up(i);
            self.sift_down(i);
            return;
        }
        self.entries.push((priority, key));
        let i = self.entries.len() - 1;
        self.positions.insert(key, i);
        self.sift_up(i);
    }

    /// Remove the lowest-priority entry.
    pub fn pop(&mut self) -> Option<(K, f32)> {
        self.take(0).map(|(priority, key)| (key, priority))
    }

    /// Remove `key` wherever it sits in the heap.
    pub fn remove(&mut self, key: &K) -> Option<f32> {
        let i = *self.positions.get(key)?;
        self.take(i).map(|(priority, _)| priority)
    }

    /// Lower the priority of a queued key. Returns false if the key is absent
    /// or the new priority is not lower.
    pub fn decrease(&mut self, key: &K, priority: f32) -> bool {
        let Some(&i) = self.positions.get(key) else {
            return false;
        };
        if priority >= self.entries[i].0 {
            return false;
        }
        self.entries[i].0 = priority;
        self.sift_up(i);
        true
    }

    fn take(&mut self, i: usize) -> Option<(f32, K)> {
        let last = self.entries.len().checked_sub(1)?;
        self.swap(i, last);
        let removed = self.entries.pop()?;
        self.positions.remove(&removed.1);
        if i < self.entries.len() {
            self.sift_up(i);
            self.sift_down(i);
        }
        Some(removed)
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].1, a);
        self.positions.insert(self.entries[b].1, b);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.entries[i].0 >= self.entries[parent].0 {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < len && self.entries[left].0 < self.entries[smallest].0 {
                smallest = left;
            }
            if right < len && self.entries[right].0 < self.entries[smallest].0 {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.swap(i, smallest);
            i = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_priority_order() {
        let mut heap = IndexedHeap::new();
        for (k, p) in [(1u32, 5.0), (2, 1.0), (3, 9.0), (4, 3.0), (5, 7.0)] {
            heap.push(k, p);
        }
        let order: Vec<u32> = std::iter::from_fn(|| heap.pop().map(|(k, _)| k)).collect();
        assert_eq!(order, vec![2, 4, 1, 5, 3]);
        assert!(heap.is_empty());
    }

    #[test]
    fn remove_from_middle_keeps_heap_valid() {
        let mut heap = IndexedHeap::new();
        for k in 0..20u32 {
            heap.push(k, ((k * 7) % 20) as f32);
        }
        assert_eq!(heap.remove(&13), Some(((13 * 7) % 20) as f32));
        assert_eq!(heap.remove(&13), None);
        assert!(!heap.contains(&13));
        let mut last = f32::MIN;
        while let Some((_, p)) = heap.pop() {
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn decrease_reorders() {
        let mut heap = IndexedHeap::new();
        heap.push('a', 4.0);
        heap.push('b', 2.0);
        heap.push('c', 3.0);
        assert!(heap.decrease(&'a', 1.0));
        assert!(!heap.decrease(&'a', 8.0));
        assert!(!heap.decrease(&'z', 0.0));
        assert_eq!(heap.peek(), Some(('a', 1.0)));
        assert_eq!(heap.priority(&'c'), Some(3.0));
    }

    #[test]
    fn push_existing_updates_priority() {
        let mut heap = IndexedHeap::new();
        heap.push(1, 1.0);
        heap.push(2, 2.0);
        heap.push(1, 5.0);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.pop(), Some((2, 2.0)));
    }
}
