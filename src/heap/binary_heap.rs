use crate::heap::MinHeap;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

// Binary heap with lazy deletion: outdated (value, key) pairs stay in the heap
// and are skipped when they reach the top.
pub struct BinaryHeap<K, V> {
    dict: HashMap<K, V>,
    heap: std::collections::BinaryHeap<Reverse<(V, usize, K)>>,
    count: usize,
}

impl<K, V> Default for BinaryHeap<K, V>
where
    K: Ord,
    V: Ord,
{
    fn default() -> Self {
        Self { dict: HashMap::new(), heap: std::collections::BinaryHeap::new(), count: 0 }
    }
}

impl<K, V> BinaryHeap<K, V>
where
    K: Copy + Eq + Hash + Ord,
    V: Copy + Ord,
{
    fn is_current(&self, key: &K, value: V) -> bool {
        self.dict.get(key).is_some_and(|&v| v == value)
    }

    fn push_entry(&mut self, key: K, value: V) {
        self.dict.insert(key, value);
        self.heap.push(Reverse((value, self.count, key)));
        self.count += 1;
    }
}

impl<K, V> MinHeap<K, V> for BinaryHeap<K, V>
where
    K: Copy + Eq + Hash + Ord,
    V: Copy + Ord,
{
    fn min(&mut self) -> Option<(K, V)> {
        while let Some(&Reverse((value, _, key))) = self.heap.peek() {
            if self.is_current(&key, value) {
                return Some((key, value));
            }
            self.heap.pop();
        }
        None
    }

    fn pop(&mut self) -> Option<(K, V)> {
        while let Some(Reverse((value, _, key))) = self.heap.pop() {
            if self.is_current(&key, value) {
                self.dict.remove(&key);
                return Some((key, value));
            }
        }
        None
    }

    fn get(&self, key: &K) -> Option<V> {
        self.dict.get(key).copied()
    }

    fn insert(&mut self, key: K, value: V, allow_increase: bool) -> bool {
        match self.dict.get(&key) {
            Some(&old_value) => {
                if value < old_value || (allow_increase && value > old_value) {
                    self.push_entry(key, value);
                    value < old_value
                } else {
                    false
                }
            }
            None => {
                self.push_entry(key, value);
                true
            }
        }
    }

    fn len(&self) -> usize {
        self.dict.len()
    }
}
