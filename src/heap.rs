mod binary_heap;
mod pairing_heap;

pub use binary_heap::BinaryHeap;
pub use pairing_heap::PairingHeap;

// Min-heap keyed by K with values V. A key appears at most once.
pub trait MinHeap<K, V>: Default {
    // (key, value) with the smallest value, without removing it
    fn min(&mut self) -> Option<(K, V)>;

    fn pop(&mut self) -> Option<(K, V)>;

    fn get(&self, key: &K) -> Option<V>;

    // Insert a new key or update an existing one. The value of an existing key
    // is only raised when allow_increase is set.
    // returns true iff the key is new or its value strictly decreased
    fn insert(&mut self, key: K, value: V, allow_increase: bool) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
