use crate::heap::MinHeap;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    child: Option<usize>,
    next: Option<usize>,
    // left sibling, or the parent for a first child
    prev: Option<usize>,
}

// Pairing heap over an arena of nodes. Popped nodes are not reused.
pub struct PairingHeap<K, V> {
    nodes: Vec<Node<K, V>>,
    root: Option<usize>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for PairingHeap<K, V> {
    fn default() -> Self {
        Self { nodes: Vec::new(), root: None, index: HashMap::new() }
    }
}

impl<K, V> PairingHeap<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy + Ord,
{
    // make the root with the larger value a child of the other one
    fn link(&mut self, root: usize, other: usize) -> usize {
        let (root, other) = if self.nodes[other].value < self.nodes[root].value { (other, root) } else { (root, other) };

        let first_child = self.nodes[root].child;
        self.nodes[other].next = first_child;
        if let Some(c) = first_child {
            self.nodes[c].prev = Some(other);
        }
        self.nodes[other].prev = Some(root);
        self.nodes[root].child = Some(other);
        self.nodes[root].next = None;
        self.nodes[root].prev = None;
        root
    }

    // two-pass merge of a sibling list
    fn merge_children(&mut self, first: Option<usize>) -> Option<usize> {
        let mut siblings = Vec::new();
        let mut current = first;
        while let Some(c) = current {
            current = self.nodes[c].next;
            self.nodes[c].next = None;
            self.nodes[c].prev = None;
            siblings.push(c);
        }

        let mut paired = Vec::with_capacity(siblings.len() / 2 + 1);
        for pair in siblings.chunks(2) {
            match *pair {
                [a, b] => paired.push(self.link(a, b)),
                [a] => paired.push(a),
                _ => unreachable!(),
            }
        }

        let mut root = paired.pop()?;
        while let Some(u) = paired.pop() {
            root = self.link(u, root);
        }
        Some(root)
    }

    // detach a non-root node (with its subtree) from its parent
    fn cut(&mut self, u: usize) {
        let next = self.nodes[u].next;
        if let Some(prev) = self.nodes[u].prev {
            if self.nodes[prev].child == Some(u) {
                self.nodes[prev].child = next;
            } else {
                self.nodes[prev].next = next;
            }
        }
        if let Some(n) = next {
            self.nodes[n].prev = self.nodes[u].prev;
        }
        self.nodes[u].next = None;
        self.nodes[u].prev = None;
    }

    fn meld_into_root(&mut self, u: usize) {
        self.root = Some(match self.root {
            Some(r) => self.link(r, u),
            None => u,
        });
    }
}

impl<K, V> MinHeap<K, V> for PairingHeap<K, V>
where
    K: Copy + Eq + Hash,
    V: Copy + Ord,
{
    fn min(&mut self) -> Option<(K, V)> {
        self.root.map(|r| (self.nodes[r].key, self.nodes[r].value))
    }

    fn pop(&mut self) -> Option<(K, V)> {
        let r = self.root?;
        let (key, value) = (self.nodes[r].key, self.nodes[r].value);
        self.index.remove(&key);
        let child = self.nodes[r].child.take();
        self.root = self.merge_children(child);
        Some((key, value))
    }

    fn get(&self, key: &K) -> Option<V> {
        self.index.get(key).map(|&u| self.nodes[u].value)
    }

    fn insert(&mut self, key: K, value: V, allow_increase: bool) -> bool {
        let Some(&u) = self.index.get(&key) else {
            self.nodes.push(Node { key, value, child: None, next: None, prev: None });
            let u = self.nodes.len() - 1;
            self.index.insert(key, u);
            self.meld_into_root(u);
            return true;
        };

        let old_value = self.nodes[u].value;
        if value < old_value {
            self.nodes[u].value = value;
            if self.root != Some(u) {
                self.cut(u);
                self.meld_into_root(u);
            }
            true
        } else if allow_increase && value > old_value {
            self.nodes[u].value = value;
            let child = self.nodes[u].child.take();
            let children = self.merge_children(child);
            if self.root == Some(u) {
                self.root = None;
            } else {
                self.cut(u);
            }
            self.meld_into_root(u);
            if let Some(c) = children {
                self.meld_into_root(c);
            }
            false
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
