//! Concurrent interning table.
//!
//! Maps the canonical repr of a node to a dense index and stores the node,
//! its complexity and its repr under that index. Insert-or-fetch is atomic
//! per repr: two threads interning equal reprs always get the same index.

use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHasher;

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

/// An interned node together with its cached attributes.
#[derive(Debug, Clone)]
pub struct Interned<N> {
    pub node: N,
    pub complexity: usize,
    pub repr: Arc<str>,
}

pub struct Table<N> {
    index: FxDashMap<Arc<str>, u32>,
    data: FxDashMap<u32, Interned<N>>,
    next: AtomicU32,
}

impl<N> Default for Table<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Table<N> {
    pub fn new() -> Self {
        Self {
            index: DashMap::default(),
            data: DashMap::default(),
            next: AtomicU32::new(0),
        }
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.next.load(Ordering::Acquire) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up the index of a repr.
    pub fn find(&self, repr: &str) -> Option<u32> {
        self.index.get(repr).map(|i| *i)
    }
}

impl<N: Clone> Table<N> {
    /// Returns the index of the node with the given repr, inserting the
    /// node if it is new. The flag is true when the node was inserted.
    pub fn put(&self, repr: String, complexity: usize, node: N) -> (u32, bool) {
        if let Some(i) = self.index.get(repr.as_str()) {
            return (*i, false);
        }
        let repr: Arc<str> = Arc::from(repr);
        match self.index.entry(repr.clone()) {
            Entry::Occupied(e) => (*e.get(), false),
            Entry::Vacant(e) => {
                let i = self.next.fetch_add(1, Ordering::AcqRel);
                self.data.insert(i, Interned { node, complexity, repr });
                e.insert(i);
                (i, true)
            }
        }
    }

    /// Returns a copy of the node at the given index.
    pub fn get(&self, index: u32) -> Option<Interned<N>> {
        self.data.get(&index).map(|e| e.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_put_and_get() {
        let table = Table::new();
        let (a, fresh_a) = table.put("a".to_string(), 1, 'a');
        let (b, fresh_b) = table.put("b".to_string(), 1, 'b');
        let (a2, fresh_a2) = table.put("a".to_string(), 1, 'x');
        assert_eq!((a, b, a2), (0, 1, 0));
        assert!(fresh_a && fresh_b && !fresh_a2);
        assert_eq!(table.get(a).unwrap().node, 'a');
        assert_eq!(&*table.get(b).unwrap().repr, "b");
        assert_eq!(table.find("b"), Some(1));
        assert_eq!(table.find("c"), None);
        assert_eq!(table.len(), 2);
        assert!(table.get(2).is_none());
    }

    #[test]
    fn test_concurrent_put_is_dense() {
        let table = Table::new();
        thread::scope(|s| {
            for t in 0..4 {
                let table = &table;
                s.spawn(move || {
                    for i in 0..100 {
                        table.put(format!("n{}", (i * (t + 1)) % 100), 1, i);
                    }
                });
            }
        });
        assert_eq!(table.len(), 100);
        let mut indices: Vec<u32> = (0..100).map(|i| table.find(&format!("n{}", i)).unwrap()).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..100).collect::<Vec<_>>());
    }
}
