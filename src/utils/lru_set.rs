//! Least-recently-touched bounded set
//!
//! Keys live in a slab-backed doubly linked list ordered from least to most
//! recently touched, with a hash index into the slab. Insertion, lookup,
//! removal and eviction are all amortized O(1).

use std::collections::HashMap;
use std::hash::Hash;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Slot<K> {
    key: K,
    prev: usize,
    next: usize,
}

/// Bounded set with least-recently-touched eviction
#[derive(Debug, Clone)]
pub struct LruSet<K> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Slot<K>>,
    free: Vec<usize>,
    /// Least recently touched
    head: usize,
    /// Most recently touched
    tail: usize,
}

impl<K: Eq + Hash + Clone> LruSet<K> {
    pub fn new(capacity: usize) -> Self {
        LruSet {
            capacity,
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Insert or touch `key`, making it the most recently touched.
    ///
    /// Returns the key evicted to stay within capacity, if any. With a
    /// capacity of zero the inserted key itself is returned.
    pub fn insert(&mut self, key: K) -> Option<K> {
        if self.capacity == 0 {
            return Some(key);
        }
        if let Some(&idx) = self.index.get(&key) {
            self.move_to_back(idx);
            return None;
        }

        let idx = self.alloc(key.clone());
        self.push_back(idx);
        self.index.insert(key, idx);

        if self.index.len() > self.capacity {
            self.pop_front()
        } else {
            None
        }
    }

    /// Membership test that counts as a touch
    pub fn contains(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&idx) => {
                self.move_to_back(idx);
                true
            }
            None => false,
        }
    }

    /// Membership test that leaves recency untouched
    pub fn peek(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(idx) => {
                self.unlink(idx);
                self.free.push(idx);
                true
            }
            None => false,
        }
    }

    /// Key that the next overflow would evict
    pub fn least_recent(&self) -> Option<&K> {
        if self.head == NIL {
            None
        } else {
            Some(&self.slots[self.head].key)
        }
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Iterate from least to most recently touched
    pub fn iter(&self) -> Iter<'_, K> {
        Iter { set: self, cursor: self.head }
    }

    fn alloc(&mut self, key: K) -> usize {
        let slot = Slot { key, prev: NIL, next: NIL };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn pop_front(&mut self) -> Option<K> {
        if self.head == NIL {
            return None;
        }
        let idx = self.head;
        self.unlink(idx);
        let key = self.slots[idx].key.clone();
        self.index.remove(&key);
        self.free.push(idx);
        Some(key)
    }

    fn move_to_back(&mut self, idx: usize) {
        if self.tail == idx {
            return;
        }
        self.unlink(idx);
        self.push_back(idx);
    }

    fn push_back(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = NIL;
        if self.tail != NIL {
            self.slots[self.tail].next = idx;
        } else {
            self.head = idx;
        }
        self.tail = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }
}

/// Iterator over an [`LruSet`] in recency order
pub struct Iter<'a, K> {
    set: &'a LruSet<K>,
    cursor: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let slot = &self.set.slots[self.cursor];
        self.cursor = slot.next;
        Some(&slot.key)
    }
}
