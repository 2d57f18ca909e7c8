// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

/// An entry in the cache.
pub(crate) struct Entry<K, T> {
    pub(crate) epoch: u64,
    pub(crate) key: K,
    pub(crate) data: T,
}

/// A least-recently-used cache. This cache uses a linear scan of its entries
/// to find a given entry; it is meant for a handful of entries.
pub(crate) struct LruCache<K, T> {
    entries: Vec<Entry<K, T>>,
    epoch: u64,
    max_entries: usize,
}

impl<K: PartialEq, T> LruCache<K, T> {
    pub(crate) fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            epoch: 0,
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the index of the entry for `key`, creating it with `make_data`
    /// (and evicting the least recently used entry) if absent.
    pub(crate) fn entry_index(&mut self, key: K, make_data: impl FnOnce() -> T) -> usize {
        self.epoch += 1;
        let epoch = self.epoch;
        let mut lowest_epoch = epoch;
        let mut lowest_index = 0;
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if entry.key == key {
                entry.epoch = epoch;
                return i;
            }
            if entry.epoch < lowest_epoch {
                lowest_epoch = entry.epoch;
                lowest_index = i;
            }
        }
        let entry = Entry {
            epoch,
            key,
            data: make_data(),
        };
        if self.entries.len() < self.max_entries {
            self.entries.push(entry);
            self.entries.len() - 1
        } else {
            self.entries[lowest_index] = entry;
            lowest_index
        }
    }

    /// The data at an index returned by [`entry_index`](Self::entry_index)
    /// since the last eviction or clear.
    pub(crate) fn get(&self, index: usize) -> &T {
        &self.entries[index].data
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.entries[index].data
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
