//! Open-run carryover between tiles.
//!
//! A [`CarryoverStore`] maps a line key (a diagonal offset or a column
//! index) to the length of a run that reached a tile's trailing edge and has
//! not been closed yet. Keys live in a dense slot array, since every key in
//! `min_key..=max_key` is touched at some point during a full run.
//!
//! Each key has a single writer at a time; the tile traversal order is what
//! guarantees it, not this type.

/// Dense map from line key to open run length. A length of 0 means absent.
#[derive(Debug, Clone)]
pub struct CarryoverStore {
    min_key: i64,
    slots: Vec<u64>,
    open: usize,
}

impl CarryoverStore {
    /// Store for keys in `min_key..=max_key`.
    pub fn new(min_key: i64, max_key: i64) -> Self {
        let len = usize::try_from(max_key - min_key + 1).unwrap_or(0);
        Self {
            min_key,
            slots: vec![0; len],
            open: 0,
        }
    }

    /// Store keyed by diagonal offset `-(n-1)..=n-1`.
    pub fn diagonals(n: usize) -> Self {
        let reach = n as i64 - 1;
        Self::new(-reach, reach)
    }

    /// Store keyed by column index `0..n`.
    pub fn columns(n: usize) -> Self {
        Self::new(0, n as i64 - 1)
    }

    #[inline]
    fn slot(&self, key: i64) -> usize {
        debug_assert!(
            key >= self.min_key && ((key - self.min_key) as usize) < self.slots.len(),
            "carryover key {key} out of range"
        );
        (key - self.min_key) as usize
    }

    /// Open run length for `key`, if any.
    #[inline]
    pub fn get(&self, key: i64) -> Option<u64> {
        match self.slots[self.slot(key)] {
            0 => None,
            len => Some(len),
        }
    }

    /// Record the open run for `key`; 0 clears the entry.
    #[inline]
    pub fn set(&mut self, key: i64, len: u64) {
        let slot = self.slot(key);
        let old = std::mem::replace(&mut self.slots[slot], len);
        match (old, len) {
            (0, l) if l > 0 => self.open += 1,
            (o, 0) if o > 0 => self.open -= 1,
            _ => {}
        }
    }

    /// Read and clear the entry for `key`, returning 0 if absent.
    #[inline]
    pub fn take(&mut self, key: i64) -> u64 {
        let len = self.get(key).unwrap_or(0);
        self.set(key, 0);
        len
    }

    /// Number of keys with an open run.
    #[inline]
    pub fn open_count(&self) -> usize {
        self.open
    }

    /// Remove every open `(key, length)` pair, in key order.
    ///
    /// The store is empty once this returns.
    pub fn drain(&mut self) -> Vec<(i64, u64)> {
        let min_key = self.min_key;
        let mut open = Vec::with_capacity(self.open);
        for (slot, len) in self.slots.iter_mut().enumerate() {
            if *len > 0 {
                open.push((min_key + slot as i64, std::mem::take(len)));
            }
        }
        self.open = 0;
        open
    }
}
