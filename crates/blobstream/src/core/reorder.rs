use std::collections::BTreeMap;

/// Holds items that completed ahead of an earlier sequence number and
/// releases them as a contiguous run starting at the next expected one.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next:    u64,
    pending: BTreeMap<u64, T>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self { Self::new() }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            next:    0,
            pending: BTreeMap::new(),
        }
    }

    /// Sequence number that must arrive before anything else is released.
    pub fn next_expected(&self) -> u64 { self.next }

    /// Stores a completed item. Items already released or already held are
    /// ignored, so nothing is ever delivered twice.
    pub fn insert(&mut self, seq: u64, item: T) -> bool {
        if seq < self.next || self.pending.contains_key(&seq) {
            return false;
        }
        self.pending.insert(seq, item);
        true
    }

    /// Releases the item for the next expected sequence number, if present.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    /// Number of items held back behind a gap.
    pub fn len(&self) -> usize { self.pending.len() }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    pub fn clear(&mut self) { self.pending.clear(); }
}
