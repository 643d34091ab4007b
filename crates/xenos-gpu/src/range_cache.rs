//! Guest address range -> transient buffer offset cache.
//!
//! Vertex data is frequently re-fetched from the same guest range by several draws in a frame.
//! Once a range has been uploaded into the transient ring, later requests that fall entirely
//! inside it can reuse the converted bytes instead of swapping them again.
//!
//! Lookups only consult the nearest entry at or below the requested address. Inserting a range
//! evicts every entry that starts at or after it and lies entirely inside it. Entries that merely
//! overlap the new range (or start before it) are left alone; this is not an interval-merging
//! structure.

use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CachedRange {
    length: u32,
    offset: u64,
}

/// One cached upload, as reported by [`RangeCache::iter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub guest_address: u32,
    pub guest_length: u32,
    pub buffer_offset: u64,
}

impl CacheEntry {
    #[cfg(test)]
    fn end(&self) -> u64 {
        self.guest_address as u64 + self.guest_length as u64
    }
}

#[derive(Debug, Default, Clone)]
pub struct RangeCache {
    entries: BTreeMap<u32, CachedRange>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `[address, address + length)`.
    ///
    /// Hits only if the entry with the greatest start `<= address` contains the whole range; the
    /// returned offset is adjusted by the distance from that entry's start.
    pub fn find(&self, address: u32, length: u32) -> Option<u64> {
        let (&start, range) = self.entries.range(..=address).next_back()?;
        let entry_end = start as u64 + range.length as u64;
        let want_end = address as u64 + length as u64;
        if entry_end < want_end {
            return None;
        }
        Some(range.offset + (address - start) as u64)
    }

    /// Record that `[address, address + length)` now lives at `offset`.
    ///
    /// Replaces any entry with the same start, then drops every later entry that lies entirely
    /// within the new range.
    pub fn insert(&mut self, address: u32, length: u32, offset: u64) {
        self.entries.insert(address, CachedRange { length, offset });

        let end = address as u64 + length as u64;
        let contained: Vec<u32> = self
            .entries
            .range((Bound::Excluded(address), Bound::Unbounded))
            .take_while(|(&start, _)| (start as u64) < end)
            .filter(|(&start, range)| start as u64 + range.length as u64 <= end)
            .map(|(&start, _)| start)
            .collect();

        for start in contained {
            self.entries.remove(&start);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in ascending guest address order.
    pub fn iter(&self) -> impl Iterator<Item = CacheEntry> + '_ {
        self.entries.iter().map(|(&guest_address, range)| CacheEntry {
            guest_address,
            guest_length: range.length,
            buffer_offset: range.offset,
        })
    }

    /// Whether some later entry lies entirely inside the entry starting at `address`.
    #[cfg(test)]
    fn has_forward_containment_from(&self, address: u32) -> bool {
        let entries: Vec<_> = self.iter().collect();
        entries.iter().any(|outer| {
            outer.guest_address == address
                && entries.iter().any(|inner| {
                    inner.guest_address > outer.guest_address && inner.end() <= outer.end()
                })
        })
    }
}
