use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::fence::Fence;

/// Round `value` up to the nearest multiple of `alignment`.
///
/// `alignment` must be > 0.
pub(crate) fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment > 0);

    // `value + alignment - 1` can overflow if the user passes pathological
    // inputs, so use a checked path and fall back to saturating behaviour.
    let add = alignment - 1;
    match value.checked_add(add) {
        Some(v) => v / alignment * alignment,
        None => u64::MAX / alignment * alignment,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    /// No contiguous free span is large enough right now. Retiring fences may fix this.
    #[error(
        "transient ring exhausted: requested {requested} bytes (aligned {aligned}), {outstanding} bytes in flight"
    )]
    Exhausted {
        requested: u64,
        aligned: u64,
        outstanding: u64,
    },
    /// The request can never be satisfied, even by an empty ring.
    #[error("transient ring request of {requested} bytes exceeds capacity {capacity}")]
    TooLarge { requested: u64, capacity: u64 },
}

struct Allocation<F> {
    offset: u64,
    length: u64,
    fence: F,
}

/// A fence-bounded ring allocator over a fixed byte range `[0, capacity)`.
///
/// Allocations are handed out in order from a write cursor and retired in the same order once
/// their fence signals (see [`RingAllocator::scavenge`]). The oldest live allocation bounds how far
/// the cursor may advance, so a range is never handed out again while the GPU might still read it.
///
/// This is CPU-only bookkeeping: it tracks offsets, and the bytes live in whatever arena the
/// caller pairs it with.
pub struct RingAllocator<F> {
    capacity: u64,
    alignment: u64,
    write_head: u64,
    allocations: VecDeque<Allocation<F>>,
}

impl<F: Fence> RingAllocator<F> {
    /// `alignment` must be a power of two and `capacity` a non-zero multiple of it.
    pub fn new(capacity: u64, alignment: u64) -> Self {
        assert!(alignment.is_power_of_two(), "alignment must be a power of two");
        assert!(capacity > 0 && capacity % alignment == 0);
        Self {
            capacity,
            alignment,
            write_head: 0,
            allocations: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Offset the next allocation will try first.
    pub fn write_head(&self) -> u64 {
        self.write_head
    }

    /// Number of allocations whose fences have not yet been observed signaled.
    pub fn outstanding(&self) -> usize {
        self.allocations.len()
    }

    /// Aligned bytes held by outstanding allocations.
    pub fn bytes_outstanding(&self) -> u64 {
        self.allocations.iter().map(|a| a.length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Start of the oldest live allocation, if any.
    fn read_head(&self) -> Option<u64> {
        self.allocations.front().map(|a| a.offset)
    }

    /// Find a placement for `aligned` bytes without mutating state.
    fn place(&self, aligned: u64) -> Option<u64> {
        let Some(read_head) = self.read_head() else {
            // Nothing in flight: the whole ring is free.
            return Some(0);
        };

        if self.write_head > read_head {
            // Live data is [read_head, write_head). Free: the tail, then the head before read_head.
            if self.capacity - self.write_head >= aligned {
                Some(self.write_head)
            } else if read_head >= aligned {
                Some(0)
            } else {
                None
            }
        } else {
            // Wrapped: live data runs from read_head to the end and from 0 to write_head. Only
            // [write_head, read_head) is free. Equal heads with live data means full.
            if read_head - self.write_head >= aligned {
                Some(self.write_head)
            } else {
                None
            }
        }
    }

    /// Whether [`RingAllocator::acquire`] would currently succeed for `length` bytes.
    pub fn can_acquire(&self, length: u64) -> bool {
        let aligned = align_up(length.max(1), self.alignment);
        aligned <= self.capacity && self.place(aligned).is_some()
    }

    /// Claim `length` bytes (rounded up to the alignment) until `fence` signals.
    ///
    /// Zero-length requests still claim one alignment unit so every allocation has a distinct
    /// offset.
    pub fn acquire(&mut self, length: u64, fence: F) -> Result<u64, AcquireError> {
        let aligned = align_up(length.max(1), self.alignment);
        if aligned > self.capacity {
            return Err(AcquireError::TooLarge {
                requested: length,
                capacity: self.capacity,
            });
        }

        let Some(offset) = self.place(aligned) else {
            return Err(AcquireError::Exhausted {
                requested: length,
                aligned,
                outstanding: self.bytes_outstanding(),
            });
        };

        if offset == 0 && self.write_head != 0 && !self.allocations.is_empty() {
            tracing::debug!(
                skipped = self.capacity - self.write_head,
                "transient ring wrapped to start"
            );
        }

        self.allocations.push_back(Allocation {
            offset,
            length: aligned,
            fence,
        });
        self.write_head = offset + aligned;
        Ok(offset)
    }

    /// Retire the longest prefix of allocations whose fences have signaled, oldest first.
    ///
    /// Retirement stops at the first unsignaled fence even if later ones have signaled. Returns the
    /// number of allocations retired.
    pub fn scavenge(&mut self) -> usize {
        let mut retired = 0;
        while let Some(front) = self.allocations.front() {
            if !front.fence.is_signaled() {
                break;
            }
            self.allocations.pop_front();
            retired += 1;
        }

        if self.allocations.is_empty() {
            // Everything retired; start over at the base so the next request gets the largest
            // possible contiguous span.
            self.write_head = 0;
        }

        if retired > 0 {
            tracing::debug!(
                retired,
                outstanding = self.allocations.len(),
                write_head = self.write_head,
                "transient ring scavenged"
            );
        }
        retired
    }

    /// Block (without yielding) until the oldest allocation's fence signals or `timeout` elapses.
    ///
    /// Returns `true` if the ring is empty or the oldest fence signaled.
    pub fn wait_oldest(&self, timeout: Duration) -> bool {
        match self.allocations.front() {
            Some(front) => front.fence.wait(timeout),
            None => true,
        }
    }
}

impl<F> fmt::Debug for RingAllocator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingAllocator")
            .field("capacity", &self.capacity)
            .field("alignment", &self.alignment)
            .field("write_head", &self.write_head)
            .field("outstanding", &self.allocations.len())
            .finish()
    }
}
