//! The host-visible, device-readable byte arena backing transient uploads.
//!
//! Creating the real buffer and its memory is the device layer's job; the cache only needs a
//! writable host view, a handle to hand back to draws, and a way to flush host writes.
//! [`HostArena`] is a plain in-memory implementation used by tests and headless tooling.

use std::ops::Range;

#[derive(Debug, Clone)]
pub struct ArenaDescriptor<'a> {
    pub label: Option<&'a str>,
    pub capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    #[error("arena allocation of {requested} bytes failed: {reason}")]
    AllocationFailed { requested: u64, reason: String },
}

/// A fixed-capacity buffer mapped for host writes and bound for device reads.
pub trait TransientArena {
    /// Device-side handle returned to callers alongside offsets.
    type Buffer: Clone;

    fn gpu_buffer(&self) -> Self::Buffer;

    fn capacity(&self) -> u64;

    /// The whole mapped host view, `capacity()` bytes long.
    fn host_mut(&mut self) -> &mut [u8];

    /// Make host writes to `range` visible to the device.
    fn flush(&mut self, range: Range<u64>);
}

/// Creates and destroys arenas.
pub trait ArenaProvider {
    type Arena: TransientArena;

    fn create_arena(&mut self, desc: &ArenaDescriptor<'_>) -> Result<Self::Arena, ArenaError>;

    fn destroy_arena(&mut self, arena: Self::Arena);
}

/// Opaque identifier for a [`HostArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostBufferId(pub u32);

/// Vec-backed arena that records every flush.
#[derive(Debug)]
pub struct HostArena {
    id: HostBufferId,
    label: Option<String>,
    bytes: Vec<u8>,
    flushes: Vec<Range<u64>>,
}

impl HostArena {
    pub fn new(id: HostBufferId, capacity: u64) -> Self {
        Self {
            id,
            label: None,
            bytes: vec![0u8; capacity as usize],
            flushes: Vec::new(),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Flushed ranges, oldest first.
    pub fn flushes(&self) -> &[Range<u64>] {
        &self.flushes
    }

    pub fn take_flushes(&mut self) -> Vec<Range<u64>> {
        std::mem::take(&mut self.flushes)
    }
}

impl TransientArena for HostArena {
    type Buffer = HostBufferId;

    fn gpu_buffer(&self) -> HostBufferId {
        self.id
    }

    fn capacity(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn host_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn flush(&mut self, range: Range<u64>) {
        debug_assert!(range.end <= self.bytes.len() as u64);
        self.flushes.push(range);
    }
}

/// Hands out [`HostArena`]s with increasing ids.
#[derive(Debug, Default)]
pub struct HostArenaProvider {
    next_id: u32,
    live: u32,
    /// Refuse arenas larger than this, to exercise setup failures.
    pub max_capacity: Option<u64>,
}

impl HostArenaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arenas created and not yet destroyed.
    pub fn live_arenas(&self) -> u32 {
        self.live
    }
}

impl ArenaProvider for HostArenaProvider {
    type Arena = HostArena;

    fn create_arena(&mut self, desc: &ArenaDescriptor<'_>) -> Result<HostArena, ArenaError> {
        if let Some(max) = self.max_capacity {
            if desc.capacity > max {
                return Err(ArenaError::AllocationFailed {
                    requested: desc.capacity,
                    reason: format!("exceeds provider limit of {max} bytes"),
                });
            }
        }
        if usize::try_from(desc.capacity).is_err() {
            return Err(ArenaError::AllocationFailed {
                requested: desc.capacity,
                reason: "does not fit in the host address space".to_string(),
            });
        }

        let id = HostBufferId(self.next_id);
        self.next_id += 1;
        self.live += 1;

        let mut arena = HostArena::new(id, desc.capacity);
        arena.label = desc.label.map(str::to_owned);
        Ok(arena)
    }

    fn destroy_arena(&mut self, arena: HostArena) {
        self.live -= 1;
        drop(arena);
    }
}
