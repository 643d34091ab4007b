use std::ops::Range;

use tracing::{debug, info, trace, warn};

use crate::arena::{ArenaDescriptor, ArenaProvider, TransientArena};
use crate::barrier::{BufferBarrier, CommandSink};
use crate::config::{BufferCacheConfig, FlushMode};
use crate::error::{InitError, UploadError};
use crate::fence::Fence;
use crate::guest_memory::{GuestMemory, GuestMemoryError};
use crate::range_cache::RangeCache;
use crate::registers::{
    PrimitiveRestart, RegisterFile, BOOL_CONSTANT_WORDS, FLOAT_CONSTANT_WORDS,
    LOOP_CONSTANT_WORDS, SHADER_CONSTANT_000_X, SHADER_CONSTANT_BOOL_000_031,
    SHADER_CONSTANT_LOOP_00,
};
use crate::ring::RingAllocator;
use crate::stats::BufferCacheStats;

/// Bytes in one constant upload:
///
/// ```text
/// struct {
///   vec4 float[512];
///   uint bool[8];
///   uint loop[32];
/// };
/// ```
pub const UNIFORM_REGION_SIZE: u64 =
    ((FLOAT_CONSTANT_WORDS + BOOL_CONSTANT_WORDS + LOOP_CONSTANT_WORDS) * 4) as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Int16,
    Int32,
}

impl IndexFormat {
    pub fn size_bytes(self) -> u32 {
        match self {
            IndexFormat::Int16 => 2,
            IndexFormat::Int32 => 4,
        }
    }
}

/// Guest data endianness, as encoded in Xenos fetch constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    None,
    /// Bytes swapped within 16-bit words.
    Swap8In16,
    /// Bytes reversed within 32-bit words.
    Swap8In32,
    /// 16-bit halves swapped within 32-bit words.
    Swap16In32,
}

/// A range of the transient buffer ready to be bound by a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientRegion<B> {
    pub buffer: B,
    pub offset: u64,
    pub size: u64,
}

/// Streams per-draw data from guest memory into a fence-bounded transient arena.
///
/// Every upload allocates from a [`RingAllocator`] tied to the caller's fence, converts the guest
/// bytes into the arena, flushes them and appends a barrier to the caller's command sequence.
/// Vertex uploads are additionally remembered in a [`RangeCache`] so repeated fetches of the same
/// guest range reuse the converted bytes.
///
/// The cache is single-threaded: it is driven by whoever is recording the command sequence.
pub struct BufferCache<A: TransientArena, F: Fence> {
    config: BufferCacheConfig,
    arena: A,
    ring: RingAllocator<F>,
    ranges: RangeCache,
    stats: BufferCacheStats,
}

impl<A: TransientArena, F: Fence> BufferCache<A, F> {
    /// Create the arena and allocator. A failed initialize leaves nothing to shut down.
    pub fn initialize<P>(provider: &mut P, config: BufferCacheConfig) -> Result<Self, InitError>
    where
        P: ArenaProvider<Arena = A>,
    {
        config.validate().map_err(InitError::InvalidConfig)?;

        let mut arena = provider.create_arena(&ArenaDescriptor {
            label: config.label.as_deref(),
            capacity: config.capacity,
        })?;

        let actual = arena.capacity();
        let mapped = arena.host_mut().len() as u64;
        if actual != config.capacity || mapped != config.capacity {
            provider.destroy_arena(arena);
            return Err(InitError::CapacityMismatch {
                expected: config.capacity,
                actual: actual.min(mapped),
            });
        }

        info!(
            label = config.label.as_deref().unwrap_or(""),
            capacity = config.capacity,
            alignment = config.alignment,
            flush_mode = ?config.flush_mode,
            "transient buffer cache initialized"
        );

        Ok(Self {
            ring: RingAllocator::new(config.capacity, config.alignment),
            ranges: RangeCache::new(),
            stats: BufferCacheStats::default(),
            arena,
            config,
        })
    }

    /// Release the arena.
    ///
    /// Outstanding allocations are dropped with it; the caller must ensure the GPU is idle.
    pub fn shutdown<P>(self, provider: &mut P)
    where
        P: ArenaProvider<Arena = A>,
    {
        if !self.ring.is_empty() {
            warn!(
                outstanding = self.ring.outstanding(),
                "shutting down transient buffer cache with allocations in flight"
            );
        }
        info!(stats = ?self.stats, "transient buffer cache shut down");
        provider.destroy_arena(self.arena);
    }

    pub fn config(&self) -> &BufferCacheConfig {
        &self.config
    }

    pub fn stats(&self) -> BufferCacheStats {
        self.stats
    }

    pub fn gpu_buffer(&self) -> A::Buffer {
        self.arena.gpu_buffer()
    }

    pub fn arena(&self) -> &A {
        &self.arena
    }

    pub fn ring(&self) -> &RingAllocator<F> {
        &self.ring
    }

    pub fn range_cache(&self) -> &RangeCache {
        &self.ranges
    }

    /// Snapshot the float, bool and loop constant blocks into a fresh uniform region.
    ///
    /// The register file already holds host-order values, so this is a verbatim copy.
    pub fn upload_constants(
        &mut self,
        regs: &dyn RegisterFile,
        sink: &mut dyn CommandSink<A::Buffer>,
        fence: F,
    ) -> Result<TransientRegion<A::Buffer>, UploadError> {
        let offset = self.allocate_transient_data(UNIFORM_REGION_SIZE, fence)?;

        {
            let dst = self.host_range(offset, UNIFORM_REGION_SIZE);
            let (float_dst, rest) = dst.split_at_mut(FLOAT_CONSTANT_WORDS * 4);
            let (bool_dst, loop_dst) = rest.split_at_mut(BOOL_CONSTANT_WORDS * 4);

            float_dst.copy_from_slice(bytemuck::cast_slice(
                regs.values(SHADER_CONSTANT_000_X, FLOAT_CONSTANT_WORDS),
            ));
            bool_dst.copy_from_slice(bytemuck::cast_slice(
                regs.values(SHADER_CONSTANT_BOOL_000_031, BOOL_CONSTANT_WORDS),
            ));
            loop_dst.copy_from_slice(bytemuck::cast_slice(
                regs.values(SHADER_CONSTANT_LOOP_00, LOOP_CONSTANT_WORDS),
            ));
        }

        self.flush_range(offset..offset + UNIFORM_REGION_SIZE);
        let buffer = self.arena.gpu_buffer();
        sink.pipeline_barrier(BufferBarrier::host_to_uniform(
            buffer.clone(),
            offset,
            UNIFORM_REGION_SIZE,
        ));

        self.stats.constant_uploads += 1;
        self.stats.bytes_uploaded += UNIFORM_REGION_SIZE;
        trace!(offset, "uploaded shader constants");

        Ok(TransientRegion {
            buffer,
            offset,
            size: UNIFORM_REGION_SIZE,
        })
    }

    /// Convert and upload an index buffer.
    ///
    /// Never cached: the primitive-restart substitution depends on register state at the time of
    /// the draw. With restart enabled, indices equal to the guest reset index become the host
    /// all-ones restart value.
    #[allow(clippy::too_many_arguments)]
    pub fn upload_index_buffer(
        &mut self,
        memory: &dyn GuestMemory,
        regs: &dyn RegisterFile,
        sink: &mut dyn CommandSink<A::Buffer>,
        guest_address: u32,
        guest_length: u32,
        format: IndexFormat,
        fence: F,
    ) -> Result<TransientRegion<A::Buffer>, UploadError> {
        let src = guest_view(memory, guest_address, guest_length)?;
        let restart = PrimitiveRestart::from_registers(regs);
        let size = guest_length as u64;
        let offset = self.allocate_transient_data(size, fence)?;

        {
            let dst = self.host_range(offset, size);
            let count = (guest_length / format.size_bytes()) as usize;
            match (format, restart.enabled) {
                (IndexFormat::Int16, true) => {
                    xenos_endian::copy_cmp_swap_16(dst, src, restart.index as u16, count)
                }
                (IndexFormat::Int16, false) => xenos_endian::copy_and_swap_16(dst, src, count),
                (IndexFormat::Int32, true) => {
                    xenos_endian::copy_cmp_swap_32(dst, src, restart.index, count)
                }
                (IndexFormat::Int32, false) => xenos_endian::copy_and_swap_32(dst, src, count),
            }
            copy_trailing_bytes(dst, src, count * format.size_bytes() as usize);
        }
        self.stats.copies += 1;

        self.flush_range(offset..offset + size);
        let buffer = self.arena.gpu_buffer();
        sink.pipeline_barrier(BufferBarrier::host_to_index(buffer.clone(), offset, size));

        self.stats.index_uploads += 1;
        self.stats.bytes_uploaded += size;
        trace!(
            guest_address,
            guest_length,
            ?format,
            restart = restart.enabled,
            offset,
            "uploaded index buffer"
        );

        Ok(TransientRegion {
            buffer,
            offset,
            size,
        })
    }

    /// Convert and upload vertex data, reusing a previous upload that covers the same range.
    pub fn upload_vertex_buffer(
        &mut self,
        memory: &dyn GuestMemory,
        sink: &mut dyn CommandSink<A::Buffer>,
        guest_address: u32,
        guest_length: u32,
        endian: Endian,
        fence: F,
    ) -> Result<TransientRegion<A::Buffer>, UploadError> {
        let convert: fn(&mut [u8], &[u8], usize) = match endian {
            Endian::Swap8In32 => xenos_endian::copy_and_swap_32,
            Endian::Swap16In32 => xenos_endian::copy_and_swap_16_in_32,
            Endian::None | Endian::Swap8In16 => {
                return Err(UploadError::UnsupportedEndian(endian))
            }
        };
        self.stats.vertex_uploads += 1;
        let size = guest_length as u64;

        if let Some(offset) = self.ranges.find(guest_address, guest_length) {
            self.stats.vertex_cache_hits += 1;
            trace!(guest_address, guest_length, offset, "vertex range cache hit");
            return Ok(TransientRegion {
                buffer: self.arena.gpu_buffer(),
                offset,
                size,
            });
        }
        self.stats.vertex_cache_misses += 1;

        let src = guest_view(memory, guest_address, guest_length)?;
        let offset = self.allocate_transient_data(size, fence)?;

        {
            let dst = self.host_range(offset, size);
            let count = (guest_length / 4) as usize;
            convert(dst, src, count);
            copy_trailing_bytes(dst, src, count * 4);
        }
        self.stats.copies += 1;

        self.flush_range(offset..offset + size);
        let buffer = self.arena.gpu_buffer();
        sink.pipeline_barrier(BufferBarrier::host_to_vertex(buffer.clone(), offset, size));

        self.ranges.insert(guest_address, guest_length, offset);
        self.stats.bytes_uploaded += size;
        trace!(
            guest_address,
            guest_length,
            ?endian,
            offset,
            "uploaded vertex buffer"
        );

        Ok(TransientRegion {
            buffer,
            offset,
            size,
        })
    }

    /// Allocate `length` bytes bound to `fence`, scavenging once if the ring is full.
    pub fn allocate_transient_data(&mut self, length: u64, fence: F) -> Result<u64, UploadError> {
        let capacity = self.ring.capacity();
        if length > capacity {
            return Err(UploadError::TooLarge {
                requested: length,
                capacity,
            });
        }

        if !self.ring.can_acquire(length) {
            // Out of easy allocations; try consuming fences before giving up.
            self.scavenge();
        }

        match self.ring.acquire(length, fence) {
            Ok(offset) => Ok(offset),
            Err(err) => {
                self.stats.exhausted += 1;
                warn!(
                    requested = length,
                    outstanding = self.ring.bytes_outstanding(),
                    "transient buffer exhausted after scavenge"
                );
                Err(err.into())
            }
        }
    }

    /// Flush the entire arena.
    pub fn flush(&mut self) {
        let capacity = self.arena.capacity();
        self.arena.flush(0..capacity);
    }

    /// Forget all cached vertex ranges, e.g. after the guest wrote to memory they may cover.
    pub fn invalidate_cache(&mut self) {
        if !self.ranges.is_empty() {
            trace!(entries = self.ranges.len(), "invalidating vertex range cache");
        }
        self.ranges.clear();
    }

    /// Same as [`BufferCache::invalidate_cache`].
    pub fn clear_range_cache(&mut self) {
        self.invalidate_cache();
    }

    /// Retire allocations whose fences have signaled.
    ///
    /// Retired space may be handed out again right away, so the range cache is cleared in the
    /// same step: none of its offsets can be trusted afterwards. Returns the number of
    /// allocations retired.
    pub fn scavenge(&mut self) -> usize {
        self.ranges.clear();

        if let Some(timeout) = self.config.scavenge_wait {
            if !self.ring.wait_oldest(timeout) {
                debug!(?timeout, "oldest transient allocation still in flight after wait");
            }
        }

        let retired = self.ring.scavenge();
        self.stats.scavenges += 1;
        self.stats.allocations_retired += retired as u64;
        retired
    }

    fn host_range(&mut self, offset: u64, len: u64) -> &mut [u8] {
        let start = offset as usize;
        &mut self.arena.host_mut()[start..start + len as usize]
    }

    fn flush_range(&mut self, range: Range<u64>) {
        match self.config.flush_mode {
            FlushMode::Range => self.arena.flush(range),
            FlushMode::WholeArena => self.flush(),
        }
    }
}

/// Exactly `len` bytes of guest memory at `gpa`; translators may hand back a longer view.
fn guest_view(memory: &dyn GuestMemory, gpa: u32, len: u32) -> Result<&[u8], UploadError> {
    let view = memory.translate_physical(gpa, len)?;
    view.get(..len as usize)
        .ok_or(UploadError::GuestMemory(GuestMemoryError { gpa, len }))
}

/// Bytes past the last whole element are copied as-is.
fn copy_trailing_bytes(dst: &mut [u8], src: &[u8], converted: usize) {
    let len = src.len();
    dst[converted..len].copy_from_slice(&src[converted..]);
}
