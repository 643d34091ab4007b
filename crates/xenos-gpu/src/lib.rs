//! `xenos-gpu` streams per-draw data from Xenos guest memory to the host GPU.
//!
//! Currently this crate provides:
//! - A fence-bounded ring allocator over a fixed transient arena (see [`RingAllocator`]).
//! - Constant, index and vertex uploads with guest byte-order conversion and primitive-restart
//!   substitution (see [`BufferCache`]).
//! - A range cache that lets repeated vertex fetches of the same guest range skip the copy
//!   (see [`RangeCache`]).
//!
//! The device itself stays behind traits: the caller supplies the arena ([`ArenaProvider`]),
//! completion fences ([`Fence`]) and a command sequence to receive barriers ([`CommandSink`]).

mod buffer_cache;
mod config;
mod error;
mod range_cache;
mod ring;

pub mod arena;
pub mod barrier;
pub mod fence;
pub mod guest_memory;
pub mod registers;
pub mod stats;

pub use arena::{ArenaDescriptor, ArenaError, ArenaProvider, TransientArena};
pub use barrier::{AccessFlags, BufferBarrier, CommandSink, PipelineStages};
pub use buffer_cache::{BufferCache, Endian, IndexFormat, TransientRegion, UNIFORM_REGION_SIZE};
pub use config::{BufferCacheConfig, FlushMode};
pub use error::{InitError, UploadError};
pub use fence::{Fence, ManualFence};
pub use guest_memory::{GuestMemory, GuestMemoryError, VecGuestMemory};
pub use range_cache::{CacheEntry, RangeCache};
pub use registers::{PrimitiveRestart, RegisterFile, RegisterSnapshot};
pub use ring::{AcquireError, RingAllocator};
pub use stats::BufferCacheStats;
