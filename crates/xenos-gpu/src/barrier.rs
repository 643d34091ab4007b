//! Synchronization records appended to the caller's command sequence.
//!
//! Every upload writes arena bytes from the host; before the GPU reads them the command sequence
//! needs a host-write -> device-read buffer barrier over exactly the written range. The cache only
//! produces these records. Translating them to a real API call is the sink's job.

use bitflags::bitflags;

bitflags! {
    /// Pipeline stages a barrier waits on / blocks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const HOST = 1 << 0;
        const VERTEX_INPUT = 1 << 1;
        const ALL_COMMANDS = 1 << 2;
    }
}

bitflags! {
    /// Memory access kinds made visible by a barrier.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const HOST_WRITE = 1 << 0;
        const UNIFORM_READ = 1 << 1;
        const SHADER_READ = 1 << 2;
        const INDEX_READ = 1 << 3;
        const VERTEX_ATTRIBUTE_READ = 1 << 4;
    }
}

/// A buffer memory barrier over `[offset, offset + size)` of `buffer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBarrier<B> {
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub buffer: B,
    pub offset: u64,
    pub size: u64,
}

impl<B> BufferBarrier<B> {
    /// Host writes -> shader constant reads, at any stage.
    pub fn host_to_uniform(buffer: B, offset: u64, size: u64) -> Self {
        Self {
            src_stages: PipelineStages::HOST,
            dst_stages: PipelineStages::ALL_COMMANDS,
            src_access: AccessFlags::HOST_WRITE,
            dst_access: AccessFlags::UNIFORM_READ | AccessFlags::SHADER_READ,
            buffer,
            offset,
            size,
        }
    }

    /// Host writes -> index fetch.
    pub fn host_to_index(buffer: B, offset: u64, size: u64) -> Self {
        Self {
            src_stages: PipelineStages::HOST,
            dst_stages: PipelineStages::VERTEX_INPUT,
            src_access: AccessFlags::HOST_WRITE,
            dst_access: AccessFlags::INDEX_READ,
            buffer,
            offset,
            size,
        }
    }

    /// Host writes -> vertex attribute fetch.
    pub fn host_to_vertex(buffer: B, offset: u64, size: u64) -> Self {
        Self {
            src_stages: PipelineStages::HOST,
            dst_stages: PipelineStages::VERTEX_INPUT,
            src_access: AccessFlags::HOST_WRITE,
            dst_access: AccessFlags::VERTEX_ATTRIBUTE_READ,
            buffer,
            offset,
            size,
        }
    }
}

/// Append-only destination for barrier records.
pub trait CommandSink<B> {
    fn pipeline_barrier(&mut self, barrier: BufferBarrier<B>);
}

impl<B> CommandSink<B> for Vec<BufferBarrier<B>> {
    fn pipeline_barrier(&mut self, barrier: BufferBarrier<B>) {
        self.push(barrier);
    }
}
