/// Counters for the transient upload path.
///
/// `copies` counts calls into the byte-order conversion routines (constant uploads are plain
/// copies and are not included), so a cache hit is visible as an upload that did not bump it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferCacheStats {
    pub constant_uploads: u64,
    pub index_uploads: u64,
    pub vertex_uploads: u64,
    pub vertex_cache_hits: u64,
    pub vertex_cache_misses: u64,
    pub copies: u64,
    pub bytes_uploaded: u64,
    pub scavenges: u64,
    pub allocations_retired: u64,
    pub exhausted: u64,
}

impl BufferCacheStats {
    pub fn uploads_total(&self) -> u64 {
        self.constant_uploads + self.index_uploads + self.vertex_uploads
    }
}
