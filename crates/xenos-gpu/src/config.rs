use std::time::Duration;

use crate::buffer_cache::UNIFORM_REGION_SIZE;

/// How uploads make their host writes visible to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Flush exactly the bytes each upload wrote.
    #[default]
    Range,
    /// Flush the whole arena after every upload. Slower, but does not depend on the device
    /// honouring sub-range flush granularity.
    WholeArena,
}

#[derive(Debug, Clone)]
pub struct BufferCacheConfig {
    pub label: Option<String>,
    /// Arena size in bytes. Must be a multiple of `alignment`.
    pub capacity: u64,
    /// Allocation granularity; every upload starts on a multiple of this. Power of two.
    pub alignment: u64,
    pub flush_mode: FlushMode,
    /// If set, a scavenge first waits up to this long for the oldest in-flight fence.
    pub scavenge_wait: Option<Duration>,
}

impl Default for BufferCacheConfig {
    fn default() -> Self {
        Self {
            label: Some("xenos transient buffer".to_string()),
            capacity: 32 * 1024 * 1024,
            alignment: 4096,
            flush_mode: FlushMode::Range,
            scavenge_wait: None,
        }
    }
}

impl BufferCacheConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.capacity == 0 {
            return Err("capacity must be > 0");
        }
        if !self.alignment.is_power_of_two() {
            return Err("alignment must be a power of two");
        }
        if self.capacity % self.alignment != 0 {
            return Err("capacity must be a multiple of alignment");
        }
        if self.capacity < UNIFORM_REGION_SIZE {
            return Err("capacity must hold at least one constant upload");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(BufferCacheConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_geometry() {
        let base = BufferCacheConfig::default();

        let zero = BufferCacheConfig {
            capacity: 0,
            ..base.clone()
        };
        assert!(zero.validate().is_err());

        let odd_alignment = BufferCacheConfig {
            alignment: 3000,
            ..base.clone()
        };
        assert!(odd_alignment.validate().is_err());

        let ragged = BufferCacheConfig {
            capacity: 4096 * 4 + 1,
            ..base.clone()
        };
        assert!(ragged.validate().is_err());

        let tiny = BufferCacheConfig {
            capacity: 4096,
            alignment: 256,
            ..base
        };
        assert_eq!(
            tiny.validate(),
            Err("capacity must hold at least one constant upload")
        );
    }
}
