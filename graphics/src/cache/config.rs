//! Hardware buffer cache configuration.

/// Tuning knobs of a [`HardwareBufferCache`](super::HardwareBufferCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Mesh buffers with fewer vertices are drawn from CPU memory when the
    /// backend allows it.
    pub min_vertex_count: usize,
    /// Frames a link may go undrawn before the sweep evicts it.
    pub eviction_threshold: u64,
    /// Frames to wait before retrying a mesh buffer whose upload failed.
    pub retry_interval: u64,
    /// Prefix of backend buffer labels.
    pub label_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_vertex_count: 500,
            eviction_threshold: 20_000,
            retry_interval: 120,
            label_prefix: "mesh buffer".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_vertex_count(mut self, count: usize) -> Self {
        self.min_vertex_count = count;
        self
    }

    pub fn with_eviction_threshold(mut self, frames: u64) -> Self {
        self.eviction_threshold = frames;
        self
    }

    pub fn with_retry_interval(mut self, frames: u64) -> Self {
        self.retry_interval = frames;
        self
    }

    pub fn with_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.min_vertex_count, 500);
        assert_eq!(config.eviction_threshold, 20_000);
        assert_eq!(config.retry_interval, 120);
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::new()
            .with_min_vertex_count(0)
            .with_eviction_threshold(2)
            .with_retry_interval(5)
            .with_label_prefix("terrain");
        assert_eq!(config.min_vertex_count, 0);
        assert_eq!(config.eviction_threshold, 2);
        assert_eq!(config.retry_interval, 5);
        assert_eq!(config.label_prefix, "terrain");
    }
}
