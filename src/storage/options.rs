use std::sync::Arc;

use super::metrics::{default_metrics, SFileMetrics};

/// Configuration options for reading and writing seg files.
#[derive(Clone)]
pub struct SegFileOptions {
    /// Whether opening a seg file checks each group's CRC32
    pub verify_checksums: bool,
    /// Whether group extents must tile the file from offset 0 with no gaps
    pub require_contiguous: bool,
    /// Whether the writer flushes its sink after every appended group
    pub flush_on_append: bool,
    /// Metrics sink for appends, decodes, and failures
    pub metrics: Arc<dyn SFileMetrics>,
}

impl Default for SegFileOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            require_contiguous: true,
            flush_on_append: false,
            metrics: default_metrics(),
        }
    }
}

impl SegFileOptions {
    /// Enables or disables checksum verification on open.
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Enables or disables the contiguous-extents check on open.
    pub fn require_contiguous(mut self, enabled: bool) -> Self {
        self.require_contiguous = enabled;
        self
    }

    /// Enables or disables flushing after every append.
    pub fn flush_on_append(mut self, enabled: bool) -> Self {
        self.flush_on_append = enabled;
        self
    }

    /// Sets the metrics implementation.
    pub fn metrics(mut self, metrics: Arc<dyn SFileMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}
