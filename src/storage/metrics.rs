use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking seg file reads and writes.
///
/// Implementations collect statistics about appended and decoded edge groups
/// and about decode failures, for monitoring and corruption alerting.
pub trait SFileMetrics: Send + Sync {
    /// Records an edge group of `bytes` bytes appended to a seg file.
    fn group_appended(&self, bytes: u64);

    /// Records an edge group decoded while opening a seg file.
    fn group_decoded(&self);

    /// Records a failed open.
    ///
    /// # Parameters
    /// * `kind` - The error kind label, see [`crate::types::OccamyError::kind`].
    fn decode_failed(&self, kind: &'static str);

    /// Records an edge group whose checksum did not verify.
    fn checksum_mismatch(&self);
}

/// A no-op implementation of [`SFileMetrics`] that discards everything.
#[derive(Default)]
pub struct NoopMetrics;

impl SFileMetrics for NoopMetrics {
    fn group_appended(&self, _bytes: u64) {}
    fn group_decoded(&self) {}
    fn decode_failed(&self, _kind: &'static str) {}
    fn checksum_mismatch(&self) {}
}

/// A thread-safe counter-based implementation of [`SFileMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of edge groups appended.
    pub groups_appended: AtomicU64,

    /// Bytes appended.
    pub bytes_appended: AtomicU64,

    /// Number of edge groups decoded.
    pub groups_decoded: AtomicU64,

    /// Opens that failed because a block was corrupted.
    pub corrupted_blocks: AtomicU64,

    /// Opens that failed because external metadata disagreed with the bytes.
    pub schema_mismatches: AtomicU64,

    /// Opens that failed for any other reason.
    pub other_failures: AtomicU64,

    /// Edge groups whose checksum did not verify.
    pub checksum_mismatches: AtomicU64,
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterMetricsSnapshot {
    /// Number of edge groups appended.
    pub groups_appended: u64,
    /// Bytes appended.
    pub bytes_appended: u64,
    /// Number of edge groups decoded.
    pub groups_decoded: u64,
    /// Opens failed on corrupted blocks.
    pub corrupted_blocks: u64,
    /// Opens failed on schema mismatches.
    pub schema_mismatches: u64,
    /// Opens failed for other reasons.
    pub other_failures: u64,
    /// Checksum mismatches.
    pub checksum_mismatches: u64,
}

impl CounterMetrics {
    /// Creates a snapshot of the current counters.
    pub fn snapshot(&self) -> CounterMetricsSnapshot {
        CounterMetricsSnapshot {
            groups_appended: self.groups_appended.load(Ordering::Relaxed),
            bytes_appended: self.bytes_appended.load(Ordering::Relaxed),
            groups_decoded: self.groups_decoded.load(Ordering::Relaxed),
            corrupted_blocks: self.corrupted_blocks.load(Ordering::Relaxed),
            schema_mismatches: self.schema_mismatches.load(Ordering::Relaxed),
            other_failures: self.other_failures.load(Ordering::Relaxed),
            checksum_mismatches: self.checksum_mismatches.load(Ordering::Relaxed),
        }
    }
}

impl SFileMetrics for CounterMetrics {
    fn group_appended(&self, bytes: u64) {
        self.groups_appended.fetch_add(1, Ordering::Relaxed);
        self.bytes_appended.fetch_add(bytes, Ordering::Relaxed);
    }

    fn group_decoded(&self) {
        self.groups_decoded.fetch_add(1, Ordering::Relaxed);
    }

    fn decode_failed(&self, kind: &'static str) {
        match kind {
            "corrupted_block" => {
                self.corrupted_blocks.fetch_add(1, Ordering::Relaxed);
            }
            "schema_mismatch" => {
                self.schema_mismatches.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.other_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn checksum_mismatch(&self) {
        self.checksum_mismatches.fetch_add(1, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation wrapped in an [`Arc`].
///
/// The default implementation is [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn SFileMetrics> {
    Arc::new(NoopMetrics)
}
