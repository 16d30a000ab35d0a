//! Edge storage: schemas, the seg file format, and its configuration.

/// Edge-type schemas and the catalog that serves them.
///
/// Supplies column count, types, and value widths, none of which are
/// stored in the seg file itself.
pub mod catalog;

/// Columnar edge groups in append-only seg files.
pub mod sfile;

mod metrics;
mod options;

/// Metrics hooks for seg file reads and writes.
pub use metrics::{
    default_metrics, CounterMetrics, CounterMetricsSnapshot, NoopMetrics, SFileMetrics,
};

/// Seg file configuration options.
pub use options::SegFileOptions;
