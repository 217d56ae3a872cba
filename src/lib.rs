pub mod aggregator;
pub mod config;
pub mod discovery;
pub mod incremental;
pub mod record;
pub mod report;
pub mod stats;
pub mod worker_pool;

// Re-export main types for convenient access
pub use config::{ConfigError, SweepConfig};
pub use discovery::{discover_jobs, DiscoveryConfig, DiscoveryPlan, Job};
pub use record::{AlgorithmUid, RangeReduction, Run, RunRecord, SegmentingRecord};

// Re-export pipeline stages for benchmarking and integration tests
pub use aggregator::{aggregate_outputs, decode_stats, Aggregation, DecodeError};
pub use stats::{find_extrema, group_runs, summarize, Extrema, GroupAccumulator, Summary, Totals};
pub use worker_pool::{CompressorRunner, JobOutcome, JobRunner, PoolExit, PoolSummary, WorkerPool};
