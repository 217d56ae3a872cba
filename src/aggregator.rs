use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::record::{Run, StatsFile};

/// A stats file that could not be turned into runs
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{file}: malformed stats document: {source}")]
    Syntax {
        file: PathBuf,
        #[source]
        source: serde_sjson::Error,
    },

    #[error("{file}: unexpected stats layout: {source}")]
    Schema {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Flattened runs from every expected output
#[derive(Debug, Default)]
pub struct Aggregation {
    pub runs: Vec<Run>,
    pub elapsed: Duration,
}

/// Decode one stats document and annotate its runs with `filename`
///
/// The document is parsed into a `serde_json::Value` first so layout problems are reported
/// with serde_json's field path, separately from SJSON syntax errors.
pub fn decode_stats(src: &str, filename: &Path) -> Result<Vec<Run>, DecodeError> {
    let value: serde_json::Value = serde_sjson::from_str(src).map_err(|source| DecodeError::Syntax {
        file: filename.to_path_buf(),
        source,
    })?;
    let stats: StatsFile = serde_json::from_value(value).map_err(|source| DecodeError::Schema {
        file: filename.to_path_buf(),
        source,
    })?;

    Ok(stats
        .runs
        .into_iter()
        .map(|record| Run::new(record, filename))
        .collect())
}

/// Read and decode one stats file
pub async fn read_stats_file(path: &Path) -> Result<Vec<Run>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read stats file {}", path.display()))?;
    let runs = decode_stats(&content, path)?;
    debug!("Decoded {} runs from {}", runs.len(), path.display());
    Ok(runs)
}

/// Read every expected output and flatten their runs.
///
/// Files are read up to `concurrency` at a time but runs keep the order of `paths`. The first
/// unreadable or undecodable file fails the whole aggregation.
pub async fn aggregate_outputs(paths: &[PathBuf], concurrency: usize) -> Result<Aggregation> {
    let start = Instant::now();

    let per_file: Vec<Vec<Run>> = stream::iter(paths)
        .map(|path| read_stats_file(path))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let runs: Vec<Run> = per_file.into_iter().flatten().collect();
    let elapsed = start.elapsed();
    info!(files = paths.len(), runs = runs.len(), "Aggregated results in {:.2}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(Aggregation {
        runs,
        elapsed,
    })
}
