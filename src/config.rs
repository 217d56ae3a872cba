// WHY: CLI arguments are mapped into a validated config before any filesystem work starts,
// so every configuration error surfaces with the usage line and nothing has been dispatched

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Default location of the compressor executable, relative to the tool directory
pub const DEFAULT_COMPRESSOR_PATH: &str = "../../build/bin/acl_compressor";

/// Name of the CSV file written into the output root
pub const CSV_FILE_NAME: &str = "stats.csv";

/// One-line usage text printed alongside configuration errors
pub const USAGE: &str = "Usage: compress-sweep --acl <DIR> --stats <DIR> [--csv] [--refresh] [--parallel <N>] [--compressor <PATH>] [--summary-out <PATH>] [--no-progress]";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ACL input directory not found: {0}")]
    InputNotFound(PathBuf),

    #[error("ACL input path is not a directory: {0}")]
    InputNotDirectory(PathBuf),

    #[error("The output stat argument must be a directory: {0}")]
    OutputNotDirectory(PathBuf),

    #[error("Failed to create output directory {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("--parallel argument must be greater than 0")]
    InvalidWorkerCount,
}

/// Validated settings for one sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Root of the tree scanned for input clips
    pub input_dir: PathBuf,
    /// Root of the mirrored tree that receives stats files
    pub output_dir: PathBuf,
    /// External compressor executable
    pub compressor: PathBuf,
    /// Write `stats.csv` into the output root
    pub csv: bool,
    /// Re-run jobs whose output already exists
    pub refresh: bool,
    /// Number of concurrent workers, always >= 1
    pub workers: usize,
    /// Optional JSON summary destination
    pub summary_out: Option<PathBuf>,
    /// Show a progress bar while jobs run
    pub progress: bool,
}

impl SweepConfig {
    /// Check the raw settings and create the output root when it does not exist yet.
    ///
    /// The input root must be an existing directory; the output root must be a directory
    /// once this returns. A worker count of zero is rejected.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }

        check_input_dir(&self.input_dir)?;
        ensure_output_dir(&self.output_dir)?;

        info!(
            input = %self.input_dir.display(),
            output = %self.output_dir.display(),
            workers = self.workers,
            refresh = self.refresh,
            "Sweep configuration validated"
        );
        Ok(self)
    }

    /// Path of the CSV export for this sweep
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE_NAME)
    }
}

fn check_input_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::InputNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ConfigError::InputNotDirectory(path.to_path_buf()));
    }
    Ok(())
}

fn ensure_output_dir(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|source| ConfigError::OutputCreate {
            path: path.to_path_buf(),
            source,
        })?;
    }
    if !path.is_dir() {
        return Err(ConfigError::OutputNotDirectory(path.to_path_buf()));
    }
    Ok(())
}
