use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::incremental::{generate_output_path, is_input_file_name, needs_processing};

/// Configuration for job discovery
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Root directory scanned recursively for input clips
    pub input_root: PathBuf,
    /// Root directory mirrored for stats outputs
    pub output_root: PathBuf,
    /// Dispatch jobs even when their output already exists
    pub refresh: bool,
}

/// One compressor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Result of walking the input tree
#[derive(Debug, Default)]
pub struct DiscoveryPlan {
    /// Every output the aggregator reads, dispatched or not
    pub expected_outputs: Vec<PathBuf>,
    /// Jobs that need the compressor, in walk order
    pub jobs: Vec<Job>,
}

impl DiscoveryPlan {
    /// True when no input matched the suffix
    pub fn is_empty(&self) -> bool {
        self.expected_outputs.is_empty()
    }

    /// Number of outputs reused from a previous sweep
    pub fn skipped(&self) -> usize {
        self.expected_outputs.len() - self.jobs.len()
    }
}

/// Walk the input root and build the job list.
///
/// Every matching file adds its mirrored output to `expected_outputs`. A job is added only when
/// the refresh flag is set or the output is not an existing regular file; the mirrored output
/// subdirectory is created right before such a job is recorded.
///
/// # Errors
/// Fails when the input root is missing or not a directory, when the output root exists but is
/// not a directory, or when the walk hits a filesystem error.
pub fn discover_jobs(config: &DiscoveryConfig) -> Result<DiscoveryPlan> {
    let input_root = &config.input_root;
    if !input_root.is_dir() {
        anyhow::bail!("Input root is not a directory: {}", input_root.display());
    }
    if config.output_root.exists() && !config.output_root.is_dir() {
        anyhow::bail!("Output root is not a directory: {}", config.output_root.display());
    }

    info!("Starting job discovery in: {}", input_root.display());
    let start = std::time::Instant::now();
    let mut plan = DiscoveryPlan::default();

    // WHY: sorted walk keeps expected_outputs and job order stable across runs
    for entry in WalkDir::new(input_root).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", input_root.display()))?;
        // Symlinked clips count as files; symlinked directories are not descended into
        if !entry.path().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_input_file_name(file_name) {
            continue;
        }

        let input_path = entry.path().to_path_buf();
        let output_path = generate_output_path(input_root, &config.output_root, &input_path)
            .with_context(|| format!("Cannot map {} into the output tree", input_path.display()))?;

        plan.expected_outputs.push(output_path.clone());

        if !needs_processing(&output_path, config.refresh) {
            debug!("Output up to date, skipping: {}", output_path.display());
            continue;
        }

        ensure_parent_dir(&output_path)?;
        debug!("Queued job: {}", input_path.display());
        plan.jobs.push(Job { input_path, output_path });
    }

    info!(
        expected = plan.expected_outputs.len(),
        dispatched = plan.jobs.len(),
        skipped = plan.skipped(),
        "Discovery completed in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(plan)
}

fn ensure_parent_dir(output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }
    }
    Ok(())
}
