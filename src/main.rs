use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use compress_sweep::config::{SweepConfig, DEFAULT_COMPRESSOR_PATH, USAGE};
use compress_sweep::discovery::{discover_jobs, DiscoveryConfig};
use compress_sweep::report::{format_elapsed_time, render_summary, write_csv, write_json_summary};
use compress_sweep::worker_pool::{CompressorRunner, WorkerPool};
use compress_sweep::{aggregate_outputs, summarize};

#[derive(Parser, Debug)]
#[command(name = "compress-sweep")]
#[command(about = "Run the animation compressor over a clip tree and aggregate its stats")]
#[command(version)]
struct Args {
    /// Directory scanned recursively for *.acl.js clips
    #[arg(long = "acl", value_name = "DIR")]
    acl_dir: PathBuf,

    /// Output directory for *_stats.sjson files (created if missing)
    #[arg(long = "stats", value_name = "DIR")]
    stats_dir: PathBuf,

    /// Write stats.csv into the output directory
    #[arg(long)]
    csv: bool,

    /// Re-run clips whose stats file already exists
    #[arg(long)]
    refresh: bool,

    /// Number of concurrent compressor processes
    #[arg(long, value_name = "N", default_value_t = 1)]
    parallel: usize,

    /// Compressor executable
    #[arg(long, env = "ACL_COMPRESSOR", default_value = DEFAULT_COMPRESSOR_PATH)]
    compressor: PathBuf,

    /// Also write the aggregated summary as JSON
    #[arg(long, value_name = "PATH")]
    summary_out: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Structured logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(?args, "Parsed CLI arguments");

    let config = SweepConfig {
        input_dir: args.acl_dir,
        output_dir: args.stats_dir,
        compressor: args.compressor,
        csv: args.csv,
        refresh: args.refresh,
        workers: args.parallel,
        summary_out: args.summary_out,
        progress: !args.no_progress,
    };

    let config = match config.validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return Ok(ExitCode::FAILURE);
        }
    };

    run_sweep(config).await
}

async fn run_sweep(config: SweepConfig) -> Result<ExitCode> {
    let plan = discover_jobs(&DiscoveryConfig {
        input_root: config.input_dir.clone(),
        output_root: config.output_dir.clone(),
        refresh: config.refresh,
    })?;

    if plan.is_empty() {
        info!("No input clips found, nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    // From here on Ctrl-C aborts every phase, including aggregation and reporting
    spawn_interrupt_abort();

    if !plan.jobs.is_empty() {
        let pool = WorkerPool::new(config.workers, CompressorRunner::new(&config.compressor))
            .with_progress(config.progress);

        let summary = pool.run(plan.jobs).await?;
        info!(dispatched = summary.dispatched, failed = summary.failed, "All workers finished");
    }

    println!();
    println!("Aggregating results...");
    println!();

    let aggregation = aggregate_outputs(&plan.expected_outputs, config.workers).await?;
    println!(
        "Found {} runs in {}",
        aggregation.runs.len(),
        format_elapsed_time(aggregation.elapsed.as_secs_f64())
    );
    println!();

    if config.csv {
        let csv_path = config.csv_path();
        println!("Generating CSV file {}...", csv_path.display());
        println!();
        write_csv(&csv_path, &aggregation.runs).await?;
    }

    let Some(summary) = summarize(&aggregation.runs) else {
        info!("Stats files contained no runs, skipping statistics");
        return Ok(ExitCode::SUCCESS);
    };

    print!("{}", render_summary(&summary));

    if let Some(summary_path) = &config.summary_out {
        write_json_summary(summary_path, &summary).await?;
    }

    Ok(ExitCode::SUCCESS)
}

/// Exit with status 1 on the first Ctrl-C; running compressor processes are left behind
fn spawn_interrupt_abort() {
    tokio::spawn(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                error!("Interrupted, aborting sweep");
                std::process::exit(1);
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });
}
