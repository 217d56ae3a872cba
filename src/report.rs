// WHY: Report rendering is string building over a Summary so console output, CSV and JSON
// share the same numbers and can be checked without a terminal

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

use crate::record::Run;
use crate::stats::{Extremum, GroupAccumulator, Summary};

/// Header row of the CSV export
pub const CSV_HEADER: &str = "Algorithm Name, Rotation Format, Translation Format, Range Reduction, Raw Size, Compressed Size, Compression Ratio, Compression Time, Clip Duration, Num Animated Tracks, Max Error";

pub fn bytes_to_mb(size_in_bytes: u64) -> f64 {
    size_in_bytes as f64 / (1024.0 * 1024.0)
}

/// Format seconds as `HHh MMm SS.SSs`
pub fn format_elapsed_time(elapsed_secs: f64) -> String {
    let elapsed_secs = elapsed_secs.max(0.0);
    let hours = (elapsed_secs / 3600.0).floor();
    let rem = elapsed_secs - hours * 3600.0;
    let minutes = (rem / 60.0).floor();
    let seconds = rem - minutes * 60.0;
    format!("{:02}h {:02}m {:05.2}s", hours as u64, minutes as u64, seconds)
}

/// Make a text field safe for naive comma splitting
pub fn sanitize_csv_entry(entry: &str) -> String {
    entry.replace(", ", " ").replace(',', "_")
}

/// Float text for CSV cells; whole numbers keep a trailing `.0`
fn csv_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// One line per group, in the order given
pub fn render_groups(groups: &[GroupAccumulator]) -> String {
    let mut out = String::from("Stats per run type:\n");
    for group in groups {
        let _ = writeln!(
            out,
            "Compressed {:.2} MB, Elapsed {}, Ratio [{:.2} : 1], Max error [{:.4}] Run type: {}",
            bytes_to_mb(group.total_compressed_size),
            format_elapsed_time(group.total_compression_time),
            group.ratio(),
            group.max_error,
            group.description
        );
    }
    out
}

fn render_extremum(out: &mut String, label: &str, extremum: &Extremum<'_>) {
    let run = extremum.run;
    let _ = writeln!(out, "{label}: {}", run.filename.display());
    let _ = writeln!(
        out,
        "Algorithm: {}, Format: [{}], Ratio: {:.2}, Error: {}",
        run.record.algorithm_name, run.description, run.record.compression_ratio, run.record.max_error
    );
    out.push('\n');
}

/// Full console report: groups, totals and outliers
pub fn render_summary(summary: &Summary<'_>) -> String {
    let mut out = render_groups(&summary.groups);
    out.push('\n');

    let totals = &summary.totals;
    let _ = writeln!(out, "Sum of clip durations: {}", format_elapsed_time(totals.duration));
    let _ = writeln!(out, "Total compression time: {}", format_elapsed_time(totals.compression_time));
    let _ = writeln!(out, "Total raw size: {:.2} MB", bytes_to_mb(totals.raw_size));
    out.push('\n');

    let extrema = &summary.extrema;
    render_extremum(&mut out, "Most accurate", &extrema.best_error);
    render_extremum(&mut out, "Least accurate", &extrema.worst_error);
    render_extremum(&mut out, "Best ratio", &extrema.best_ratio);
    render_extremum(&mut out, "Worst ratio", &extrema.worst_ratio);
    out
}

/// CSV data row for one run
pub fn csv_row(run: &Run) -> String {
    let record = &run.record;
    let num_animated_tracks = record
        .num_animated_tracks
        .map(|n| n.to_string())
        .unwrap_or_default();
    format!(
        "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
        sanitize_csv_entry(&record.algorithm_name),
        sanitize_csv_entry(&record.rotation_format),
        sanitize_csv_entry(&record.translation_format),
        sanitize_csv_entry(record.range_reduction.short()),
        record.raw_size,
        record.compressed_size,
        csv_float(record.compression_ratio),
        csv_float(record.compression_time),
        csv_float(record.duration),
        num_animated_tracks,
        csv_float(record.max_error)
    )
}

/// Write one CSV row per run
pub async fn write_csv(path: &Path, runs: &[Run]) -> Result<()> {
    info!("Generating CSV file {}", path.display());
    let file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writer.write_all(CSV_HEADER.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    for run in runs {
        writer.write_all(csv_row(run).as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(())
}

/// Write the summary as pretty-printed JSON
pub async fn write_json_summary(path: &Path, summary: &Summary<'_>) -> Result<()> {
    let content = serde_json::to_string_pretty(summary)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write summary {}", path.display()))?;
    info!("Wrote JSON summary to {}", path.display());
    Ok(())
}
