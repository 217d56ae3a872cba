// End-to-end pipeline through the library API: discovery -> pool -> aggregation -> statistics

use compress_sweep::stats::totals;
use compress_sweep::{
    aggregate_outputs, discover_jobs, find_extrema, group_runs, summarize, DiscoveryConfig, Job,
    JobOutcome, JobRunner, WorkerPool,
};
use futures::future::BoxFuture;

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::fixtures::{run_entry, segmented_run_entry, stats_document};
use test_utils::SweepFixture;

fn discovery_config(fixture: &SweepFixture, refresh: bool) -> DiscoveryConfig {
    DiscoveryConfig {
        input_root: fixture.clips_dir.clone(),
        output_root: fixture.stats_dir.clone(),
        refresh,
    }
}

/// Writes a fixed stats document to each job's output path
struct WritingRunner {
    document: String,
}

impl JobRunner for WritingRunner {
    fn run<'a>(&'a self, job: &'a Job) -> BoxFuture<'a, JobOutcome> {
        Box::pin(async move {
            match tokio::fs::write(&job.output_path, &self.document).await {
                Ok(()) => JobOutcome::Completed,
                Err(e) => JobOutcome::Failed { reason: e.to_string() },
            }
        })
    }
}

/// Two pre-existing stats files for the same algorithm fold into one group
#[tokio::test]
async fn test_preexisting_outputs_aggregate_into_one_group() {
    let fixture = SweepFixture::new();
    fixture.create_clip("a.acl.js");
    fixture.create_clip("b.acl.js");
    fixture.create_stats(
        "a_stats.sjson",
        &stats_document(&[run_entry(7, "RangeReduction::Rotations", 1000, 100, 0.01)]),
    );
    fixture.create_stats(
        "b_stats.sjson",
        &stats_document(&[run_entry(7, "RangeReduction::Rotations", 2000, 300, 0.05)]),
    );

    let plan = discover_jobs(&discovery_config(&fixture, false)).expect("Discovery should succeed");
    assert_eq!(plan.expected_outputs.len(), 2);
    assert!(plan.jobs.is_empty(), "Existing outputs should not be dispatched");

    let aggregation = aggregate_outputs(&plan.expected_outputs, 2).await.expect("Aggregation should succeed");
    let groups = group_runs(&aggregation.runs);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].total_raw_size, 3000);
    assert_eq!(groups[0].total_compressed_size, 400);
    assert_eq!(groups[0].ratio(), 7.5);
    assert_eq!(groups[0].max_error, 0.05);
    assert_eq!(groups[0].description, "Quat_48, Vector3_96, Clip RR:Rot");
}

/// Every dispatched job produces an output and aggregation sees all of them
#[tokio::test]
async fn test_pool_outputs_feed_aggregation() {
    let fixture = SweepFixture::new();
    for i in 0..6 {
        fixture.create_clip(format!("set{}/clip{i}.acl.js", i % 2));
    }
    // One result is already current
    fixture.create_stats(
        "set0/clip0_stats.sjson",
        &stats_document(&[run_entry(1, "RangeReduction::None", 500, 250, 0.2)]),
    );

    let plan = discover_jobs(&discovery_config(&fixture, false)).unwrap();
    assert_eq!(plan.expected_outputs.len(), 6);
    assert_eq!(plan.jobs.len(), 5);

    let runner = WritingRunner {
        document: stats_document(&[
            run_entry(1, "RangeReduction::None", 1000, 100, 0.01),
            segmented_run_entry(2, "RangeReduction::Rotations | RangeReduction::Translations", "RangeReduction::Translations"),
        ]),
    };
    let summary = WorkerPool::new(3, runner).run(plan.jobs).await.unwrap();
    assert_eq!(summary.dispatched, 5);
    assert_eq!(summary.failed, 0);

    for output in &plan.expected_outputs {
        assert!(output.is_file(), "Missing output {}", output.display());
    }

    let aggregation = aggregate_outputs(&plan.expected_outputs, 3).await.unwrap();
    assert_eq!(aggregation.runs.len(), 1 + 5 * 2);

    let groups = group_runs(&aggregation.runs);
    assert_eq!(groups.len(), 2);
    let segmented = groups.iter().find(|g| g.algorithm_uid.0 == "2").unwrap();
    assert_eq!(segmented.num_runs, 5);
    assert_eq!(
        segmented.description,
        "QuatDropW_Variable, Vector3_Variable, Clip RR:Rot|Trans, Segment RR:Trans"
    );

    let extrema = find_extrema(&aggregation.runs).unwrap();
    assert_eq!(extrema.worst_error.value, 0.2);
    assert_eq!(
        extrema.worst_error.run.filename,
        fixture.stats_dir.join("set0/clip0_stats.sjson")
    );
}

/// With refresh set, current outputs are overwritten by the pool
#[tokio::test]
async fn test_refresh_reruns_current_outputs() {
    let fixture = SweepFixture::new();
    fixture.create_clip("walk.acl.js");
    let stale = fixture.create_stats(
        "walk_stats.sjson",
        &stats_document(&[run_entry(1, "RangeReduction::None", 10, 10, 0.9)]),
    );

    let plan = discover_jobs(&discovery_config(&fixture, true)).unwrap();
    assert_eq!(plan.jobs.len(), 1);

    let runner = WritingRunner {
        document: stats_document(&[run_entry(1, "RangeReduction::None", 10, 5, 0.1)]),
    };
    WorkerPool::new(1, runner).run(plan.jobs).await.unwrap();

    let aggregation = aggregate_outputs(&[stale], 1).await.unwrap();
    assert_eq!(aggregation.runs[0].record.compressed_size, 5);
}

/// A decode failure in any one file fails the whole aggregation
#[tokio::test]
async fn test_one_bad_file_fails_aggregation() {
    let fixture = SweepFixture::new();
    let good = fixture.create_stats(
        "good_stats.sjson",
        &stats_document(&[run_entry(1, "RangeReduction::None", 10, 5, 0.1)]),
    );
    let bad = fixture.create_stats("bad_stats.sjson", "runs = [ { algorithm_uid = 1 } ]");

    let err = aggregate_outputs(&[good, bad], 2).await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("bad_stats.sjson"), "Error should name the file: {message}");
}

/// Stats files without runs leave nothing to summarize
#[tokio::test]
async fn test_empty_runs_skip_statistics() {
    let fixture = SweepFixture::new();
    let empty = fixture.create_stats("empty_stats.sjson", "runs = []");

    let aggregation = aggregate_outputs(&[empty], 1).await.unwrap();
    assert!(aggregation.runs.is_empty());
    assert!(summarize(&aggregation.runs).is_none());
    assert!(totals(&aggregation.runs, &group_runs(&aggregation.runs)).is_none());
}

/// Real subprocess invocations through the compressor runner
#[cfg(unix)]
#[tokio::test]
async fn test_compressor_runner_invokes_executable_per_job() {
    use compress_sweep::CompressorRunner;

    let fixture = SweepFixture::new();
    for i in 0..4 {
        fixture.create_clip(format!("nested/dir/clip{i}.acl.js"));
    }
    let compressor = fixture.fake_compressor(&stats_document(&[run_entry(
        9,
        "RangeReduction::Translations",
        800,
        200,
        0.03,
    )]));

    let plan = discover_jobs(&discovery_config(&fixture, false)).unwrap();
    let summary = WorkerPool::new(8, CompressorRunner::new(&compressor))
        .run(plan.jobs.clone())
        .await
        .unwrap();

    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.failed, 0);

    let mut invoked = fixture.invocations();
    invoked.sort();
    let mut expected: Vec<String> = plan.jobs.iter().map(|j| j.input_path.display().to_string()).collect();
    expected.sort();
    assert_eq!(invoked, expected, "Each job should invoke the compressor exactly once");

    let aggregation = aggregate_outputs(&plan.expected_outputs, 4).await.unwrap();
    assert_eq!(aggregation.runs.len(), 4);
    assert!(aggregation
        .runs
        .iter()
        .all(|r| r.filename.starts_with(fixture.stats_dir.join("nested/dir"))));
}
