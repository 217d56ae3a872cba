// WHY: Pure folds over the flattened runs; no I/O here so grouping and outlier selection
// can be tested without discovery or the worker pool

use serde::Serialize;
use std::collections::HashMap;

use crate::record::{AlgorithmUid, Run, RunRecord};

/// Running totals for one algorithm variant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAccumulator {
    pub algorithm_uid: AlgorithmUid,
    /// Description of the first run seen for this variant
    pub description: String,
    pub total_raw_size: u64,
    pub total_compressed_size: u64,
    pub total_compression_time: f64,
    pub total_duration: f64,
    pub max_error: f64,
    pub num_runs: usize,
}

impl GroupAccumulator {
    pub fn new(algorithm_uid: AlgorithmUid, description: impl Into<String>) -> Self {
        Self {
            algorithm_uid,
            description: description.into(),
            total_raw_size: 0,
            total_compressed_size: 0,
            total_compression_time: 0.0,
            total_duration: 0.0,
            max_error: 0.0,
            num_runs: 0,
        }
    }

    /// Fold one run into the totals
    pub fn fold(&mut self, record: &RunRecord) {
        self.total_raw_size += record.raw_size;
        self.total_compressed_size += record.compressed_size;
        self.total_compression_time += record.compression_time;
        self.total_duration += record.duration;
        self.max_error = self.max_error.max(record.max_error);
        self.num_runs += 1;
    }

    /// Total raw size over total compressed size; 0 when nothing was compressed
    pub fn ratio(&self) -> f64 {
        if self.total_compressed_size == 0 {
            return 0.0;
        }
        self.total_raw_size as f64 / self.total_compressed_size as f64
    }
}

/// Group runs by algorithm uid, sorted ascending by total compressed size.
///
/// Groups with equal compressed size keep the order their uid was first seen in.
pub fn group_runs(runs: &[Run]) -> Vec<GroupAccumulator> {
    let mut index: HashMap<&AlgorithmUid, usize> = HashMap::new();
    let mut groups: Vec<GroupAccumulator> = Vec::new();

    for run in runs {
        let uid = &run.record.algorithm_uid;
        let slot = *index.entry(uid).or_insert_with(|| {
            groups.push(GroupAccumulator::new(uid.clone(), run.description.clone()));
            groups.len() - 1
        });
        groups[slot].fold(&run.record);
    }

    groups.sort_by_key(|g| g.total_compressed_size);
    groups
}

/// A run holding a running extremum, with the value that put it there
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Extremum<'a> {
    pub value: f64,
    pub run: &'a Run,
}

/// Best and worst error and ratio over all runs
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Extrema<'a> {
    /// Lowest max error
    pub best_error: Extremum<'a>,
    /// Highest max error
    pub worst_error: Extremum<'a>,
    /// Highest compression ratio
    pub best_ratio: Extremum<'a>,
    /// Lowest compression ratio
    pub worst_ratio: Extremum<'a>,
}

/// Single pass over the runs; ties keep the first run seen. `None` for an empty slice.
pub fn find_extrema(runs: &[Run]) -> Option<Extrema<'_>> {
    let (first, rest) = runs.split_first()?;
    let error = |run: &Run| run.record.max_error;
    let ratio = |run: &Run| run.record.compression_ratio;

    let mut extrema = Extrema {
        best_error: Extremum { value: error(first), run: first },
        worst_error: Extremum { value: error(first), run: first },
        best_ratio: Extremum { value: ratio(first), run: first },
        worst_ratio: Extremum { value: ratio(first), run: first },
    };

    for run in rest {
        if error(run) < extrema.best_error.value {
            extrema.best_error = Extremum { value: error(run), run };
        }
        if error(run) > extrema.worst_error.value {
            extrema.worst_error = Extremum { value: error(run), run };
        }
        if ratio(run) > extrema.best_ratio.value {
            extrema.best_ratio = Extremum { value: ratio(run), run };
        }
        if ratio(run) < extrema.worst_ratio.value {
            extrema.worst_ratio = Extremum { value: ratio(run), run };
        }
    }

    Some(extrema)
}

/// Sweep-wide totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of compression time over every run
    pub compression_time: f64,
    /// Clip duration total of the first group in sorted order only
    pub duration: f64,
    /// Raw size total of the first group in sorted order only
    pub raw_size: u64,
}

/// Compute totals; duration and raw size come from `groups[0]`, not from all groups
pub fn totals(runs: &[Run], groups: &[GroupAccumulator]) -> Option<Totals> {
    let first = groups.first()?;
    Some(Totals {
        compression_time: runs.iter().map(|r| r.record.compression_time).sum(),
        duration: first.total_duration,
        raw_size: first.total_raw_size,
    })
}

/// Everything the report prints
#[derive(Debug, Clone, Serialize)]
pub struct Summary<'a> {
    pub num_runs: usize,
    pub groups: Vec<GroupAccumulator>,
    pub totals: Totals,
    pub extrema: Extrema<'a>,
}

/// Run the three statistics views; `None` when there are no runs
pub fn summarize(runs: &[Run]) -> Option<Summary<'_>> {
    let groups = group_runs(runs);
    let totals = totals(runs, &groups)?;
    let extrema = find_extrema(runs)?;
    Some(Summary {
        num_runs: runs.len(),
        groups,
        totals,
        extrema,
    })
}
