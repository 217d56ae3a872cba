// WHY: Public helpers for skip-if-up-to-date processing
// Output paths are a pure function of (input root, output root, input path) so a rerun finds prior results

use std::path::{Path, PathBuf};

/// Suffix of the clip files fed to the compressor
pub const INPUT_SUFFIX: &str = ".acl.js";

/// Suffix of the stats files the compressor writes
pub const OUTPUT_SUFFIX: &str = "_stats.sjson";

/// Check whether a file name carries the input suffix
pub fn is_input_file_name(file_name: &str) -> bool {
    file_name.ends_with(INPUT_SUFFIX)
}

/// Replace the input suffix of a file name with the output suffix
///
/// Names without the input suffix get the output suffix appended.
pub fn output_file_name(input_name: &str) -> String {
    let stem = input_name.strip_suffix(INPUT_SUFFIX).unwrap_or(input_name);
    format!("{stem}{OUTPUT_SUFFIX}")
}

/// Mirror an input file into the output tree
///
/// The relative directory of `input_path` under `input_root` is recreated under `output_root`
/// and the file name has its suffix swapped. Returns `None` when `input_path` is not inside
/// `input_root` or has no UTF-8 file name.
///
/// # Example
/// ```
/// use compress_sweep::incremental::generate_output_path;
/// use std::path::Path;
/// let out = generate_output_path(Path::new("clips"), Path::new("stats"), Path::new("clips/run/walk.acl.js"));
/// assert_eq!(out.unwrap(), Path::new("stats/run/walk_stats.sjson"));
/// ```
pub fn generate_output_path(input_root: &Path, output_root: &Path, input_path: &Path) -> Option<PathBuf> {
    let relative = input_path.strip_prefix(input_root).ok()?;
    let file_name = relative.file_name()?.to_str()?;

    let mut output_path = output_root.to_path_buf();
    if let Some(parent) = relative.parent() {
        output_path.push(parent);
    }
    output_path.push(output_file_name(file_name));
    Some(output_path)
}

/// Check whether an output already exists as a regular file
pub fn output_is_current(output_path: &Path) -> bool {
    output_path.is_file()
}

/// Decide whether a job has to run for this output
///
/// True when `refresh` is set or the output is not an existing regular file.
pub fn needs_processing(output_path: &Path, refresh: bool) -> bool {
    refresh || !output_is_current(output_path)
}
