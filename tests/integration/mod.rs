// Integration test utilities and common code
// Fixture layout: <temp>/clips holds inputs, <temp>/stats receives outputs

#![allow(dead_code)]

pub mod fixtures;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary input/output tree for sweep tests
pub struct SweepFixture {
    pub temp_dir: TempDir,
    pub clips_dir: PathBuf,
    pub stats_dir: PathBuf,
}

impl SweepFixture {
    /// Create an empty clips directory; the stats directory is left for the sweep to create
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clips_dir = temp_dir.path().join("clips");
        let stats_dir = temp_dir.path().join("stats");
        fs::create_dir_all(&clips_dir).expect("Failed to create clips directory");

        Self {
            temp_dir,
            clips_dir,
            stats_dir,
        }
    }

    /// Create an input clip; its content is never read by the sweep itself
    pub fn create_clip<P: AsRef<Path>>(&self, relative_path: P) -> PathBuf {
        let file_path = self.clips_dir.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, "{}").expect("Failed to write clip file");
        file_path
    }

    /// Write a stats file as if a previous sweep had produced it
    pub fn create_stats<P: AsRef<Path>>(&self, relative_path: P, content: &str) -> PathBuf {
        let file_path = self.stats_dir.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write stats file");
        file_path
    }

    /// Install a shell script that behaves like the compressor: it writes `content` to the
    /// path given by `-stats=` and appends the input path to `invocations.log`
    #[cfg(unix)]
    pub fn fake_compressor(&self, content: &str) -> PathBuf {
        let doc_path = self.temp_dir.path().join("fake_output.sjson");
        fs::write(&doc_path, content).expect("Failed to write fake output");
        let log_path = self.invocation_log();

        let script = format!(
            r#"#!/bin/sh
out=""
input=""
for arg in "$@"; do
    case "$arg" in
        -stats=*) out="${{arg#-stats=}}" ;;
        -acl=*) input="${{arg#-acl=}}" ;;
    esac
done
echo "$input" >> "{log}"
cp "{doc}" "$out"
"#,
            log = log_path.display(),
            doc = doc_path.display()
        );

        self.install_script("fake_compressor.sh", &script)
    }

    /// Install a compressor that logs its input and then hangs without writing any output
    #[cfg(unix)]
    pub fn stalling_compressor(&self) -> PathBuf {
        let script = format!(
            r#"#!/bin/sh
for arg in "$@"; do
    case "$arg" in
        -acl=*) echo "${{arg#-acl=}}" >> "{log}" ;;
    esac
done
exec sleep 10
"#,
            log = self.invocation_log().display()
        );
        self.install_script("stalling_compressor.sh", &script)
    }

    #[cfg(unix)]
    fn install_script(&self, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script_path = self.temp_dir.path().join(name);
        fs::write(&script_path, script).expect("Failed to write script");
        let mut perms = fs::metadata(&script_path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).unwrap();
        script_path
    }

    pub fn invocation_log(&self) -> PathBuf {
        self.temp_dir.path().join("invocations.log")
    }

    /// Input paths the fake compressor was called with, in call order
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.invocation_log())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
