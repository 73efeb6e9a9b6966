//! C toolchain driver
//!
//! Writes the generated translation unit next to the runtime header in a fresh work directory, compiles it with
//! the configured C compiler and runs the produced binary.
//!
//! The work directory is removed when the [`BuildResult`] that owns it is dropped, unless artifacts are kept.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CompilerConfig;

use super::{RUNTIME_HEADER, RUNTIME_HEADER_NAME};

/// Flags every build gets: C11, and wrapping signed arithmetic to match Dream's `int` semantics.
const BASE_FLAGS: &[&str] = &["-std=c11", "-fwrapv"];

const SOURCE_NAME: &str = "program.c";
const BINARY_NAME: &str = "program";

static NEXT_WORKDIR: AtomicUsize = AtomicUsize::new(0);

/// A configured C compiler.
#[derive(Debug, Clone)]
pub struct Toolchain {
    cc: String,
    flags: Vec<String>,
    keep_artifacts: bool,
}

impl Toolchain {
    pub fn new(cc: impl Into<String>) -> Self {
        Self {
            cc: cc.into(),
            flags: vec!["-O2".to_string()],
            keep_artifacts: false,
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            cc: config.cc.clone(),
            flags: config.cc_flags.clone(),
            keep_artifacts: config.keep_artifacts,
        }
    }

    /// Replace the extra compiler flags (the base flags are always passed).
    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }

    pub fn cc(&self) -> &str {
        &self.cc
    }

    /// Whether the compiler can be started at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.cc)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    /// Compile `c_source` into an executable.
    ///
    /// ## Errors
    /// Fails when the work directory cannot be written or the compiler cannot be started. A compiler that runs
    /// and rejects the program is reported through [`BuildResult::success`].
    #[tracing::instrument(skip_all, fields(cc = %self.cc))]
    pub fn build(&self, c_source: &str) -> io::Result<BuildResult> {
        let workdir = Workdir::create(self.keep_artifacts)?;
        fs::write(workdir.path().join(RUNTIME_HEADER_NAME), RUNTIME_HEADER)?;
        let source = workdir.path().join(SOURCE_NAME);
        fs::write(&source, c_source)?;
        let binary = workdir.path().join(BINARY_NAME);

        let output = Command::new(&self.cc)
            .args(BASE_FLAGS)
            .args(&self.flags)
            .arg("-o")
            .arg(&binary)
            .arg(&source)
            .current_dir(workdir.path())
            .output()?;
        let success = output.status.success();
        tracing::debug!(success, dir = %workdir.path().display(), "C compiler finished");

        Ok(BuildResult {
            success,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            binary,
            workdir,
        })
    }

    /// Run a successful build, feeding it `stdin` and capturing its output.
    ///
    /// ## Errors
    /// Fails when the binary cannot be started or its streams cannot be read.
    #[tracing::instrument(skip_all)]
    pub fn run(&self, build: &BuildResult, stdin: &str) -> io::Result<RunResult> {
        if !build.success {
            return Err(io::Error::other("cannot run a failed build"));
        }
        let mut child = Command::new(&build.binary)
            .current_dir(build.workdir.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed input from a separate thread so a program that prints before reading cannot deadlock on a full pipe.
        let writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.as_bytes().to_vec();
            std::thread::spawn(move || {
                // A program that exits without reading closes the pipe; that is not an error.
                let _ = pipe.write_all(&input);
            })
        });
        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        Ok(RunResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }

    /// Run a successful build attached to the current terminal, so output streams as the program runs.
    ///
    /// ## Errors
    /// Fails when the binary cannot be started.
    pub fn run_inherited(&self, build: &BuildResult) -> io::Result<RunResult> {
        if !build.success {
            return Err(io::Error::other("cannot run a failed build"));
        }
        let status = Command::new(&build.binary)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        Ok(RunResult {
            success: status.success(),
            stdout: String::new(), // went directly to the terminal
            stderr: String::new(),
            exit_code: status.code(),
        })
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new("cc")
    }
}

/// Result of compiling a translation unit.
#[derive(Debug)]
pub struct BuildResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    binary: PathBuf,
    workdir: Workdir,
}

impl BuildResult {
    /// Path of the produced executable (present only when `success`).
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }
}

/// Result of running the built program.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// A uniquely named directory under the system temp dir, removed on drop unless kept.
#[derive(Debug)]
struct Workdir {
    path: PathBuf,
    keep: bool,
}

impl Workdir {
    fn create(keep: bool) -> io::Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or_default();
        let serial = NEXT_WORKDIR.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("dream-{}-{nanos}-{serial}", std::process::id()));
        fs::create_dir_all(&path)?;
        Ok(Self { path, keep })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!(dir = %self.path.display(), "keeping build artifacts");
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.path) {
            tracing::warn!(dir = %self.path.display(), %err, "failed to remove build directory");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HELLO: &str = "#include \"dream_runtime.h\"\nint main(void) {\n    dr_print_str(\"hi\", true);\n    return 0;\n}\n";

    #[test]
    fn workdirs_are_unique_and_removed_on_drop() {
        let a = Workdir::create(false).unwrap();
        let b = Workdir::create(false).unwrap();
        assert_ne!(a.path(), b.path());
        let path = a.path().to_path_buf();
        assert!(path.is_dir());
        drop(a);
        assert!(!path.exists());
    }

    #[test]
    fn kept_workdirs_survive_drop() {
        let dir = Workdir::create(true).unwrap();
        let path = dir.path().to_path_buf();
        drop(dir);
        assert!(path.is_dir());
        fs::remove_dir_all(path).unwrap();
    }

    #[test]
    fn missing_compiler_is_an_io_error() {
        let toolchain = Toolchain::new("dream-no-such-compiler");
        assert!(!toolchain.is_available());
        assert!(toolchain.build(HELLO).is_err());
    }

    #[test]
    fn builds_and_runs_with_the_runtime_header() {
        let toolchain = Toolchain::default();
        if !toolchain.is_available() {
            eprintln!("skipping: no C compiler");
            return;
        }
        let build = toolchain.build(HELLO).unwrap();
        assert!(build.success, "{}", build.stderr);
        assert!(build.workdir().join(RUNTIME_HEADER_NAME).is_file());
        let run = toolchain.run(&build, "").unwrap();
        assert!(run.success);
        assert_eq!(run.stdout, "hi\n");
    }

    #[test]
    fn compiler_errors_are_reported_not_raised() {
        let toolchain = Toolchain::default();
        if !toolchain.is_available() {
            eprintln!("skipping: no C compiler");
            return;
        }
        let build = toolchain.build("int main(void) { return undeclared; }\n").unwrap();
        assert!(!build.success);
        assert!(!build.stderr.is_empty());
        assert!(toolchain.run(&build, "").is_err());
    }
}
