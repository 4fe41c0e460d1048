//! Child-process invocation with a wall-clock timeout.
//!
//! Used to query framework consoles (e.g. `php artisan route:list --json`).
//! A console can hang on a misconfigured project, so every call carries a
//! timeout; on expiry the child is killed and [`SchemaError::ProcessTimeout`]
//! is returned. Callers treat any error as "fall back to static scanning".

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Result, SchemaError};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, or -1 when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `program` with `args` in `cwd`, capturing stdout and stderr.
///
/// The program is resolved on `PATH` first so a missing binary is reported as
/// [`SchemaError::ProgramNotFound`] rather than a generic spawn failure.
pub fn run(program: &str, args: &[&str], cwd: &Path, timeout: Duration) -> Result<ProcessOutput> {
    let exe = which::which(program).map_err(|_| SchemaError::ProgramNotFound(program.into()))?;

    let mut child = Command::new(&exe)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| SchemaError::ProcessSpawn {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    // Drain both pipes on their own threads so a chatty child cannot block
    // on a full pipe while we poll for exit.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(program, timeout_secs = timeout.as_secs(), "process timed out");
            return Err(SchemaError::ProcessTimeout {
                program: program.to_string(),
                seconds: timeout.as_secs(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    Ok(ProcessOutput {
        stdout: stdout.map(join).unwrap_or_default(),
        stderr: stderr.map(join).unwrap_or_default(),
        exit_code: status.code().unwrap_or(-1),
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: std::thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn captures_stdout_and_exit_code() {
        let dir = TempDir::new().unwrap();
        let out = run(
            "sh",
            &["-c", "echo hello; echo oops >&2; exit 3"],
            dir.path(),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let out = run("sh", &["-c", "cat marker.txt"], dir.path(), Duration::from_secs(10)).unwrap();
        assert_eq!(out.stdout, "here");
    }

    #[test]
    fn missing_program_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = run(
            "definitely-not-a-real-binary-xyz",
            &[],
            dir.path(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::ProgramNotFound(_)));
    }

    #[test]
    fn slow_process_times_out() {
        let dir = TempDir::new().unwrap();
        let started = Instant::now();
        let err = run("sh", &["-c", "sleep 5"], dir.path(), Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, SchemaError::ProcessTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
