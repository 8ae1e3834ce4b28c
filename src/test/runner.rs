//! Runs the executable under test against one fixture.
//!
//! The child is owned by a [`ChildGuard`] for its whole life, so it is killed
//! and reaped on every exit path, including timeouts and I/O failures. The
//! deadline also bounds reading the pipes, which a background grandchild can
//! keep open after the child itself has exited.

use crate::errors::RunError;
use crate::test::{CapturedOutput, TestCase};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Spawns the executable once per case with a fixed wall-clock limit.
#[derive(Debug, Clone)]
pub struct TestRunner {
    executable: PathBuf,
    timeout: Duration,
}

impl TestRunner {
    pub fn new(executable: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            timeout,
        }
    }

    /// Runs `executable <source>` feeding the case's input, and captures both streams.
    pub fn run(&self, case: &TestCase) -> Result<CapturedOutput, RunError> {
        let child = Command::new(&self.executable)
            .arg(&case.source_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: self.executable.clone(),
                source,
            })?;
        let mut guard = ChildGuard::new(child);
        debug!(pid = guard.id(), source = %case.source_path.display(), "spawned");

        let writer = feed_stdin(guard.child.stdin.take(), case.input.clone());
        let stdout = drain(guard.child.stdout.take());
        let stderr = drain(guard.child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = guard.child.try_wait()? {
                debug!(pid = guard.id(), %status, "exited");
                break;
            }
            if Instant::now() >= deadline {
                guard.kill();
                return Err(self.timed_out());
            }
            thread::sleep(POLL_INTERVAL);
        }
        guard.reaped = true;

        // Stream threads left behind on timeout are detached.
        self.collect(&writer, deadline)?;
        Ok(CapturedOutput {
            stdout: decode(self.collect(&stdout, deadline)?),
            stderr: decode(self.collect(&stderr, deadline)?),
        })
    }

    /// Waits for a stream thread's result until `deadline`.
    fn collect<T>(&self, rx: &Receiver<io::Result<T>>, deadline: Instant) -> Result<T, RunError> {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => Ok(result?),
            Err(RecvTimeoutError::Timeout) => {
                debug!(after_ms = self.timeout.as_millis() as u64, "pipes still open at deadline");
                Err(self.timed_out())
            }
            Err(RecvTimeoutError::Disconnected) => Err(RunError::Io(io::Error::new(
                io::ErrorKind::Other,
                "stream thread panicked",
            ))),
        }
    }

    fn timed_out(&self) -> RunError {
        RunError::TimedOut {
            after: self.timeout,
        }
    }
}

// ============================================================================
// PROCESS OWNERSHIP
// ============================================================================

struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn id(&self) -> u32 {
        self.child.id()
    }

    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.child.kill() {
            warn!(pid = self.id(), error = %e, "failed to kill child");
        }
        let _ = self.child.wait();
        self.reaped = true;
        debug!(pid = self.id(), "killed");
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

// ============================================================================
// STREAM HELPERS
// ============================================================================

/// Runs `work` on its own thread and hands back a channel for its result.
fn background<T, F>(work: F) -> Receiver<io::Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver is gone once the case has timed out.
        let _ = tx.send(work());
    });
    rx
}

fn feed_stdin(stdin: Option<ChildStdin>, input: Option<String>) -> Receiver<io::Result<()>> {
    background(move || {
        let Some(mut stdin) = stdin else {
            return Ok(());
        };
        if let Some(input) = input {
            match stdin.write_all(input.as_bytes()) {
                // The child may exit without reading its input.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
                other => other?,
            }
        }
        Ok(())
    })
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> Receiver<io::Result<Vec<u8>>> {
    background(move || {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            stream.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-vmake");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Retries spawns that race with another test thread writing its script (ETXTBSY).
    fn run(runner: &TestRunner, case: &TestCase) -> Result<CapturedOutput, RunError> {
        for _ in 0..5 {
            match runner.run(case) {
                Err(RunError::Spawn { source, .. }) if source.raw_os_error() == Some(26) => {
                    thread::sleep(Duration::from_millis(20));
                }
                other => return other,
            }
        }
        runner.run(case)
    }

    fn case_in(dir: &Path, input: Option<&str>) -> TestCase {
        let source = dir.join("main.vmake");
        fs::write(&source, "hello\n").unwrap();
        TestCase {
            directory: dir.to_path_buf(),
            input: input.map(str::to_string),
            expected_stdout: None,
            expected_stderr: None,
            source_path: source,
        }
    }

    #[test]
    fn passes_source_path_and_captures_streams() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), r#"cat "$1"; printf 'oops\n' >&2"#);
        let runner = TestRunner::new(exe, Duration::from_secs(5));
        let out = run(&runner, &case_in(dir.path(), None)).unwrap();
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[test]
    fn feeds_input_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "cat");
        let runner = TestRunner::new(exe, Duration::from_secs(5));
        let out = run(&runner, &case_in(dir.path(), Some("abc\n"))).unwrap();
        assert_eq!(out.stdout, "abc\n");
    }

    #[test]
    fn stdin_is_closed_without_input() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "cat; echo done");
        let runner = TestRunner::new(exe, Duration::from_secs(5));
        let out = run(&runner, &case_in(dir.path(), None)).unwrap();
        assert_eq!(out.stdout, "done\n");
    }

    #[test]
    fn slow_child_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "exec sleep 5");
        let runner = TestRunner::new(exe, Duration::from_millis(100));
        let started = Instant::now();
        let err = run(&runner, &case_in(dir.path(), None)).unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn background_child_holding_pipes_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = script(dir.path(), "echo hi; sleep 5 &");
        let runner = TestRunner::new(exe, Duration::from_millis(300));
        let started = Instant::now();
        let err = run(&runner, &case_in(dir.path(), None)).unwrap_err();
        assert!(err.is_timeout(), "{}", err);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TestRunner::new(dir.path().join("nope"), Duration::from_secs(1));
        let err = run(&runner, &case_in(dir.path(), None)).unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
