//! Process execution.
//!
//! Runs one `op` invocation per call. Captured commands pipe stdout and
//! stderr back to the caller; interactive commands inherit the terminal.
//! Stdin payloads (secrets or JSON documents) are written from a separate
//! thread while two more drain the output pipes, so neither side can block
//! the other. With a timeout, nothing waits past the deadline: the child is
//! killed, and pipes still held open by its descendants are abandoned.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::core::command::{Command, Mode};
use crate::error::{CommandError, Result};

/// Environment merged into every child process.
///
/// Values are session tokens, so they are wiped on drop.
pub type ChildEnv = BTreeMap<String, Zeroizing<String>>;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to keep reading output after the process is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

/// Runs commands against a resolved `op` binary.
#[derive(Debug, Clone)]
pub struct Executor {
    binary: PathBuf,
}

impl Executor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run a command and return its stdout.
    ///
    /// Interactive commands return an empty buffer since their output goes
    /// straight to the terminal. `timeout` bounds every mode.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if the process cannot be spawned, exits
    /// non-zero, or outlives `timeout` (in which case it is killed).
    pub fn run(
        &self,
        cmd: &Command,
        env: &ChildEnv,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        debug!(argv = ?cmd.argv(), mode = ?cmd.mode(), ?timeout, "running op");

        match cmd.mode() {
            Mode::Interactive => self.run_interactive(cmd, env, timeout),
            Mode::Capture | Mode::SignIn => self.run_captured(cmd, env, timeout),
        }
    }

    fn process(&self, cmd: &Command, env: &ChildEnv) -> std::process::Command {
        let mut process = std::process::Command::new(&self.binary);
        process
            .args(cmd.argv())
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        process
    }

    fn run_interactive(
        &self,
        cmd: &Command,
        env: &ChildEnv,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        let mut child = self
            .process(cmd, env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(CommandError::io)?;

        let deadline = timeout.map(|t| Instant::now() + t);
        match wait(&mut child, deadline).map_err(CommandError::io)? {
            Waited::Exited(status) if status.success() => Ok(Vec::new()),
            Waited::Exited(status) => Err(CommandError::exited(String::new(), status).into()),
            Waited::TimedOut => {
                warn!(argv = ?cmd.argv(), "interactive op timed out and was killed");
                Err(CommandError::timeout(String::new()).into())
            }
        }
    }

    fn run_captured(
        &self,
        cmd: &Command,
        env: &ChildEnv,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        let stdin_mode = if cmd.stdin().is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let mut child = self
            .process(cmd, env)
            .stdin(stdin_mode)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(CommandError::io)?;
        let deadline = timeout.map(|t| Instant::now() + t);

        // Detached: descendants of `op` may hold the pipes past the deadline.
        let writer = match (child.stdin.take(), cmd.stdin().map(|s| s.bytes())) {
            (Some(mut pipe), Some(bytes)) => Some(background(move || {
                trace!(bytes = bytes.len(), "writing stdin payload");
                let result = pipe.write_all(&bytes).and_then(|_| pipe.flush());
                // pipe dropped here: the child sees EOF either way
                drop(pipe);
                result
            })),
            _ => None,
        };
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out = background(move || drain(stdout));
        let err = background(move || drain(stderr));

        let status = wait(&mut child, deadline);
        let drain_deadline = deadline.map(|d| d.max(Instant::now()) + DRAIN_GRACE);

        if let Some(writer) = writer {
            match collect(&writer, drain_deadline) {
                Some(Ok(())) => {}
                Some(Err(e)) => warn!(error = %e, "failed to write to op stdin"),
                None => warn!("stdin writer did not finish"),
            }
        }
        let stdout = collect(&out, drain_deadline);
        let stderr = collect(&err, drain_deadline);
        if stdout.is_none() || stderr.is_none() {
            warn!("op output pipes still open after exit, giving up on them");
        }
        let stdout = stdout.unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr.unwrap_or_default()).into_owned();
        trace!(
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            "op finished"
        );

        match status.map_err(CommandError::io)? {
            Waited::Exited(status) if status.success() => Ok(stdout),
            Waited::Exited(status) => {
                debug!(%status, stderr = %stderr.trim(), "op exited with failure");
                Err(CommandError::exited(stderr, status).into())
            }
            Waited::TimedOut => {
                warn!(argv = ?cmd.argv(), "op timed out and was killed");
                Err(CommandError::timeout(stderr).into())
            }
        }
    }
}

enum Waited {
    Exited(ExitStatus),
    TimedOut,
}

/// Wait for the child, killing it once `deadline` passes.
fn wait(child: &mut Child, deadline: Option<Instant>) -> std::io::Result<Waited> {
    let Some(deadline) = deadline else {
        return child.wait().map(Waited::Exited);
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Waited::Exited(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(Waited::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run `f` on a detached thread and hand back a receiver for its result.
fn background<T, F>(f: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx
}

/// Result of a background task, or `None` if it missed the deadline.
fn collect<T>(rx: &Receiver<T>, deadline: Option<Instant>) -> Option<T> {
    match deadline {
        None => rx.recv().ok(),
        Some(deadline) => rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .ok(),
    }
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf) {
            warn!(error = %e, "failed to read op output");
        }
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> Executor {
        let path = dir.path().join("op");
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        Executor::new(path)
    }

    #[test]
    fn test_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "echo '[]'\n");
        let out = exec
            .run(&Command::new(["vault", "list"]), &ChildEnv::new(), None)
            .unwrap();
        assert_eq!(out, b"[]\n");
    }

    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "echo 'ignored'\necho 'vault not found' >&2\nexit 1\n");
        let err = exec
            .run(&Command::new(["vault", "get", "x"]), &ChildEnv::new(), None)
            .unwrap_err();
        match err {
            crate::error::Error::Command(e) => {
                assert_eq!(e.stderr.trim(), "vault not found");
                assert_eq!(e.to_string(), "vault not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_secret_goes_to_stdin() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "read pw\necho \"got:$pw\"\n");
        let cmd = Command::signin("u1").secret(Zeroizing::new("hunter2".to_string()));
        let out = exec.run(&cmd, &ChildEnv::new(), None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "got:hunter2");
    }

    #[test]
    fn test_env_is_passed_to_child() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "printf '%s' \"$OP_SESSION_u1\"\n");
        let mut env = ChildEnv::new();
        env.insert("OP_SESSION_u1".to_string(), Zeroizing::new("tok".to_string()));
        let out = exec.run(&Command::new(["whoami"]), &env, None).unwrap();
        assert_eq!(out, b"tok");
    }

    #[test]
    fn test_timeout_kills_child() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "exec sleep 5\n");
        let started = Instant::now();
        let err = exec
            .run(
                &Command::signin("u1"),
                &ChildEnv::new(),
                Some(Duration::from_millis(100)),
            )
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            crate::error::Error::Command(e) => assert!(e.timed_out),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_does_not_wait_for_descendants() {
        let dir = TempDir::new().unwrap();
        // no exec: the shell forks sleep, which inherits stdout and stderr
        let exec = script(&dir, "sleep 5\necho done\n");
        let started = Instant::now();
        let err = exec
            .run(
                &Command::signin("u1"),
                &ChildEnv::new(),
                Some(Duration::from_millis(200)),
            )
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3));
        match err {
            crate::error::Error::Command(e) => assert!(e.timed_out),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_interactive_honors_timeout() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "exec sleep 5\n");
        let started = Instant::now();
        let err = exec
            .run(
                &Command::interactive(["account", "add"]),
                &ChildEnv::new(),
                Some(Duration::from_millis(100)),
            )
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            crate::error::Error::Command(e) => assert!(e.timed_out),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_interactive_failure_has_status() {
        let dir = TempDir::new().unwrap();
        let exec = script(&dir, "exit 3\n");
        let err = exec
            .run(&Command::interactive(["account", "add"]), &ChildEnv::new(), None)
            .unwrap_err();
        match err {
            crate::error::Error::Command(e) => {
                assert!(!e.timed_out);
                assert_eq!(e.status.and_then(|s| s.code()), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_spawn_failure() {
        let exec = Executor::new("/nonexistent/op");
        let err = exec
            .run(&Command::new(["vault", "list"]), &ChildEnv::new(), None)
            .unwrap_err();
        match err {
            crate::error::Error::Command(e) => assert!(e.source.is_some()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
