use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to execute {cmd}: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{cmd} timed out after {}s", .timeout.as_secs_f32())]
    TimedOut { cmd: String, timeout: Duration },
    #[error("failed waiting for {cmd}: {source}")]
    Wait {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExecError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Kills and reaps the child unless it was already waited on.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        self.reaped = status.is_some();
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Run a command, capturing output, and give up once `timeout` has elapsed.
///
/// A non-zero exit is not an error here; callers inspect `exit_code`.
/// On timeout the child is killed before returning.
pub fn run_cmd_timeout(cmd: &str, args: &[&str], timeout: Duration) -> Result<ExecResult, ExecError> {
    tracing::debug!("running {} {}", cmd, args.join(" "));
    let start = Instant::now();
    let child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| {
            tracing::warn!("failed to spawn {cmd}: {source}");
            ExecError::Spawn {
                cmd: cmd.to_string(),
                source,
            }
        })?;
    let mut guard = ChildGuard {
        child,
        reaped: false,
    };

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout = guard.child.stdout.take().map(drain);
    let stderr = guard.child.stderr.take().map(drain);

    let status = loop {
        match guard.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= timeout => {
                tracing::warn!("{cmd} timed out after {:?}", timeout);
                return Err(ExecError::TimedOut {
                    cmd: cmd.to_string(),
                    timeout,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                return Err(ExecError::Wait {
                    cmd: cmd.to_string(),
                    source,
                });
            }
        }
    };

    // A background process left behind by the child can keep the pipes open
    // past its exit, so reading them is held to the same deadline.
    let deadline = start + timeout;
    let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline)) else {
        tracing::warn!("{cmd} output still open after {:?}", timeout);
        return Err(ExecError::TimedOut {
            cmd: cmd.to_string(),
            timeout,
        });
    };

    let result = ExecResult {
        exit_code: status.code().unwrap_or(-1),
        stdout,
        stderr,
        duration: start.elapsed(),
    };
    tracing::debug!(
        "{cmd} exited with {} in {:?}",
        result.exit_code,
        result.duration
    );
    Ok(result)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            tracing::debug!("pipe read stopped after {} bytes: {e}", buf.len());
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// `None` when the pipe is still open at `deadline`.
fn collect(rx: Option<Receiver<String>>, deadline: Instant) -> Option<String> {
    match rx {
        Some(rx) => rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .ok(),
        None => Some(String::new()),
    }
}
