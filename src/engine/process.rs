//! Bounded execution of external commands.
//!
//! The calling thread owns the `Child` and enforces the deadline. Helper
//! threads only drain stdout and stderr so a chatty child can never block on a
//! full pipe. On timeout the child is killed and reaped, and the readers are
//! given a short grace period before being abandoned (a grandchild holding the
//! pipe open must not hang the scan).

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const REAP_TIMEOUT: Duration = Duration::from_secs(5);
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Captured result of a command that finished before its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run `command` to completion, killing it if it outlives `timeout`.
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<ProcessOutput, ProcessError> {
    let program = command.get_program().to_string_lossy().into_owned();

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = reap(&mut child);
                return Err(ProcessError::Wait { program, source });
            }
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = reap(&mut child);
            drop(child);
            abandon_reader(stdout);
            abandon_reader(stderr);
            return Err(ProcessError::Timeout { program, timeout });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    // The child is gone, but a grandchild may still hold the pipes open.
    let (Some(stdout), Some(stderr)) = (join_reader_until(stdout, deadline), join_reader_until(stderr, deadline))
    else {
        return Err(ProcessError::Timeout { program, timeout });
    };

    Ok(ProcessOutput {
        stdout,
        stderr,
        exit_code: status.code(),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join a reader if it finishes before `deadline`; `None` if it is still blocked.
fn join_reader_until(handle: Option<JoinHandle<String>>, deadline: Instant) -> Option<String> {
    let Some(handle) = handle else {
        return Some(String::new());
    };
    loop {
        if handle.is_finished() {
            return Some(handle.join().unwrap_or_default());
        }
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Give a reader a bounded chance to finish after the child was killed.
fn abandon_reader(handle: Option<JoinHandle<String>>) {
    let Some(handle) = handle else { return };
    let deadline = Instant::now() + READER_JOIN_TIMEOUT;
    while Instant::now() < deadline {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Wait for a killed child with a bounded timeout.
fn reap(child: &mut std::process::Child) -> Option<ExitStatus> {
    let deadline = Instant::now() + REAP_TIMEOUT;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(_) => return None,
        }
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
