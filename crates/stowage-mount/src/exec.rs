//! Deadline-bounded execution of external commands.
//!
//! Mount tooling is the canonical place for processes to hang: a mount
//! against a dead server can sit in uninterruptible sleep well past any
//! useful deadline. Instead of waiting on the child directly, the child is
//! polled at a caller-chosen interval and killed once its deadline passes.
//! Output pipes are drained on background threads the whole time, so a
//! chatty child never deadlocks against a full pipe buffer.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait for the drain threads after the child is gone.
///
/// Normally they finish instantly; the timeout only matters when a
/// grandchild process inherited the pipe and keeps it open.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// A command that ran to completion before its deadline.
pub(crate) struct CompletedCommand {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CompletedCommand {
    /// Best human-readable account of what the command reported.
    pub fn detail(&self) -> &str {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr;
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout;
        }
        "no output"
    }
}

pub(crate) enum CommandOutcome {
    Completed(CompletedCommand),
    /// The child was killed after running past `limit`.
    TimedOut,
}

/// Run `command`, polling it every `poll` until `limit` has elapsed.
///
/// Returns `Ok(TimedOut)` when the deadline passes; the child is killed
/// first so no zombie lingers. Spawn failures surface as `Err`.
pub(crate) fn run_with_deadline(
    command: &mut Command,
    poll: Duration,
    limit: Duration,
) -> std::io::Result<CommandOutcome> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().map(drain_in_background);
    let stderr = child.stderr.take().map(drain_in_background);

    let deadline = Instant::now() + limit;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(CommandOutcome::TimedOut);
        }
        thread::sleep(poll.min(remaining));
    };

    Ok(CommandOutcome::Completed(CompletedCommand {
        status,
        stdout: stdout.map(collect_drained).unwrap_or_default(),
        stderr: stderr.map(collect_drained).unwrap_or_default(),
    }))
}

fn drain_in_background<R: Read + Send + 'static>(mut pipe: R) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut raw = Vec::new();
        let _ = pipe.read_to_end(&mut raw);
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
    });
    rx
}

fn collect_drained(rx: mpsc::Receiver<String>) -> String {
    rx.recv_timeout(DRAIN_TIMEOUT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(20);

    #[test]
    fn test_captures_output_of_quick_command() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err >&2"]);

        match run_with_deadline(&mut command, POLL, Duration::from_secs(5)).unwrap() {
            CommandOutcome::Completed(done) => {
                assert!(done.status.success());
                assert_eq!(done.stdout.trim(), "out");
                assert_eq!(done.stderr.trim(), "err");
            }
            CommandOutcome::TimedOut => panic!("quick command should not time out"),
        }
    }

    #[test]
    fn test_kills_command_past_deadline() {
        let mut command = Command::new("sleep");
        command.arg("30");

        let started = Instant::now();
        match run_with_deadline(&mut command, POLL, Duration::from_millis(100)).unwrap() {
            CommandOutcome::TimedOut => {}
            CommandOutcome::Completed(_) => panic!("sleep should have been killed"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_detail_prefers_stderr() {
        let done = CompletedCommand {
            status: ExitStatus::default(),
            stdout: "stdout text\n".to_string(),
            stderr: "stderr text\n".to_string(),
        };
        assert_eq!(done.detail(), "stderr text");
    }

    #[test]
    fn test_detail_falls_back_to_stdout_then_placeholder() {
        let mut done = CompletedCommand {
            status: ExitStatus::default(),
            stdout: "only stdout\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(done.detail(), "only stdout");

        done.stdout.clear();
        assert_eq!(done.detail(), "no output");
    }

    #[test]
    fn test_spawn_failure_is_error() {
        let mut command = Command::new("/definitely/not/a/real/binary");
        assert!(run_with_deadline(&mut command, POLL, Duration::from_secs(1)).is_err());
    }
}
