// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Supervised execution of external programs: a bounded wait, stderr capture,
// and errors classified so callers can fall back to built-in code.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use folio_core::error::{FolioError, Result};
use tracing::{debug, warn};

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Time limit for availability probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run `command` to completion, killing it once `timeout` has elapsed.
///
/// - program missing → [`FolioError::ToolUnavailable`]
/// - non-zero exit → [`FolioError::ExternalTool`] carrying stderr
/// - deadline passed → [`FolioError::ToolTimeout`]
pub fn run_with_timeout(mut command: Command, tool: &str, timeout: Duration) -> Result<()> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => FolioError::ToolUnavailable(tool.to_string()),
        _ => FolioError::ExternalTool {
            tool: tool.to_string(),
            reason: format!("failed to start: {err}"),
        },
    })?;

    // Drain stderr on a helper thread so a chatty tool can't block on a full pipe.
    let stderr = child.stderr.take();
    let stderr_reader = std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                warn!(tool, timeout_secs = timeout.as_secs(), "Tool timed out; killing");
                let _ = child.kill();
                let _ = child.wait();
                // The reader thread is left detached: grandchildren may still
                // hold the pipe open.
                return Err(FolioError::ToolTimeout {
                    tool: tool.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                return Err(FolioError::ExternalTool {
                    tool: tool.to_string(),
                    reason: format!("failed to wait for process: {err}"),
                });
            }
        }
    };

    let stderr_text = stderr_reader.join().unwrap_or_default();
    debug!(tool, %status, elapsed_ms = started.elapsed().as_millis() as u64, "Tool finished");

    if status.success() {
        Ok(())
    } else {
        Err(FolioError::ExternalTool {
            tool: tool.to_string(),
            reason: format!("{status}: {}", stderr_text.trim()),
        })
    }
}

/// True when `program args...` starts and exits successfully within
/// [`PROBE_TIMEOUT`].
pub fn probe(program: &str, args: &[&str]) -> bool {
    let mut command = Command::new(program);
    command.args(args);
    match run_with_timeout(command, program, PROBE_TIMEOUT) {
        Ok(()) => true,
        Err(err) => {
            debug!(program, error = %err, "Probe failed");
            false
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[test]
    fn success_is_ok() {
        run_with_timeout(sh("exit 0"), "sh", Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn failure_carries_stderr() {
        let err = run_with_timeout(sh("echo boom >&2; exit 3"), "sh", Duration::from_secs(5))
            .unwrap_err();
        match err {
            FolioError::ExternalTool { tool, reason } => {
                assert_eq!(tool, "sh");
                assert!(reason.contains("boom"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn slow_tool_times_out() {
        let started = Instant::now();
        let err = run_with_timeout(sh("sleep 5"), "sh", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, FolioError::ToolTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let err = run_with_timeout(
            Command::new("folio-definitely-not-installed"),
            "folio-definitely-not-installed",
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, FolioError::ToolUnavailable(_)));
        assert!(!probe("folio-definitely-not-installed", &["-version"]));
    }
}
