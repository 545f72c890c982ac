// pkgtool-core/src/tools/runner.rs

//! Runs a [`CommandSpec`] as a child process and maps its exit onto a [`ToolOutcome`].
//!
//! The command line is interpreted by the shell from the [`ExecutionContext`]; this
//! module never quotes or escapes it. stdout and stderr are read as two chunk streams
//! and appended to per-stream buffers in arrival order. The run finishes once the
//! process has exited and both streams have closed, or once the drain window after
//! exit has elapsed.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::Instant;
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{CommandSpec, ToolOutcome};
use crate::config::DEFAULT_DRAIN_TIMEOUT_MS;
use crate::context::ExecutionContext;
use crate::errors::ToolError;

/// Knobs for [`run_command`] that come from configuration rather than the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// How long to keep reading output after the process has exited.
    pub drain_timeout: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS),
        }
    }
}

fn is_cmd_shell(shell: &Path) -> bool {
    shell
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.eq_ignore_ascii_case("cmd"))
        .unwrap_or(false)
}

fn shell_command(shell: &Path, command_line: &str) -> Command {
    let mut cmd = Command::new(shell);
    if is_cmd_shell(shell) {
        cmd.args(["/d", "/s", "/c"]);
        #[cfg(windows)]
        cmd.raw_arg(format!("\"{}\"", command_line));
        #[cfg(not(windows))]
        cmd.arg(command_line);
    } else {
        cmd.arg("-c").arg(command_line);
    }
    cmd
}

/// Launches `spec` in `context` and waits for it to finish.
///
/// Returns `Err(ToolError::Launch)` when the process cannot be started; in that case
/// no outcome exists. Otherwise exactly one [`ToolOutcome`] is returned: `Success`
/// for exit code 0 and `Failure` for any other code or a signal termination.
///
/// Cancelling `context.cancellation` kills the child; the run then completes through
/// the same paths, normally as a `Failure` without an exit code.
pub async fn run_command(
    spec: &CommandSpec,
    context: &ExecutionContext,
    settings: &RunnerSettings,
) -> Result<ToolOutcome, ToolError> {
    let command_line = spec.command_line();
    info!(
        command = %command_line,
        working_dir = ?context.working_dir,
        shell = ?context.shell,
        "Launching command"
    );

    let mut cmd = shell_command(&context.shell, &command_line);
    cmd.current_dir(&context.working_dir)
        .env_clear()
        .envs(&context.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            warn!(command = %command_line, error = %source, "Failed to spawn command process");
            return Err(ToolError::Launch {
                command: command_line,
                source,
            });
        }
    };

    let (status, stdout_bytes, stderr_bytes) =
        supervise(&mut child, &context.cancellation, settings.drain_timeout).await?;

    let stdout = String::from_utf8_lossy(&stdout_bytes).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();
    let exit_code = status.code();

    debug!(
        "Command exit status: {:?}\nStdout preview (first 3 lines):\n{}\nStderr preview (first 3 lines):\n{}",
        exit_code,
        stdout.lines().take(3).collect::<Vec<_>>().join("\n"),
        stderr.lines().take(3).collect::<Vec<_>>().join("\n")
    );
    info!(
        command = %command_line,
        exit_code = ?exit_code,
        stdout_len = stdout.len(),
        stderr_len = stderr.len(),
        "Command finished"
    );

    Ok(ToolOutcome::from_exit(exit_code, stdout, stderr))
}

/// Drives the child to completion: collects both streams, waits for exit and
/// reacts to cancellation.
async fn supervise(
    child: &mut Child,
    cancellation: &CancellationToken,
    drain_timeout: Duration,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>), ToolError> {
    let mut stdout = child.stdout.take().map(ReaderStream::new);
    let mut stderr = child.stderr.take().map(ReaderStream::new);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let mut status: Option<ExitStatus> = None;
    let mut kill_requested = false;

    // Only polled once the process has exited; reset at that point.
    let drain = tokio::time::sleep(drain_timeout);
    tokio::pin!(drain);

    loop {
        if let Some(exit) = status {
            if stdout.is_none() && stderr.is_none() {
                return Ok((exit, stdout_buf, stderr_buf));
            }
        }

        tokio::select! {
            chunk = next_chunk(&mut stdout), if stdout.is_some() => {
                if !append_chunk("stdout", chunk, &mut stdout_buf) {
                    stdout = None;
                }
            }
            chunk = next_chunk(&mut stderr), if stderr.is_some() => {
                if !append_chunk("stderr", chunk, &mut stderr_buf) {
                    stderr = None;
                }
            }
            result = child.wait(), if status.is_none() => {
                let exit = result.map_err(ToolError::Wait)?;
                debug!(status = %exit, "Child process exited");
                status = Some(exit);
                drain.as_mut().reset(Instant::now() + drain_timeout);
            }
            _ = cancellation.cancelled(), if status.is_none() && !kill_requested => {
                info!("Cancellation requested, killing child process");
                kill_requested = true;
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "Failed to kill child process");
                }
            }
            _ = &mut drain, if status.is_some() => {
                warn!(
                    timeout_ms = drain_timeout.as_millis() as u64,
                    "Output streams still open after the process exited, finishing with output read so far"
                );
                if let Some(exit) = status {
                    return Ok((exit, stdout_buf, stderr_buf));
                }
            }
        }
    }
}

async fn next_chunk<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

/// Appends a chunk to `buffer`. Returns `false` once the stream is finished.
fn append_chunk<B: AsRef<[u8]>>(
    stream_name: &str,
    chunk: Option<io::Result<B>>,
    buffer: &mut Vec<u8>,
) -> bool {
    match chunk {
        Some(Ok(bytes)) => {
            let bytes = bytes.as_ref();
            trace!(stream = stream_name, len = bytes.len(), "Received output chunk");
            buffer.extend_from_slice(bytes);
            true
        }
        Some(Err(e)) => {
            warn!(stream = stream_name, error = %e, "Failed to read output stream, closing it");
            false
        }
        None => {
            trace!(stream = stream_name, "Output stream closed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_shell_detection() {
        assert!(is_cmd_shell(Path::new("cmd.exe")));
        assert!(is_cmd_shell(Path::new("C:/Windows/System32/CMD.EXE")));
        assert!(!is_cmd_shell(Path::new("/bin/sh")));
        assert!(!is_cmd_shell(Path::new("/usr/bin/bash")));
        assert!(!is_cmd_shell(Path::new("")));
    }

    #[test]
    fn test_append_chunk() {
        let mut buffer = Vec::new();
        assert!(append_chunk("stdout", Some(Ok(b"ab".to_vec())), &mut buffer));
        assert!(append_chunk("stdout", Some(Ok(b"c".to_vec())), &mut buffer));
        assert_eq!(buffer, b"abc");

        assert!(!append_chunk::<Vec<u8>>("stdout", None, &mut buffer));
        let err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(!append_chunk::<Vec<u8>>("stdout", Some(Err(err)), &mut buffer));
        assert_eq!(buffer, b"abc");
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use crate::tools::ProcessOutput;
        use std::path::PathBuf;
        use tempfile::TempDir;

        fn test_context(dir: &TempDir) -> ExecutionContext {
            let _ = tracing_subscriber::fmt().with_test_writer().try_init();
            ExecutionContext::inheriting_env(dir.path(), "/bin/sh")
        }

        fn sh(script: &str) -> CommandSpec {
            CommandSpec::new("sh", ["-c".to_string(), format!("'{}'", script)])
        }

        fn settings(drain_ms: u64) -> RunnerSettings {
            RunnerSettings {
                drain_timeout: Duration::from_millis(drain_ms),
            }
        }

        #[tokio::test]
        async fn test_success_captures_stdout() {
            let dir = tempfile::tempdir().unwrap();
            let spec = CommandSpec::new("echo", ["Hello", "Runner"]);
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            assert_eq!(
                outcome,
                ToolOutcome::Success(ProcessOutput {
                    stdout: "Hello Runner\n".to_string(),
                    stderr: String::new(),
                })
            );
        }

        #[tokio::test]
        async fn test_non_zero_exit_is_failure_with_code_and_streams() {
            let dir = tempfile::tempdir().unwrap();
            let spec = sh("echo partial; echo oops >&2; exit 3");
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            match outcome {
                ToolOutcome::Failure(fail) => {
                    assert_eq!(fail.exit_code, Some(3));
                    assert_eq!(fail.stdout, "partial\n");
                    assert_eq!(fail.stderr, "oops\n");
                    assert_eq!(fail.error.to_string(), "Unexpected exit code");
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_chunks_concatenate_in_arrival_order() {
            let dir = tempfile::tempdir().unwrap();
            let spec = sh("printf one; sleep 0.1; printf two >&2; sleep 0.1; printf three");
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            assert!(outcome.is_success());
            assert_eq!(outcome.stdout(), "onethree");
            assert_eq!(outcome.stderr(), "two");
        }

        #[tokio::test]
        async fn test_multibyte_char_split_across_chunks() {
            let dir = tempfile::tempdir().unwrap();
            // "é" is 0xC3 0xA9; the two bytes arrive in separate writes.
            let spec = sh("printf \"\\303\"; sleep 0.2; printf \"\\251\\n\"");
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            assert!(outcome.is_success());
            assert_eq!(outcome.stdout(), "\u{e9}\n");
        }

        #[tokio::test]
        async fn test_large_output_is_captured_completely() {
            let dir = tempfile::tempdir().unwrap();
            let spec = CommandSpec::new("seq", ["1", "20000"]);
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            let expected: String = (1..=20000).map(|n| format!("{}\n", n)).collect();
            assert!(outcome.is_success());
            assert_eq!(outcome.stdout(), expected);
        }

        #[tokio::test]
        async fn test_runs_in_working_directory() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
            let spec = CommandSpec::new("cat", ["marker.txt"]);
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            assert_eq!(outcome.stdout(), "here");
        }

        #[tokio::test]
        async fn test_environment_is_explicit() {
            let dir = tempfile::tempdir().unwrap();
            let ctx = ExecutionContext::new(dir.path(), "/bin/sh")
                .with_env_var("PKGTOOL_TEST", "visible");
            let spec = CommandSpec::new("echo", ["\"$PKGTOOL_TEST\"", "\"${HOME:-unset}\""]);
            let outcome = run_command(&spec, &ctx, &RunnerSettings::default())
                .await
                .unwrap();
            assert_eq!(outcome.stdout(), "visible unset\n");
        }

        #[tokio::test]
        async fn test_signal_termination_has_no_exit_code() {
            let dir = tempfile::tempdir().unwrap();
            // `$$` is the shell running the command line, i.e. the direct child.
            let spec = CommandSpec::new("kill", ["-9", "$$"]);
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            match outcome {
                ToolOutcome::Failure(fail) => assert_eq!(fail.exit_code, None),
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_missing_shell_is_launch_error() {
            let dir = tempfile::tempdir().unwrap();
            let ctx = ExecutionContext::inheriting_env(dir.path(), "/nonexistent/pkgtool-shell");
            let spec = CommandSpec::new("echo", ["hi"]);
            let result = run_command(&spec, &ctx, &RunnerSettings::default()).await;
            match result {
                Err(ToolError::Launch { command, source }) => {
                    assert_eq!(command, "echo hi");
                    assert_eq!(source.kind(), io::ErrorKind::NotFound);
                }
                other => panic!("expected launch error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_missing_working_dir_is_launch_error() {
            let dir = tempfile::tempdir().unwrap();
            let missing: PathBuf = dir.path().join("does-not-exist");
            let ctx = ExecutionContext::inheriting_env(missing, "/bin/sh");
            let spec = CommandSpec::new("echo", ["hi"]);
            let result = run_command(&spec, &ctx, &RunnerSettings::default()).await;
            assert!(matches!(result, Err(ToolError::Launch { .. })));
        }

        #[tokio::test]
        async fn test_missing_program_is_reported_by_the_shell() {
            let dir = tempfile::tempdir().unwrap();
            let spec =
                CommandSpec::new("this_command_does_not_exist_qwertyuiop", Vec::<String>::new());
            let outcome = run_command(&spec, &test_context(&dir), &RunnerSettings::default())
                .await
                .unwrap();
            match outcome {
                ToolOutcome::Failure(fail) => {
                    assert_eq!(fail.exit_code, Some(127));
                    assert!(fail.stderr.contains("not found"));
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_cancellation_mid_run_resolves() {
            let dir = tempfile::tempdir().unwrap();
            let ctx = test_context(&dir);
            let token = ctx.cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                token.cancel();
            });

            let spec = CommandSpec::new("sleep", ["30"]);
            let result = tokio::time::timeout(
                Duration::from_secs(10),
                run_command(&spec, &ctx, &settings(300)),
            )
            .await
            .expect("cancelled run must not hang");

            match result.unwrap() {
                ToolOutcome::Failure(fail) => assert_eq!(fail.exit_code, None),
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_pre_cancelled_token_still_resolves() {
            let dir = tempfile::tempdir().unwrap();
            let ctx = test_context(&dir);
            ctx.cancellation.cancel();

            let spec = CommandSpec::new("sleep", ["30"]);
            let result = tokio::time::timeout(
                Duration::from_secs(10),
                run_command(&spec, &ctx, &settings(300)),
            )
            .await
            .expect("cancelled run must not hang");
            assert!(!result.unwrap().is_success());
        }

        #[tokio::test]
        async fn test_drain_window_bounds_wait_for_inherited_pipes() {
            let dir = tempfile::tempdir().unwrap();
            let spec = sh("(sleep 5 &); echo done");
            let started = std::time::Instant::now();
            let outcome = run_command(&spec, &test_context(&dir), &settings(200))
                .await
                .unwrap();
            assert!(started.elapsed() < Duration::from_secs(4));
            assert!(outcome.is_success());
            assert_eq!(outcome.stdout(), "done\n");
        }
    }
}
