use crate::errors::{AdbError, AdbResult};
use async_stream::stream;
use async_trait::async_trait;
use futures_core::Stream;
use log::{debug, error};
use std::pin::Pin;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

const RECV_BUFFER_SIZE: usize = 4096;

/// One observable step in the life of a spawned process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A chunk of standard output.
    Stdout(String),
    /// A chunk of standard error.
    Stderr(String),
    /// The process could not be observed further; terminal.
    Error(String),
    /// The process finished with this status code; terminal.
    Exit(Option<i32>),
}

/// Knobs for [`CommandRunner::stream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Kill the spawned process when the stream is dropped. Used for
    /// commands that never exit on their own, such as `jdwp` or `logcat`.
    pub kill_tree: bool,
    /// Report a non zero exit status as an [`ProcessEvent::Error`]
    /// instead of an [`ProcessEvent::Exit`].
    pub status_as_error: bool,
}

pub type EventStream = Pin<Box<dyn Stream<Item = ProcessEvent> + Send>>;

/// How commands reach the outside world. The default implementation
/// spawns real processes; tests substitute a scripted one.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and hand back raw stdout. A non
    /// zero exit status is an error carrying stderr, or stdout when
    /// stderr is empty, since adb reports some failures on stdout.
    async fn output(&self, program: &str, args: &[String]) -> AdbResult<String>;

    /// Spawn the command and observe its output incrementally.
    async fn stream(
        &self,
        program: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> AdbResult<EventStream>;
}

fn render_command(program: &str, args: &[String]) -> String {
    format!("{} {}", program, args.join(" "))
}

/// Runner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn output(&self, program: &str, args: &[String]) -> AdbResult<String> {
        let command_line = render_command(program, args);
        debug!("run: {}", command_line);
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            error!("command failed: {} >>> {}", command_line, reason);
            return Err(AdbError::command_failed(command_line, reason));
        }
        Ok(stdout)
    }

    async fn stream(
        &self,
        program: &str,
        args: &[String],
        options: SpawnOptions,
    ) -> AdbResult<EventStream> {
        let command_line = render_command(program, args);
        debug!("spawn: {}", command_line);
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(options.kill_tree)
            .spawn()?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| AdbError::unknown("child stdout was not piped"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| AdbError::unknown("child stderr was not piped"))?;

        let events = stream! {
            let mut out_buf = [0u8; RECV_BUFFER_SIZE];
            let mut err_buf = [0u8; RECV_BUFFER_SIZE];
            let mut out_open = true;
            let mut err_open = true;
            let mut failed = false;
            while (out_open || err_open) && !failed {
                tokio::select! {
                    read = stdout.read(&mut out_buf), if out_open => match read {
                        Ok(0) => out_open = false,
                        Ok(n) => {
                            yield ProcessEvent::Stdout(
                                String::from_utf8_lossy(&out_buf[..n]).to_string(),
                            );
                        }
                        Err(e) => {
                            yield ProcessEvent::Error(e.to_string());
                            failed = true;
                        }
                    },
                    read = stderr.read(&mut err_buf), if err_open => match read {
                        Ok(0) => err_open = false,
                        Ok(n) => {
                            yield ProcessEvent::Stderr(
                                String::from_utf8_lossy(&err_buf[..n]).to_string(),
                            );
                        }
                        Err(e) => {
                            yield ProcessEvent::Error(e.to_string());
                            failed = true;
                        }
                    },
                }
            }
            if !failed {
                match child.wait().await {
                    Ok(status) if options.status_as_error && !status.success() => {
                        yield ProcessEvent::Error(format!(
                            "{} exited with {}",
                            command_line, status
                        ));
                    }
                    Ok(status) => yield ProcessEvent::Exit(status.code()),
                    Err(e) => yield ProcessEvent::Error(e.to_string()),
                }
            }
        };
        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_collects_stdout() {
        let runner = TokioCommandRunner;
        let out = runner.output("echo", &["hello".to_string()]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_failure_carries_stderr() {
        let runner = TokioCommandRunner;
        let err = runner
            .output("sh", &["-c".to_string(), "echo boom >&2; exit 3".to_string()])
            .await
            .unwrap_err();
        match err {
            AdbError::CommandFailed { reason, .. } => assert!(reason.contains("boom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_failure_falls_back_to_stdout() {
        let runner = TokioCommandRunner;
        let err = runner
            .output("sh", &["-c".to_string(), "echo oops; exit 1".to_string()])
            .await
            .unwrap_err();
        match err {
            AdbError::CommandFailed { reason, .. } => assert_eq!(reason, "oops"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_events() {
        let runner = TokioCommandRunner;
        let mut events = runner
            .stream(
                "sh",
                &["-c".to_string(), "echo out; echo err >&2".to_string()],
                SpawnOptions::default(),
            )
            .await
            .unwrap();
        let mut saw_stdout = false;
        let mut saw_stderr = false;
        let mut exit = None;
        while let Some(event) = events.next().await {
            match event {
                ProcessEvent::Stdout(s) => saw_stdout = saw_stdout || s.contains("out"),
                ProcessEvent::Stderr(s) => saw_stderr = saw_stderr || s.contains("err"),
                ProcessEvent::Exit(code) => exit = code,
                ProcessEvent::Error(e) => panic!("unexpected error event: {}", e),
            }
        }
        assert!(saw_stdout);
        assert!(saw_stderr);
        assert_eq!(exit, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_status_as_error() {
        let runner = TokioCommandRunner;
        let mut events = runner
            .stream(
                "sh",
                &["-c".to_string(), "exit 7".to_string()],
                SpawnOptions {
                    kill_tree: false,
                    status_as_error: true,
                },
            )
            .await
            .unwrap();
        let mut last = None;
        while let Some(event) = events.next().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(ProcessEvent::Error(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let runner = TokioCommandRunner;
        let args: Vec<String> = vec![];
        let result = runner.output("adbutil-no-such-binary", &args).await;
        assert!(result.is_err());
    }
}
