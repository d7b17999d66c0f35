// Helpers for running the external tools

use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use super::config::DownloaderConfig;
use super::errors::DownloadError;

/// Run a command with captured output and a timeout.
///
/// A missing binary maps to `ToolNotFound`, an expired timeout kills the child
/// and maps to `Timeout`. A non-zero exit is NOT an error here; callers look at
/// `status` themselves.
pub async fn run_output_with_timeout(
    program: &Path,
    args: Vec<OsString>,
    timeout_secs: u64,
) -> Result<Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DownloadError::ToolNotFound(program.display().to_string())
            } else {
                DownloadError::ExecutionError(format!(
                    "Failed to start {}: {}",
                    program.display(),
                    e
                ))
            }
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!("Failed to capture stdout from {}", program.display()))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!("Failed to capture stderr from {}", program.display()))
    })?;

    // Drain both pipes concurrently so a chatty child never blocks on a full pipe
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status) => {
            let status = status?;
            let stdout = join_pipe(stdout_task, "stdout").await?;
            let stderr = join_pipe(stderr_task, "stderr").await?;
            Ok(Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Timeout(timeout_secs))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::ExecutionError(format!("{} task failed: {}", name, e)))?
        .map_err(DownloadError::from)
}

/// Last non-empty lines of a tool's stderr, for error messages
pub fn stderr_tail(stderr: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let tail: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = tail.len().saturating_sub(lines);
    tail[start..].join("\n")
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(config: &DownloaderConfig) -> Vec<OsString> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".into());
        args.push(proxy.into());
    }

    args
}

/// Build timeout arguments for yt-dlp
pub fn get_timeout_args(config: &DownloaderConfig) -> Vec<OsString> {
    vec![
        "--socket-timeout".into(),
        config.socket_timeout_secs.to_string().into(),
    ]
}
