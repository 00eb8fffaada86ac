// SPDX-License-Identifier: MIT

//! Worker process spawn, readiness handshake, and graceful termination.
//!
//! A worker signals readiness by writing a single `READY port=<port>` line
//! to its inherited stdout once its listener is bound and its classifier has
//! completed warm-up. This replaces the fixed post-spawn sleep used by the
//! original implementation, which could hand a caller an endpoint before the
//! worker was actually able to serve it.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use signrt_core::ModelId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

use crate::error::ControllerError;

pub async fn spawn_worker(
    worker_bin: &str,
    model_id: &ModelId,
    descriptor_path: &Path,
    weights_path: &Path,
    port: u16,
    readiness_timeout: Duration,
) -> Result<Child, ControllerError> {
    let mut cmd = Command::new(worker_bin);
    cmd.arg("--port")
        .arg(port.to_string())
        .arg("--model-id")
        .arg(model_id.as_str())
        .arg("--descriptor")
        .arg(descriptor_path)
        .arg("--weights")
        .arg(weights_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| ControllerError::WorkerStartFailed {
        model_id: model_id.clone(),
        cause: format!("spawn failed: {e}"),
    })?;

    let stdout = child.stdout.take().ok_or_else(|| ControllerError::WorkerStartFailed {
        model_id: model_id.clone(),
        cause: "child stdout was not piped".into(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| ControllerError::WorkerStartFailed {
        model_id: model_id.clone(),
        cause: "child stderr was not piped".into(),
    })?;

    forward_stderr(model_id.clone(), stderr);
    wait_for_ready(model_id, stdout, readiness_timeout).await?;

    tracing::info!(model_id = %model_id, port, "worker ready");
    Ok(child)
}

fn forward_stderr(model_id: ModelId, stderr: tokio::process::ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(model_id = %model_id, "worker stderr: {line}");
        }
    });
}

async fn wait_for_ready(
    model_id: &ModelId,
    stdout: ChildStdout,
    timeout: Duration,
) -> Result<(), ControllerError> {
    let mut lines = BufReader::new(stdout).lines();

    let outcome = tokio::time::timeout(timeout, async {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.starts_with("READY") => return Ok(lines),
                Ok(Some(line)) => {
                    tracing::debug!(model_id = %model_id, "worker stdout: {line}");
                }
                Ok(None) => {
                    return Err("worker stdout closed before signaling ready".to_string());
                }
                Err(e) => return Err(format!("failed to read worker stdout: {e}")),
            }
        }
    })
    .await;

    let lines = match outcome {
        Ok(Ok(lines)) => lines,
        Ok(Err(cause)) => {
            return Err(ControllerError::WorkerStartFailed { model_id: model_id.clone(), cause })
        }
        Err(_) => {
            return Err(ControllerError::WorkerStartFailed {
                model_id: model_id.clone(),
                cause: format!("worker did not become ready within {timeout:?}"),
            })
        }
    };

    // Keep draining stdout after readiness so the worker's pipe never fills.
    let model_id = model_id.clone();
    let mut lines = lines;
    tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(model_id = %model_id, "worker stdout: {line}");
        }
    });

    Ok(())
}

/// Ask a process to exit, escalating to a hard kill if it does not within
/// `grace`. Best-effort: a process that already exited is not an error.
pub async fn terminate_gracefully(child: &mut Child, grace: Duration) {
    if let Some(pid) = child.id() {
        send_sigterm(pid);
    }

    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        let _ = child.kill().await;
        let _ = child.wait().await;
    }
}

#[cfg(unix)]
fn send_sigterm(pid: u32) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
fn send_sigterm(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn spawn_fails_cleanly_for_missing_binary() {
        let err = spawn_worker(
            "definitely-not-a-real-binary-on-this-system",
            &ModelId::new("m1"),
            Path::new("/tmp/descriptor.json"),
            Path::new("/tmp/weights.bin"),
            9001,
            Duration::from_millis(500),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ControllerError::WorkerStartFailed { .. }));
    }

    #[tokio::test]
    async fn readiness_fails_when_process_never_prints_ready() {
        // `sleep` rejects our flags and exits without ever writing READY.
        let err = spawn_worker(
            "sleep",
            &ModelId::new("m1"),
            Path::new("/tmp/descriptor.json"),
            Path::new("/tmp/weights.bin"),
            9001,
            Duration::from_millis(200),
        )
        .await;
        assert!(err.is_err());
    }
}
