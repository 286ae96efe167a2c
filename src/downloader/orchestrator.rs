// Helper-binary invocation: pre-flight validation, argument
// construction, progress streaming and exit-code mapping.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;

use super::errors::DownloadError;
use super::events::ProgressEmitter;
use super::models::{ClipWindow, DownloadRequest, NetworkConfig};
use super::progress::parse_progress_line;
use super::provisioner::ToolProvisioner;

pub const MIN_CLIP_SECONDS: f64 = 1.0;
pub const MAX_CLIP_SECONDS: f64 = 600.0;

/// External cancel hook for an in-flight download.
///
/// Cancelling kills the child process; the download resolves to a
/// process error. Share between tasks with an `Arc`.
pub struct CancelToken {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_cancelled(rx: &mut Option<watch::Receiver<bool>>) {
    match rx {
        Some(rx) => {
            if *rx.borrow() {
                return;
            }
            while rx.changed().await.is_ok() {
                if *rx.borrow() {
                    return;
                }
            }
            // Token dropped without firing: cancellation can no longer happen
            std::future::pending::<()>().await
        }
        None => std::future::pending::<()>().await,
    }
}

/// Drives one yt-dlp download at a time. Progress-event routing is not
/// multiplexed, so concurrent downloads need one orchestrator each.
pub struct DownloadOrchestrator {
    provisioner: Arc<ToolProvisioner>,
    network: NetworkConfig,
}

impl DownloadOrchestrator {
    pub fn new(provisioner: Arc<ToolProvisioner>) -> Self {
        Self {
            provisioner,
            network: NetworkConfig::default(),
        }
    }

    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Window validation, run before any subprocess is spawned. The
    /// full-video sentinel is always accepted.
    pub fn validate_window(window: &ClipWindow) -> Result<(), DownloadError> {
        if window.is_full_video() {
            return Ok(());
        }
        if window.start_seconds >= window.end_seconds {
            return Err(DownloadError::InvalidWindow(format!(
                "Invalid clip timing: start time ({}s) must be before end time ({}s)",
                window.start_seconds, window.end_seconds
            )));
        }
        let duration = window.duration();
        if duration > MAX_CLIP_SECONDS {
            return Err(DownloadError::DurationTooLong(duration));
        }
        if duration < MIN_CLIP_SECONDS {
            return Err(DownloadError::DurationTooShort(duration));
        }
        Ok(())
    }

    pub(crate) fn build_args(
        window: &ClipWindow,
        output_path: &Path,
        network: &NetworkConfig,
    ) -> Vec<String> {
        let mut args = vec![
            format!("https://www.youtube.com/watch?v={}", window.video_id),
            "-o".to_string(),
            output_path.to_string_lossy().into_owned(),
            "--format".to_string(),
            "best[ext=mp4]".to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
        ];

        if !window.is_full_video() {
            args.push("--download-sections".to_string());
            args.push(format!(
                "*{}-{}",
                window.start_seconds, window.end_seconds
            ));
        }

        if let Some(proxy) = &network.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        if let Some(timeout) = network.timeout {
            args.push("--socket-timeout".to_string());
            args.push(timeout.to_string());
        }

        args
    }

    /// Run the download to completion, forwarding each progress report
    /// as it arrives. No retries: a failure is reported once and the
    /// caller decides whether to repeat the call.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        emitter: &ProgressEmitter,
        cancel: Option<&CancelToken>,
    ) -> Result<(), DownloadError> {
        Self::validate_window(&request.window)?;

        let installation = self.provisioner.resolve_binary().await?;
        let args = Self::build_args(&request.window, &request.output_path, &self.network);
        log::debug!(
            "spawning {} {}",
            installation.binary_path.display(),
            args.join(" ")
        );

        let mut child = Command::new(&installation.binary_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DownloadError::Process(format!("failed to start yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Process("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Process("failed to capture stderr".to_string()))?;

        // Keep the last non-empty stderr line for failure reporting
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: Option<String> = None;
            while let Ok(Some(line)) = lines.next_line().await {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    tail = Some(trimmed.to_string());
                }
            }
            tail
        });

        let mut cancel_rx = cancel.map(CancelToken::subscribe);
        let mut stdout_lines = BufReader::new(stdout).lines();

        loop {
            tokio::select! {
                line = stdout_lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_progress_line(&line) {
                            emitter.emit_progress(event);
                        }
                        if line.contains("[download]") || line.contains("[Merger]") {
                            log::debug!("yt-dlp: {}", line);
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        log::warn!("failed to read yt-dlp stdout: {}", error);
                        break;
                    }
                },
                _ = wait_cancelled(&mut cancel_rx) => {
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(DownloadError::Process("cancelled by caller".to_string()));
                }
            }
        }

        let status = tokio::select! {
            status = child.wait() => status
                .map_err(|e| DownloadError::Process(format!("failed to wait for yt-dlp: {}", e)))?,
            _ = wait_cancelled(&mut cancel_rx) => {
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(DownloadError::Process("cancelled by caller".to_string()));
            }
        };

        let stderr_tail = stderr_task.await.ok().flatten().unwrap_or_default();
        if status.success() {
            return Ok(());
        }

        let exit_code = status.code().unwrap_or(-1);
        log::warn!(
            "yt-dlp exited with code {}: {}",
            exit_code,
            if stderr_tail.is_empty() { "<no stderr>" } else { stderr_tail.as_str() }
        );
        Err(DownloadError::DownloadFailed {
            exit_code,
            detail: stderr_tail,
        })
    }
}
