// Progress/status channel between the core and its caller

use tokio::sync::mpsc;

use super::models::{DownloaderEvent, DownloadStage, ProgressEvent, StatusUpdate};

/// Progress emitter helper.
///
/// Events are forwarded in arrival order, one send per event, never
/// buffered or coalesced. A closed receiver is tolerated so a download
/// can finish even after the caller stopped listening.
#[derive(Clone)]
pub struct ProgressEmitter {
    tx: mpsc::UnboundedSender<DownloaderEvent>,
}

impl ProgressEmitter {
    pub fn new(tx: mpsc::UnboundedSender<DownloaderEvent>) -> Self {
        Self { tx }
    }

    /// Create an emitter together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DownloaderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit_progress(&self, progress: ProgressEvent) {
        let _ = self.tx.send(DownloaderEvent::Progress(progress));
    }

    pub fn emit_status(&self, stage: DownloadStage, message: impl Into<String>) {
        let _ = self
            .tx
            .send(DownloaderEvent::Status(StatusUpdate::new(stage, message)));
    }
}
