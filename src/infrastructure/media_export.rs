//! Attachment export worker
//!
//! Received files are copied to the public media store on a separate task
//! so a slow store never delays call handling.

use crate::domain::message::{Attachment, MediaKind};
use crate::domain::shared::error::{EngineError, EngineResult};
use crate::infrastructure::metrics;
use crate::infrastructure::ports::MediaStore;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Producer side of the export queue
#[derive(Clone)]
pub struct MediaExportQueue {
    tx: UnboundedSender<Attachment>,
}

impl MediaExportQueue {
    pub fn enqueue(&self, attachment: Attachment) -> EngineResult<()> {
        self.tx
            .send(attachment)
            .map_err(|e| EngineError::Unavailable(format!("export worker stopped, dropping {}", e.0.name)))
    }
}

pub struct MediaExportWorker {
    store: Arc<dyn MediaStore>,
    rx: UnboundedReceiver<Attachment>,
}

impl MediaExportWorker {
    pub fn new(store: Arc<dyn MediaStore>) -> (MediaExportQueue, MediaExportWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MediaExportQueue { tx }, MediaExportWorker { store, rx })
    }

    /// Start the worker; it stops once every queue handle is dropped
    pub fn spawn(store: Arc<dyn MediaStore>) -> (MediaExportQueue, JoinHandle<()>) {
        let (queue, worker) = Self::new(store);
        (queue, tokio::spawn(worker.run()))
    }

    pub async fn run(mut self) {
        while let Some(attachment) = self.rx.recv().await {
            self.export(attachment).await;
        }
        info!("Media export worker stopped");
    }

    async fn export(&self, attachment: Attachment) {
        let kind = attachment.media_kind();
        if kind == MediaKind::Other {
            warn!(
                "File [{}] isn't an image, a video or an audio file, not exporting it",
                attachment.name
            );
            metrics::record_export(kind, false);
            return;
        }

        match self.store.export(&attachment, kind).await {
            Ok(path) => {
                info!(
                    "File [{}] has been successfully exported to MediaStore: {}",
                    attachment.name,
                    path.display()
                );
                metrics::record_export(kind, true);
            }
            Err(e) => {
                error!("Failed to export file [{}] to MediaStore: {}", attachment.name, e);
                metrics::record_export(kind, false);
            }
        }
    }
}
