//! JSONL event log.
//!
//! Events are handed to a background task over an unbounded channel so the
//! driver never waits on the disk. One `GameEvent` per line.

use std::path::Path;

use anyhow::Result;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use conveyor_sorter_core::GameEvent;

pub struct EventLog {
    tx: mpsc::UnboundedSender<GameEvent>,
    task: JoinHandle<()>,
}

impl EventLog {
    /// Open `path` for appending and start the writer task.
    pub async fn open(path: &Path) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        let (tx, mut rx) = mpsc::unbounded_channel::<GameEvent>();

        let task = tokio::spawn(async move {
            let mut buf: Vec<u8> = Vec::with_capacity(4096);
            while let Some(event) = rx.recv().await {
                buf.clear();
                if let Err(e) = serde_json::to_writer(&mut buf, &event) {
                    warn!(error = %e, "event not serializable");
                    continue;
                }
                buf.push(b'\n');
                if let Err(e) = file.write_all(&buf).await {
                    warn!(error = %e, "event log write failed; closing");
                    break;
                }
            }
            let _ = file.flush().await;
        });

        Ok(Self { tx, task })
    }

    pub fn record(&self, event: &GameEvent) {
        let _ = self.tx.send(event.clone());
    }

    /// Flush everything recorded so far and stop the writer.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}
