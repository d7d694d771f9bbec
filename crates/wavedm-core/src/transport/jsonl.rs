use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::error::{DmError, DmResult};
use crate::event::{Event, EventId};

use super::{Filter, PublishConfirmation, Transport};

/// Relay backed by a JSON-lines file.
///
/// Lets separate processes exchange messages through a shared file.
/// Unparseable lines are skipped on read.
#[derive(Debug)]
pub struct JsonlRelay {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlRelay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> DmResult<Vec<Event>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match Event::from_json(line) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = number + 1,
                    error = %e,
                    "Skipping unreadable relay line"
                ),
            }
        }
        Ok(events)
    }
}

impl Transport for JsonlRelay {
    async fn publish(&self, event: &Event) -> DmResult<PublishConfirmation> {
        event
            .verify()
            .map_err(|e| DmError::Transport(format!("Refused event: {}", e)))?;

        let _guard = self.write_lock.lock().await;

        let known: HashSet<EventId> = self.load().await?.into_iter().map(|e| e.id).collect();
        let duplicate = known.contains(&event.id);
        if !duplicate {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            let mut line = event.to_json()?;
            line.push('\n');

            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }
        trace!(path = %self.path.display(), event_id = %event.id, duplicate, "Appended event");

        Ok(PublishConfirmation {
            event_id: event.id,
            relay: self.path.display().to_string(),
            duplicate,
        })
    }

    async fn query(&self, filter: &Filter) -> DmResult<Vec<Event>> {
        let events = self.load().await?;
        Ok(filter.select(events.iter()))
    }
}
