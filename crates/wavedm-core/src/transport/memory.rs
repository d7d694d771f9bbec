use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{DmError, DmResult};
use crate::event::Event;

use super::{Filter, PublishConfirmation, Transport};

/// In-process relay. Clones share the same event store.
#[derive(Debug, Clone)]
pub struct MemoryRelay {
    name: String,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryRelay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Snapshot of everything stored, in arrival order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Store `event` without verification, as a hostile relay might.
    pub fn inject(&self, event: Event) {
        self.events.lock().push(event);
    }

    fn store(&self, event: &Event) -> DmResult<PublishConfirmation> {
        event
            .verify()
            .map_err(|e| DmError::Transport(format!("{} refused event: {}", self.name, e)))?;

        let mut events = self.events.lock();
        let duplicate = events.iter().any(|stored| stored.id == event.id);
        if !duplicate {
            events.push(event.clone());
        }
        trace!(relay = %self.name, event_id = %event.id, duplicate, "Stored event");

        Ok(PublishConfirmation {
            event_id: event.id,
            relay: self.name.clone(),
            duplicate,
        })
    }
}

impl Transport for MemoryRelay {
    async fn publish(&self, event: &Event) -> DmResult<PublishConfirmation> {
        self.store(event)
    }

    async fn query(&self, filter: &Filter) -> DmResult<Vec<Event>> {
        let events = self.events.lock();
        Ok(filter.select(events.iter()))
    }
}
