//! Relay access
//!
//! The core never opens sockets. A [`Transport`] publishes signed events
//! and answers filter queries; the application chooses which one to inject.
//!
//! - [`MemoryRelay`]: in-process store, shared by cloning
//! - [`JsonlRelay`]: append-only JSON-lines file, one event per line

mod jsonl;
mod memory;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::DmResult;
use crate::event::{Event, EventId, Kind, Timestamp};
use crate::identity::PublicKey;

pub use jsonl::JsonlRelay;
pub use memory::MemoryRelay;

/// Subset of a NIP-01 filter: all given conditions must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<Kind>,
    #[serde(rename = "#p", default, skip_serializing_if = "Vec::is_empty")]
    pub p_tags: Vec<PublicKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn p_tag(mut self, pubkey: PublicKey) -> Self {
        self.p_tags.push(pubkey);
        self
    }

    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Does `event` satisfy every condition except `limit`?
    pub fn matches(&self, event: &Event) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        if !self.p_tags.is_empty()
            && !event
                .addressees()
                .iter()
                .any(|pk| self.p_tags.contains(pk))
        {
            return false;
        }
        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }
        true
    }

    /// Keep matching events, newest first, truncated to `limit`.
    pub(crate) fn select<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Vec<Event> {
        let mut selected: Vec<Event> = events
            .into_iter()
            .filter(|event| self.matches(event))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Acknowledgement from a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfirmation {
    pub event_id: EventId,
    /// Which relay accepted it.
    pub relay: String,
    /// The relay already had this event.
    pub duplicate: bool,
}

/// Somewhere events can be published to and queried from.
pub trait Transport: Send + Sync {
    fn publish(&self, event: &Event) -> impl Future<Output = DmResult<PublishConfirmation>> + Send;

    fn query(&self, filter: &Filter) -> impl Future<Output = DmResult<Vec<Event>>> + Send;
}
