//! Unsigned inner event (kind 14)

use serde::{Deserialize, Serialize};

use crate::envelope::Rejection;
use crate::error::DmResult;
use crate::event::{find_value, EventId, Kind, Tag, Timestamp, UnsignedEvent};
use crate::identity::PublicKey;

/// The message itself. Carries an id but never a signature, so a leaked
/// rumor cannot be proven to come from its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rumor {
    pub id: EventId,
    pub pubkey: PublicKey,
    pub created_at: Timestamp,
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
}

/// Inbound shape. `sig` is accepted here only so its presence can be
/// reported as a rejection instead of a parse failure.
#[derive(Deserialize)]
struct WireRumor {
    id: EventId,
    pubkey: PublicKey,
    created_at: Timestamp,
    kind: Kind,
    tags: Vec<Tag>,
    content: String,
    #[serde(default)]
    sig: Option<serde_json::Value>,
}

impl Rumor {
    /// Attach the content-addressed id.
    pub fn new(unsigned: UnsignedEvent) -> DmResult<Self> {
        let id = unsigned.compute_id()?;
        Ok(Self {
            id,
            pubkey: unsigned.pubkey,
            created_at: unsigned.created_at,
            kind: unsigned.kind,
            tags: unsigned.tags,
            content: unsigned.content,
        })
    }

    pub fn to_json(&self) -> DmResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse decrypted seal content, checking the rumor is unsigned and
    /// its id matches its fields.
    pub fn parse(json: &str) -> Result<Self, Rejection> {
        let wire: WireRumor = serde_json::from_str(json)
            .map_err(|e| Rejection::MalformedRumor(e.to_string()))?;

        if wire.sig.is_some() {
            return Err(Rejection::RumorSigned);
        }

        let unsigned = UnsignedEvent::new(
            wire.pubkey,
            wire.created_at,
            wire.kind,
            wire.tags,
            wire.content,
        );
        let rumor = Self::new(unsigned).map_err(|e| Rejection::MalformedRumor(e.to_string()))?;
        if rumor.id != wire.id {
            return Err(Rejection::RumorIdMismatch);
        }
        Ok(rumor)
    }

    pub fn tag_value(&self, name: &str) -> Option<&str> {
        find_value(&self.tags, name)
    }
}
