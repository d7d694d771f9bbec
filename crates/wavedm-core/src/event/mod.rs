//! Nostr event model (NIP-01)
//!
//! Every object this crate produces or consumes, whether rumor, seal or
//! gift wrap, has the same JSON shape:
//!
//! ```text
//! { id, pubkey, created_at, kind, tags: [[string, ...], ...], content, sig? }
//! ```
//!
//! The `id` is the SHA-256 of the canonical serialization
//! `[0, pubkey, created_at, kind, tags, content]`, so identical fields
//! always give the same id. `sig` is a BIP-340 Schnorr signature over the id.

mod kind;
mod tag;
mod timestamp;

use std::fmt;

use secp256k1::schnorr::Signature;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::sha256;
use crate::error::{DmError, DmResult};
use crate::identity::{Keys, PublicKey};

pub use kind::Kind;
pub use tag::{find_value, has_pair, public_keys, Tag, TAG_PUBKEY, TAG_SUBJECT, TAG_TYPE};
pub use timestamp::Timestamp;

/// Content-addressed event identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId([u8; 32]);

impl EventId {
    pub fn from_hex(hex_str: &str) -> DmResult<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| DmError::Serialization(format!("Invalid event id: {}", e)))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.to_hex())
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Event fields before an id or signature is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    pub pubkey: PublicKey,
    pub created_at: Timestamp,
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl UnsignedEvent {
    pub fn new(
        pubkey: PublicKey,
        created_at: Timestamp,
        kind: Kind,
        tags: Vec<Tag>,
        content: String,
    ) -> Self {
        Self {
            pubkey,
            created_at,
            kind,
            tags,
            content,
        }
    }

    /// Compact JSON array hashed to form the id.
    pub fn canonical_json(&self) -> DmResult<String> {
        canonical_json(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    pub fn compute_id(&self) -> DmResult<EventId> {
        Ok(EventId(sha256(self.canonical_json()?.as_bytes())))
    }

    /// Attach id and Schnorr signature. `keys` must own `pubkey`.
    pub fn sign_with(self, keys: &Keys) -> DmResult<Event> {
        if keys.public_key() != self.pubkey {
            return Err(DmError::Signature(
                "Event pubkey does not match the signing key".to_string(),
            ));
        }

        let id = self.compute_id()?;
        let sig = keys.sign_digest(id.as_bytes());

        Ok(Event {
            id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(sig.serialize()),
        })
    }
}

fn canonical_json(
    pubkey: &PublicKey,
    created_at: Timestamp,
    kind: Kind,
    tags: &[Tag],
    content: &str,
) -> DmResult<String> {
    Ok(serde_json::to_string(&(
        0u8, pubkey, created_at, kind, tags, content,
    ))?)
}

/// A signed event, as it crosses a relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub pubkey: PublicKey,
    pub created_at: Timestamp,
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

impl Event {
    /// Check that `id` matches the fields and `sig` is valid for `pubkey`.
    pub fn verify(&self) -> DmResult<()> {
        let expected = EventId(sha256(
            canonical_json(
                &self.pubkey,
                self.created_at,
                self.kind,
                &self.tags,
                &self.content,
            )?
            .as_bytes(),
        ));
        if expected != self.id {
            return Err(DmError::Signature(format!(
                "Event id mismatch: expected {}, got {}",
                expected, self.id
            )));
        }

        let sig_bytes = hex::decode(&self.sig)
            .map_err(|e| DmError::Signature(format!("Invalid signature hex: {}", e)))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|e| DmError::Signature(format!("Invalid signature: {}", e)))?;

        self.pubkey.verify(self.id.as_bytes(), &signature)
    }

    pub fn to_json(&self) -> DmResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> DmResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First value of the first tag called `name`.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        find_value(&self.tags, name)
    }

    /// Public keys referenced by `p` tags.
    pub fn addressees(&self) -> Vec<PublicKey> {
        public_keys(&self.tags)
    }
}
