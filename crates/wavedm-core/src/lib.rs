//! wavedm core library
//!
//! Private track suggestions between music listeners, carried over Nostr
//! relays as NIP-17 direct messages.
//!
//! ## Overview
//!
//! A suggestion travels as three nested events. The innermost *rumor*
//! holds the message and is never signed. It is encrypted to the addressee
//! inside a *seal* signed by the sender, and the seal is encrypted again
//! inside a *gift wrap* signed by a one-time key. Relays see only the
//! addressee and a backdated timestamp.
//!
//! Every message produces two gift wraps: one for the recipient, one for the
//! sender's own inbox.
//!
//! ## Quick Start
//!
//! ```ignore
//! use wavedm_core::{DmConfig, Keys, MemoryRelay, Messenger, TrackSuggestion};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = MemoryRelay::default();
//!     let alice = Messenger::new(Keys::generate()?, relay.clone(), DmConfig::default())?;
//!     let bob = Messenger::new(Keys::generate()?, relay, DmConfig::default())?;
//!
//!     let suggestion = TrackSuggestion::new("abc123", "Song", "Artist", "Great track!");
//!     alice.send(&bob.signer().public_key(), &suggestion).await?;
//!
//!     for received in bob.inbox::<TrackSuggestion>().await? {
//!         println!("{} suggests {}", received.sender, received.payload.track_title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod event;
pub mod giftwrap;
pub mod identity;
pub mod messenger;
pub mod payload;
pub mod signer;
pub mod transport;

// Re-exports
pub use config::DmConfig;
pub use envelope::{
    Decoded, EnvelopeDecoder, EnvelopeEncoder, Received, Rejection, WrappedMessage,
};
pub use error::{DmError, DmResult};
pub use event::{Event, EventId, Kind, Tag, Timestamp, UnsignedEvent};
pub use identity::{EphemeralKeys, Keys, PublicKey};
pub use messenger::{messenger_for, Messenger, SendReport};
pub use payload::{DmPayload, TrackSuggestion};
pub use signer::{Capability, Nip44Signer, Signer};
pub use transport::{Filter, JsonlRelay, MemoryRelay, PublishConfirmation, Transport};
