//! High-level send and receive
//!
//! [`Messenger`] ties one identity to one transport:
//!
//! ```ignore
//! let messenger = Messenger::new(keys, MemoryRelay::default(), DmConfig::default())?;
//! let report = messenger.send(&bob, &suggestion).await?;
//! let inbox: Vec<Received<TrackSuggestion>> = messenger.inbox().await?;
//! ```

use std::collections::HashSet;
use std::fmt;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::DmConfig;
use crate::envelope::{Decoded, EnvelopeDecoder, EnvelopeEncoder, Received};
use crate::error::DmResult;
use crate::event::{Event, EventId, Kind, Timestamp};
use crate::identity::{Keys, PublicKey};
use crate::payload::DmPayload;
use crate::signer::{Capability, Nip44Signer};
use crate::transport::{Filter, PublishConfirmation, Transport};

/// Outcome of one [`Messenger::send`].
///
/// The two copies are published independently: the recipient may have the
/// message even if the sender's own copy failed, and vice versa.
#[derive(Debug)]
pub struct SendReport {
    pub rumor_id: EventId,
    pub recipient: DmResult<PublishConfirmation>,
    pub sender_copy: DmResult<PublishConfirmation>,
}

impl SendReport {
    /// The recipient's copy reached the relay.
    pub fn delivered(&self) -> bool {
        self.recipient.is_ok()
    }

    pub fn fully_published(&self) -> bool {
        self.recipient.is_ok() && self.sender_copy.is_ok()
    }
}

/// Private messaging for one identity over one transport.
pub struct Messenger<S, T> {
    signer: S,
    transport: T,
    config: DmConfig,
    encoder: EnvelopeEncoder,
    decoder: EnvelopeDecoder,
}

impl<S, T> Messenger<S, T>
where
    S: Nip44Signer,
    T: Transport,
{
    pub fn new(signer: S, transport: T, config: DmConfig) -> DmResult<Self> {
        config.validate()?;
        Ok(Self {
            encoder: EnvelopeEncoder::new(&config),
            decoder: EnvelopeDecoder::new(),
            signer,
            transport,
            config,
        })
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &DmConfig {
        &self.config
    }

    /// Encode `payload` for `recipient` and publish both copies.
    ///
    /// Returns `Err` only if encoding fails. Publish failures are reported
    /// per copy in the [`SendReport`].
    pub async fn send<P: DmPayload>(
        &self,
        recipient: &PublicKey,
        payload: &P,
    ) -> DmResult<SendReport> {
        let wrapped = self.encoder.encode(payload, &self.signer, recipient).await?;

        let (to_recipient, to_self) = tokio::join!(
            self.transport.publish(&wrapped.recipient_copy),
            self.transport.publish(&wrapped.sender_copy),
        );

        if let Err(e) = &to_recipient {
            warn!(rumor_id = %wrapped.rumor_id, error = %e, "Failed to publish recipient copy");
        }
        if let Err(e) = &to_self {
            warn!(rumor_id = %wrapped.rumor_id, error = %e, "Failed to publish sender copy");
        }
        info!(
            rumor_id = %wrapped.rumor_id,
            recipient = %recipient,
            kind = P::TYPE,
            "Sent private message"
        );

        Ok(SendReport {
            rumor_id: wrapped.rumor_id,
            recipient: to_recipient,
            sender_copy: to_self,
        })
    }

    /// Fetch and open every `P` addressed to this identity.
    ///
    /// Includes the sender copies of messages this identity sent. Results
    /// are de-duplicated by rumor id and ordered oldest first.
    pub async fn inbox<P: DmPayload>(&self) -> DmResult<Vec<Received<P>>> {
        let me = self.signer.public_key().await?;

        let mut filter = Filter::new()
            .kind(Kind::GIFT_WRAP)
            .p_tag(me)
            .limit(self.config.inbox_limit);
        if let Some(lookback) = self.config.inbox_lookback_secs {
            // Wrap timestamps run up to the jitter window behind real time.
            let window = lookback.saturating_add(self.config.timestamp_jitter_secs);
            filter = filter.since(Timestamp::from_secs(
                Timestamp::now().as_secs().saturating_sub(window),
            ));
        }

        let envelopes = self.transport.query(&filter).await?;
        debug!(count = envelopes.len(), "Fetched gift wraps");
        self.open(&envelopes).await
    }

    /// Decode a batch of envelopes concurrently, keeping only messages.
    pub async fn open<P: DmPayload>(&self, envelopes: &[Event]) -> DmResult<Vec<Received<P>>> {
        let results = join_all(
            envelopes
                .iter()
                .map(|envelope| self.decoder.decode::<S, P>(envelope, &self.signer)),
        )
        .await;

        let mut seen = HashSet::new();
        let mut messages = Vec::new();
        for result in results {
            match result? {
                Decoded::Message(received) => {
                    if seen.insert(received.rumor_id) {
                        messages.push(received);
                    }
                }
                Decoded::Rejected(_) => {}
            }
        }

        messages.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.rumor_id.cmp(&b.rumor_id))
        });
        Ok(messages)
    }
}

impl<S, T> fmt::Debug for Messenger<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Build a messenger whose signer may turn out to be read-only.
pub fn messenger_for<T: Transport>(
    capability: Capability,
    transport: T,
    config: DmConfig,
) -> DmResult<Messenger<Keys, T>> {
    let keys = capability.into_messaging()?;
    Messenger::new(keys, transport, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DmError;
    use crate::payload::TrackSuggestion;
    use crate::transport::MemoryRelay;

    fn suggestion(id: &str) -> TrackSuggestion {
        TrackSuggestion::new(id, "Song", "Artist", "Great track!")
    }

    #[tokio::test]
    async fn test_send_then_inbox_both_sides() {
        let relay = MemoryRelay::default();
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();
        let bob_pk = bob.public_key();

        let alice_m = Messenger::new(alice.clone(), relay.clone(), DmConfig::default()).unwrap();
        let bob_m = Messenger::new(bob, relay.clone(), DmConfig::default()).unwrap();

        let report = alice_m.send(&bob_pk, &suggestion("abc123")).await.unwrap();
        assert!(report.fully_published());
        assert_eq!(relay.len(), 2);

        let bob_inbox = bob_m.inbox::<TrackSuggestion>().await.unwrap();
        assert_eq!(bob_inbox.len(), 1);
        assert_eq!(bob_inbox[0].sender, alice.public_key());
        assert_eq!(bob_inbox[0].rumor_id, report.rumor_id);

        let alice_sent = alice_m.inbox::<TrackSuggestion>().await.unwrap();
        assert_eq!(alice_sent.len(), 1);
        assert_eq!(alice_sent[0].payload, suggestion("abc123"));
    }

    #[tokio::test]
    async fn test_inbox_dedupes_and_orders() {
        let relay = MemoryRelay::default();
        let alice = Keys::generate().unwrap();
        let messenger = Messenger::new(alice.clone(), relay.clone(), DmConfig::default()).unwrap();

        // Two wraps of the same rumor addressed to alice (sent to self).
        let me = alice.public_key();
        messenger.send(&me, &suggestion("first")).await.unwrap();

        let inbox = messenger.inbox::<TrackSuggestion>().await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(relay.len(), 2);
    }

    #[tokio::test]
    async fn test_inbox_skips_foreign_and_broken_wraps() {
        let relay = MemoryRelay::default();
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();
        let bob_pk = bob.public_key();

        let alice_m = Messenger::new(alice, relay.clone(), DmConfig::default()).unwrap();
        let bob_m = Messenger::new(bob, relay.clone(), DmConfig::default()).unwrap();
        let report = alice_m.send(&bob_pk, &suggestion("abc123")).await.unwrap();

        let mut broken = relay
            .events()
            .into_iter()
            .find(|e| e.addressees() == vec![bob_pk])
            .unwrap();
        broken.content = "garbage".to_string();
        relay.inject(broken);

        let inbox = bob_m.inbox::<TrackSuggestion>().await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].rumor_id, report.rumor_id);
    }

    #[tokio::test]
    async fn test_inbox_respects_limit() {
        let relay = MemoryRelay::default();
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();
        let bob_pk = bob.public_key();

        let alice_m = Messenger::new(alice, relay.clone(), DmConfig::default()).unwrap();
        for i in 0..3 {
            alice_m
                .send(&bob_pk, &suggestion(&format!("t{}", i)))
                .await
                .unwrap();
        }

        let bob_m = Messenger::new(bob, relay, DmConfig::new().with_inbox_limit(2)).unwrap();
        assert_eq!(bob_m.inbox::<TrackSuggestion>().await.unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_config_refused() {
        let result = Messenger::new(
            Keys::generate().unwrap(),
            MemoryRelay::default(),
            DmConfig::new().with_inbox_limit(0),
        );
        assert!(matches!(result, Err(DmError::Config(_))));
    }

    #[test]
    fn test_read_only_identity_cannot_message() {
        let pubkey = Keys::generate().unwrap().public_key();
        let result = messenger_for(
            Capability::ReadOnly(pubkey),
            MemoryRelay::default(),
            DmConfig::default(),
        );
        assert!(matches!(result, Err(DmError::MissingEncryptionCapability)));
    }
}
