//! Payload → gift wraps

use tracing::debug;

use crate::config::{DmConfig, DEFAULT_TIMESTAMP_JITTER_SECS};
use crate::error::{DmError, DmResult};
use crate::event::{Event, EventId, Kind, Tag, Timestamp, UnsignedEvent, TAG_SUBJECT, TAG_TYPE};
use crate::giftwrap::{create_gift_wrap, create_seal, Rumor};
use crate::identity::PublicKey;
use crate::payload::DmPayload;
use crate::signer::Nip44Signer;

/// Largest serialized rumor the encoder accepts.
///
/// The rumor is NIP-44 encrypted into the seal, and the seal JSON must
/// itself fit NIP-44's 65 535 byte plaintext limit for the gift wrap.
/// 32 KiB pads to 32 KiB, which base64-encodes to about 43 KiB of seal
/// content and leaves room for the seal's other fields.
pub const MAX_RUMOR_LEN: usize = 32 * 1024;

/// The two wraps of one direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedMessage {
    /// Id of the shared rumor; identical in both copies.
    pub rumor_id: EventId,
    /// Wrap addressed to the recipient.
    pub recipient_copy: Event,
    /// Wrap addressed to the sender, so their other devices see sent mail.
    pub sender_copy: Event,
}

impl WrappedMessage {
    pub fn envelopes(&self) -> [&Event; 2] {
        [&self.recipient_copy, &self.sender_copy]
    }
}

/// One wrap from a multi-recipient send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressedWrap {
    pub addressee: PublicKey,
    pub wrap: Event,
}

/// Builds rumor, seals and gift wraps for outgoing payloads.
#[derive(Debug, Clone)]
pub struct EnvelopeEncoder {
    jitter_secs: u64,
}

impl Default for EnvelopeEncoder {
    fn default() -> Self {
        Self {
            jitter_secs: DEFAULT_TIMESTAMP_JITTER_SECS,
        }
    }
}

impl EnvelopeEncoder {
    pub fn new(config: &DmConfig) -> Self {
        Self {
            jitter_secs: config.timestamp_jitter_secs,
        }
    }

    /// Build the unsigned rumor for `payload`, addressed to `recipients`.
    ///
    /// Tag order: one `p` per recipient, `subject`, `t`, then the
    /// payload's own tags.
    pub fn rumor<P: DmPayload>(
        &self,
        payload: &P,
        author: PublicKey,
        recipients: &[PublicKey],
        created_at: Timestamp,
    ) -> DmResult<Rumor> {
        payload.validate()?;

        let mut tags: Vec<Tag> = recipients.iter().map(Tag::public_key).collect();
        tags.push(Tag::pair(TAG_SUBJECT, payload.subject()));
        tags.push(Tag::pair(TAG_TYPE, P::TYPE));
        tags.extend(payload.tags());

        let rumor = Rumor::new(UnsignedEvent::new(
            author,
            created_at,
            Kind::PRIVATE_DIRECT_MESSAGE,
            tags,
            payload.content(),
        ))?;

        let len = rumor.to_json()?.len();
        if len > MAX_RUMOR_LEN {
            return Err(DmError::InvalidPayload(format!(
                "message too large: {len} bytes serialized, limit is {MAX_RUMOR_LEN}"
            )));
        }
        Ok(rumor)
    }

    /// Wrap `payload` once for `recipient` and once for the sender.
    ///
    /// Each copy gets its own seal (encrypted to its addressee) and its own
    /// ephemeral key. Wrap timestamps are jittered independently; with a
    /// jitter window of at least two seconds the two copies never share a
    /// timestamp, and neither matches the rumor's.
    pub async fn encode<S, P>(
        &self,
        payload: &P,
        sender: &S,
        recipient: &PublicKey,
    ) -> DmResult<WrappedMessage>
    where
        S: Nip44Signer,
        P: DmPayload,
    {
        let author = sender.public_key().await?;
        let rumor = self.rumor(payload, author, &[*recipient], Timestamp::now())?;

        let recipient_copy = self.wrap_for(sender, &rumor, recipient, &[]).await?;
        let sender_copy = self
            .wrap_for(sender, &rumor, &author, &[recipient_copy.created_at])
            .await?;

        debug!(rumor_id = %rumor.id, kind = P::TYPE, "Encoded direct message");

        Ok(WrappedMessage {
            rumor_id: rumor.id,
            recipient_copy,
            sender_copy,
        })
    }

    /// Wrap `payload` for several recipients plus the sender.
    ///
    /// Duplicate recipients are collapsed. The sender's copy comes last,
    /// unless the sender is itself listed as a recipient.
    pub async fn encode_to<S, P>(
        &self,
        payload: &P,
        sender: &S,
        recipients: &[PublicKey],
    ) -> DmResult<(EventId, Vec<AddressedWrap>)>
    where
        S: Nip44Signer,
        P: DmPayload,
    {
        let mut unique: Vec<PublicKey> = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            if !unique.contains(recipient) {
                unique.push(*recipient);
            }
        }
        if unique.is_empty() {
            return Err(DmError::InvalidPayload(
                "at least one recipient is required".to_string(),
            ));
        }

        let author = sender.public_key().await?;
        let rumor = self.rumor(payload, author, &unique, Timestamp::now())?;

        let mut addressees = unique;
        if !addressees.contains(&author) {
            addressees.push(author);
        }

        let mut wraps = Vec::with_capacity(addressees.len());
        let mut taken = Vec::with_capacity(addressees.len());
        for addressee in addressees {
            let wrap = self.wrap_for(sender, &rumor, &addressee, &taken).await?;
            taken.push(wrap.created_at);
            wraps.push(AddressedWrap { addressee, wrap });
        }

        debug!(
            rumor_id = %rumor.id,
            wraps = wraps.len(),
            kind = P::TYPE,
            "Encoded group direct message"
        );
        Ok((rumor.id, wraps))
    }

    async fn wrap_for<S: Nip44Signer>(
        &self,
        sender: &S,
        rumor: &Rumor,
        addressee: &PublicKey,
        taken: &[Timestamp],
    ) -> DmResult<Event> {
        let seal_at = self.backdate(rumor.created_at, &[]);
        let seal = create_seal(sender, rumor, addressee, seal_at).await?;
        create_gift_wrap(&seal, addressee, self.backdate(rumor.created_at, taken))
    }

    /// A jittered timestamp strictly before `sent_at` and not in `taken`.
    ///
    /// Redraws until both hold. Each is dropped once the window (clamped
    /// at the epoch) has no value left to satisfy it; a zero window
    /// returns `sent_at` itself.
    fn backdate(&self, sent_at: Timestamp, taken: &[Timestamp]) -> Timestamp {
        let room = self.jitter_secs.min(sent_at.as_secs());
        let distinct = (taken.len() as u64) < room;
        loop {
            let at = sent_at.jittered_back(self.jitter_secs);
            if room == 0 || (at != sent_at && (!distinct || !taken.contains(&at))) {
                return at;
            }
        }
    }
}
