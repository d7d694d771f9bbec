//! Gift wrap → payload

use tracing::debug;

use crate::error::DmResult;
use crate::event::{has_pair, Event, EventId, Kind, Timestamp, TAG_SUBJECT, TAG_TYPE};
use crate::giftwrap::{self, Unwrapped};
use crate::identity::PublicKey;
use crate::payload::DmPayload;
use crate::signer::Nip44Signer;

use super::{Decoded, Layer, Rejection};

/// A payload recovered from a gift wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received<P> {
    pub payload: P,
    /// Shared by the recipient's and the sender's copy.
    pub rumor_id: EventId,
    /// Authenticated author (the seal signer).
    pub sender: PublicKey,
    /// When the sender wrote it; not jittered.
    pub created_at: Timestamp,
    pub subject: Option<String>,
}

/// Opens gift wraps addressed to the local identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeDecoder;

impl EnvelopeDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Open `envelope` and extract a `P`.
    ///
    /// Anything that is not a well-formed `P` for `recipient` comes back as
    /// [`Decoded::Rejected`]. `Err` is reserved for signer failures other
    /// than decryption.
    pub async fn decode<S, P>(
        &self,
        envelope: &Event,
        recipient: &S,
    ) -> DmResult<Decoded<Received<P>>>
    where
        S: Nip44Signer,
        P: DmPayload,
    {
        let decoded = match giftwrap::unwrap(recipient, envelope).await? {
            Decoded::Message(unwrapped) => extract::<P>(unwrapped),
            Decoded::Rejected(rejection) => Decoded::Rejected(rejection),
        };

        if let Decoded::Rejected(rejection) = &decoded {
            debug!(event_id = %envelope.id, %rejection, "Rejected gift wrap");
        }
        Ok(decoded)
    }

    /// Like [`decode`](Self::decode), for raw relay JSON.
    pub async fn decode_json<S, P>(
        &self,
        json: &str,
        recipient: &S,
    ) -> DmResult<Decoded<Received<P>>>
    where
        S: Nip44Signer,
        P: DmPayload,
    {
        match Event::from_json(json) {
            Ok(envelope) => self.decode(&envelope, recipient).await,
            Err(e) => {
                let rejection = Rejection::MalformedEnvelope(e.to_string());
                debug!(%rejection, "Rejected envelope JSON");
                Ok(Decoded::Rejected(rejection))
            }
        }
    }
}

fn extract<P: DmPayload>(unwrapped: Unwrapped) -> Decoded<Received<P>> {
    let Unwrapped { sender, rumor } = unwrapped;

    if rumor.kind != Kind::PRIVATE_DIRECT_MESSAGE {
        return Decoded::Rejected(Rejection::WrongKind {
            layer: Layer::Rumor,
            expected: Kind::PRIVATE_DIRECT_MESSAGE,
            got: rumor.kind,
        });
    }
    if !has_pair(&rumor.tags, TAG_TYPE, P::TYPE) {
        return Decoded::Rejected(Rejection::MissingTypeTag);
    }

    match P::from_rumor(&rumor) {
        Ok(payload) => Decoded::Message(Received {
            payload,
            rumor_id: rumor.id,
            sender,
            created_at: rumor.created_at,
            subject: rumor.tag_value(TAG_SUBJECT).map(str::to_string),
        }),
        Err(rejection) => Decoded::Rejected(rejection),
    }
}
