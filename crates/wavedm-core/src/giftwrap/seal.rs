//! Signed, encrypted middle layer (kind 13)

use crate::envelope::{Layer, Rejection};
use crate::error::{DmError, DmResult};
use crate::event::{Event, Kind, Timestamp, UnsignedEvent};
use crate::identity::PublicKey;
use crate::signer::Nip44Signer;

use super::Rumor;

/// Encrypt `rumor` to `addressee` and sign the result with the author's key.
///
/// The seal has no tags, so nothing but its author is visible to whoever
/// decrypts the outer wrap.
pub async fn create_seal<S: Nip44Signer>(
    author: &S,
    rumor: &Rumor,
    addressee: &PublicKey,
    created_at: Timestamp,
) -> DmResult<Event> {
    let pubkey = author.public_key().await?;
    if pubkey != rumor.pubkey {
        return Err(DmError::Signature(
            "Rumor author does not match the sealing identity".to_string(),
        ));
    }

    let content = author.nip44_encrypt(addressee, &rumor.to_json()?).await?;
    let unsigned = UnsignedEvent::new(pubkey, created_at, Kind::SEAL, Vec::new(), content);
    author.sign_event(unsigned).await
}

/// Parse and check a decrypted seal: kind 13, no tags, valid signature.
pub fn parse_seal(json: &str) -> Result<Event, Rejection> {
    let seal = Event::from_json(json).map_err(|e| Rejection::MalformedSeal(e.to_string()))?;

    if seal.kind != Kind::SEAL {
        return Err(Rejection::WrongKind {
            layer: Layer::Seal,
            expected: Kind::SEAL,
            got: seal.kind,
        });
    }
    if !seal.tags.is_empty() {
        return Err(Rejection::SealHasTags);
    }
    seal.verify()
        .map_err(|e| Rejection::SealSignature(e.to_string()))?;

    Ok(seal)
}
