//! Outer layer (kind 1059), signed by a throwaway key

use crate::envelope::{Layer, Rejection};
use crate::error::DmResult;
use crate::event::{Event, Kind, Tag, Timestamp, UnsignedEvent};
use crate::identity::{EphemeralKeys, PublicKey};

/// Encrypt `seal` to `addressee` under a fresh ephemeral key.
///
/// The only thing a relay learns is the addressee (from the `p` tag) and a
/// jittered timestamp. The ephemeral key is consumed by signing.
pub fn create_gift_wrap(
    seal: &Event,
    addressee: &PublicKey,
    created_at: Timestamp,
) -> DmResult<Event> {
    let ephemeral = EphemeralKeys::generate()?;
    let content = ephemeral.encrypt_to(addressee, &seal.to_json()?)?;
    let unsigned = UnsignedEvent::new(
        ephemeral.public_key(),
        created_at,
        Kind::GIFT_WRAP,
        vec![Tag::public_key(addressee)],
        content,
    );
    ephemeral.sign(unsigned)
}

/// Checks that need no decryption: kind, addressee and signature.
pub fn check_gift_wrap(wrap: &Event) -> Result<(), Rejection> {
    if wrap.kind != Kind::GIFT_WRAP {
        return Err(Rejection::WrongKind {
            layer: Layer::GiftWrap,
            expected: Kind::GIFT_WRAP,
            got: wrap.kind,
        });
    }
    if wrap.addressees().is_empty() {
        return Err(Rejection::MissingAddressee);
    }
    wrap.verify()
        .map_err(|e| Rejection::WrapSignature(e.to_string()))
}
