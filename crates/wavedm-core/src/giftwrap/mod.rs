//! NIP-59 gift wrapping
//!
//! Three layers, innermost first:
//!
//! ```text
//! rumor (kind 14, unsigned)      the message, authored by the sender
//!   └─ seal (kind 13, signed)    rumor encrypted to the addressee, no tags
//!        └─ gift wrap (1059)     seal encrypted to the addressee under a
//!                                one-time key, tagged ["p", addressee]
//! ```
//!
//! [`unwrap`] peels both layers for one addressee and checks that the rumor
//! author is the key that signed the seal.

mod rumor;
mod seal;
mod wrap;

use crate::envelope::{Decoded, Rejection, Stop};
use crate::error::DmResult;
use crate::event::Event;
use crate::identity::PublicKey;
use crate::signer::Nip44Signer;

pub use rumor::Rumor;
pub use seal::{create_seal, parse_seal};
pub use wrap::{check_gift_wrap, create_gift_wrap};

/// A rumor recovered from a gift wrap, with the authenticated sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    /// Author of the seal, which the rumor author has been checked against.
    pub sender: PublicKey,
    pub rumor: Rumor,
}

/// Open `wrap` with the receiver's key.
///
/// Shape problems and NIP-44 failures are reported as rejections. Other
/// signer failures propagate as errors.
pub async fn unwrap<S: Nip44Signer>(receiver: &S, wrap: &Event) -> DmResult<Decoded<Unwrapped>> {
    Stop::finish(open(receiver, wrap).await)
}

async fn open<S: Nip44Signer>(receiver: &S, wrap: &Event) -> Result<Unwrapped, Stop> {
    check_gift_wrap(wrap)?;

    let seal_json = receiver
        .nip44_decrypt(&wrap.pubkey, &wrap.content)
        .await
        .map_err(|e| Stop::nip44(e, Rejection::WrapDecryption))?;
    let seal = parse_seal(&seal_json)?;

    let rumor_json = receiver
        .nip44_decrypt(&seal.pubkey, &seal.content)
        .await
        .map_err(|e| Stop::nip44(e, Rejection::SealDecryption))?;
    let rumor = Rumor::parse(&rumor_json)?;

    if rumor.pubkey != seal.pubkey {
        return Err(Rejection::AuthorMismatch {
            seal: seal.pubkey,
            rumor: rumor.pubkey,
        }
        .into());
    }

    Ok(Unwrapped {
        sender: seal.pubkey,
        rumor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Kind, Timestamp, UnsignedEvent};
    use crate::identity::Keys;

    fn rumor_from(author: &PublicKey) -> Rumor {
        Rumor::new(UnsignedEvent::new(
            *author,
            Timestamp::from_secs(1_700_000_000),
            Kind::PRIVATE_DIRECT_MESSAGE,
            vec![],
            "hi".to_string(),
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_wrap_and_unwrap() {
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();
        let rumor = rumor_from(&alice.public_key());

        let seal = create_seal(&alice, &rumor, &bob.public_key(), Timestamp::now())
            .await
            .unwrap();
        let wrap = create_gift_wrap(&seal, &bob.public_key(), Timestamp::now()).unwrap();

        let opened = unwrap(&bob, &wrap).await.unwrap().message().unwrap();
        assert_eq!(opened.sender, alice.public_key());
        assert_eq!(opened.rumor, rumor);
    }

    #[tokio::test]
    async fn test_wrong_receiver_is_rejected() {
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();
        let eve = Keys::generate().unwrap();

        let seal = create_seal(
            &alice,
            &rumor_from(&alice.public_key()),
            &bob.public_key(),
            Timestamp::now(),
        )
        .await
        .unwrap();
        let wrap = create_gift_wrap(&seal, &bob.public_key(), Timestamp::now()).unwrap();

        let decoded = unwrap(&eve, &wrap).await.unwrap();
        assert!(matches!(
            decoded.rejection(),
            Some(Rejection::WrapDecryption(_))
        ));
    }

    #[tokio::test]
    async fn test_impersonated_rumor_is_rejected() {
        // Mallory seals a rumor claiming Alice as author.
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();
        let mallory = Keys::generate().unwrap();

        let forged = rumor_from(&alice.public_key());
        let content = mallory
            .nip44_encrypt(&bob.public_key(), &forged.to_json().unwrap())
            .await
            .unwrap();
        let seal = UnsignedEvent::new(
            mallory.public_key(),
            Timestamp::now(),
            Kind::SEAL,
            vec![],
            content,
        )
        .sign_with(&mallory)
        .unwrap();
        let wrap = create_gift_wrap(&seal, &bob.public_key(), Timestamp::now()).unwrap();

        let decoded = unwrap(&bob, &wrap).await.unwrap();
        assert_eq!(
            decoded.rejection(),
            Some(&Rejection::AuthorMismatch {
                seal: mallory.public_key(),
                rumor: alice.public_key(),
            })
        );
    }

    #[tokio::test]
    async fn test_undecryptable_seal_is_rejected() {
        let alice = Keys::generate().unwrap();
        let bob = Keys::generate().unwrap();

        let seal = UnsignedEvent::new(
            alice.public_key(),
            Timestamp::now(),
            Kind::SEAL,
            vec![],
            "not a nip44 payload".to_string(),
        )
        .sign_with(&alice)
        .unwrap();
        let wrap = create_gift_wrap(&seal, &bob.public_key(), Timestamp::now()).unwrap();

        let decoded = unwrap(&bob, &wrap).await.unwrap();
        assert!(matches!(
            decoded.rejection(),
            Some(Rejection::SealDecryption(_))
        ));
    }
}
