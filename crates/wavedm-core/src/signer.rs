//! Signing and encryption capabilities
//!
//! The encoder and decoder never touch a secret key directly. They talk to
//! a capability:
//!
//! - [`Signer`]: exposes the public identity and signs events.
//! - [`Nip44Signer`]: additionally encrypts and decrypts NIP-44 payloads.
//!
//! Private messaging requires `Nip44Signer` as a trait bound, so a signer
//! without encryption support cannot be passed to the encoder at all. When
//! the kind of identity is only known at runtime (a user who signed in with
//! just a public key, say), [`Capability::messaging`] turns that into a
//! [`DmError::MissingEncryptionCapability`] error up front instead of
//! falling back to a weaker mode.

use std::future::Future;

use crate::crypto::nip44;
use crate::error::{DmError, DmResult};
use crate::event::{Event, UnsignedEvent};
use crate::identity::{Keys, PublicKey};

/// A capability that can sign events for one identity.
pub trait Signer: Send + Sync {
    /// The identity this signer signs for.
    fn public_key(&self) -> impl Future<Output = DmResult<PublicKey>> + Send;

    /// Attach id and signature. The event's pubkey must be this signer's.
    fn sign_event(&self, unsigned: UnsignedEvent) -> impl Future<Output = DmResult<Event>> + Send;
}

/// A signer that can also perform NIP-44 encryption with its secret key.
pub trait Nip44Signer: Signer {
    /// Encrypt `plaintext` for `peer`.
    fn nip44_encrypt(
        &self,
        peer: &PublicKey,
        plaintext: &str,
    ) -> impl Future<Output = DmResult<String>> + Send;

    /// Decrypt a payload exchanged with `peer`.
    ///
    /// Wrong keys and corrupted payloads surface as [`DmError::Nip44`].
    fn nip44_decrypt(
        &self,
        peer: &PublicKey,
        payload: &str,
    ) -> impl Future<Output = DmResult<String>> + Send;
}

impl Signer for Keys {
    async fn public_key(&self) -> DmResult<PublicKey> {
        Ok(Keys::public_key(self))
    }

    async fn sign_event(&self, unsigned: UnsignedEvent) -> DmResult<Event> {
        unsigned.sign_with(self)
    }
}

impl Nip44Signer for Keys {
    async fn nip44_encrypt(&self, peer: &PublicKey, plaintext: &str) -> DmResult<String> {
        Ok(nip44::encrypt(&self.conversation_key(peer), plaintext)?)
    }

    async fn nip44_decrypt(&self, peer: &PublicKey, payload: &str) -> DmResult<String> {
        Ok(nip44::decrypt(&self.conversation_key(peer), payload)?)
    }
}

/// What the local user signed in with.
#[derive(Debug, Clone)]
pub enum Capability {
    /// Full local keys: can sign, encrypt and decrypt.
    Keys(Keys),
    /// Public key only: can browse, cannot send or read private messages.
    ReadOnly(PublicKey),
}

impl Capability {
    pub fn public_key(&self) -> PublicKey {
        match self {
            Capability::Keys(keys) => keys.public_key(),
            Capability::ReadOnly(pubkey) => *pubkey,
        }
    }

    /// The NIP-44 capable signer, or `MissingEncryptionCapability`.
    pub fn messaging(&self) -> DmResult<&Keys> {
        match self {
            Capability::Keys(keys) => Ok(keys),
            Capability::ReadOnly(_) => Err(DmError::MissingEncryptionCapability),
        }
    }

    pub fn into_messaging(self) -> DmResult<Keys> {
        match self {
            Capability::Keys(keys) => Ok(keys),
            Capability::ReadOnly(_) => Err(DmError::MissingEncryptionCapability),
        }
    }
}
