//! Single-use identities for gift wrap envelopes
//!
//! Every gift wrap is signed by its own freshly generated key so the
//! relay-visible signature says nothing about the real sender. The type is
//! not `Clone` and [`EphemeralKeys::sign`] consumes it: one key,
//! one envelope. The secret is wiped when the value is dropped and is never
//! exposed, logged or serialized.

use std::fmt;

use crate::error::DmResult;
use crate::event::{Event, UnsignedEvent};
use crate::identity::{Keys, PublicKey};

/// A throwaway keypair that can sign exactly one event.
pub struct EphemeralKeys {
    keys: Keys,
}

impl EphemeralKeys {
    /// Generate a fresh keypair from the OS random source.
    ///
    /// Fails only if the random source is unavailable.
    pub fn generate() -> DmResult<Self> {
        Ok(Self {
            keys: Keys::generate()?,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    /// NIP-44 encrypt `plaintext` from this key to `addressee`.
    pub fn encrypt_to(&self, addressee: &PublicKey, plaintext: &str) -> DmResult<String> {
        let conversation_key = self.keys.conversation_key(addressee);
        Ok(crate::crypto::nip44::encrypt(&conversation_key, plaintext)?)
    }

    /// Sign `unsigned` and discard the key.
    pub fn sign(self, unsigned: UnsignedEvent) -> DmResult<Event> {
        unsigned.sign_with(&self.keys)
    }
}

impl Drop for EphemeralKeys {
    fn drop(&mut self) {
        self.keys.erase();
    }
}

impl fmt::Debug for EphemeralKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeys")
            .field("public_key", &self.public_key().to_hex())
            .finish_non_exhaustive()
    }
}
