//! Cryptographic building blocks
//!
//! - **secp256k1**: identities, BIP-340 Schnorr signatures and ECDH
//! - **NIP-44 v2**: ChaCha20 + HMAC-SHA256 payload encryption keyed by ECDH
//! - **SHA-256**: content addressing of events

pub mod nip44;

use std::sync::LazyLock;

use secp256k1::{All, Secp256k1};
use sha2::{Digest, Sha256};

pub use nip44::{ConversationKey, Nip44Error};

/// Shared secp256k1 context. Read-only after construction.
pub(crate) static SECP: LazyLock<Secp256k1<All>> = LazyLock::new(Secp256k1::new);

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
