//! Stable secp256k1 identities and their public keys

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, SecretKey, XOnlyPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::{ConversationKey, SECP};
use crate::error::{DmError, DmResult};

/// BIP-340 x-only public key, lowercase hex on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(XOnlyPublicKey);

impl PublicKey {
    /// Parse a 64-character hex key.
    pub fn from_hex(hex_str: &str) -> DmResult<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|e| DmError::Key(format!("Invalid public key hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Build from 32 raw bytes; fails if they are not a valid x coordinate.
    pub fn from_bytes(bytes: &[u8; 32]) -> DmResult<Self> {
        XOnlyPublicKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| DmError::Key(format!("Invalid public key: {}", e)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.serialize())
    }

    pub fn as_x_only(&self) -> &XOnlyPublicKey {
        &self.0
    }

    /// Verify a Schnorr signature over a 32-byte digest.
    pub fn verify(&self, digest: &[u8; 32], signature: &Signature) -> DmResult<()> {
        SECP.verify_schnorr(signature, &Message::from_digest(*digest), &self.0)
            .map_err(|e| DmError::Signature(format!("Schnorr verification failed: {}", e)))
    }
}

impl From<XOnlyPublicKey> for PublicKey {
    fn from(key: XOnlyPublicKey) -> Self {
        Self(key)
    }
}

impl FromStr for PublicKey {
    type Err = DmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Draw a secret scalar from the OS random source.
///
/// Fails only when the random source itself is unavailable.
pub(crate) fn random_secret_key() -> DmResult<SecretKey> {
    loop {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed)
            .map_err(|e| DmError::Entropy(format!("Failed to generate key: {}", e)))?;
        // Out-of-range scalars are astronomically rare; draw again.
        if let Ok(secret) = SecretKey::from_slice(&seed) {
            return Ok(secret);
        }
    }
}

/// A user's stable signing and encryption identity.
#[derive(Clone)]
pub struct Keys {
    keypair: Keypair,
    public_key: PublicKey,
}

impl Keys {
    /// Generate a new random identity.
    pub fn generate() -> DmResult<Self> {
        Ok(Self::from_secret_key(random_secret_key()?))
    }

    pub fn from_secret_key(secret: SecretKey) -> Self {
        let keypair = Keypair::from_secret_key(&*SECP, &secret);
        let (x_only, _) = keypair.x_only_public_key();
        Self {
            keypair,
            public_key: PublicKey(x_only),
        }
    }

    /// Import an identity from a 64-character hex secret.
    pub fn from_secret_hex(hex_str: &str) -> DmResult<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str.trim(), &mut bytes)
            .map_err(|e| DmError::Key(format!("Invalid secret key hex: {}", e)))?;
        let secret = SecretKey::from_slice(&bytes)?;
        Ok(Self::from_secret_key(secret))
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Hex export of the secret, for persisting the identity.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.keypair.secret_bytes())
    }

    /// Schnorr-sign a 32-byte digest with fresh auxiliary randomness.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Signature {
        let mut aux = [0u8; 32];
        rand::rng().fill_bytes(&mut aux);
        SECP.sign_schnorr_with_aux_rand(&Message::from_digest(*digest), &self.keypair, &aux)
    }

    /// NIP-44 conversation key with `peer`.
    pub fn conversation_key(&self, peer: &PublicKey) -> ConversationKey {
        ConversationKey::derive(&self.keypair.secret_key(), peer.as_x_only())
    }

    pub(crate) fn erase(&mut self) {
        self.keypair.non_secure_erase();
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("public_key", &self.public_key.to_hex())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let a = Keys::generate().unwrap();
        let b = Keys::generate().unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_secret_hex_roundtrip() {
        let keys = Keys::generate().unwrap();
        let restored = Keys::from_secret_hex(&keys.secret_hex()).unwrap();
        assert_eq!(keys.public_key(), restored.public_key());
    }

    #[test]
    fn test_known_public_key() {
        let keys = Keys::from_secret_hex(
            "0000000000000000000000000000000000000000000000000000000000000001",
        )
        .unwrap();
        assert_eq!(
            keys.public_key().to_hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_invalid_secret_rejected() {
        assert!(Keys::from_secret_hex("zz").is_err());
        assert!(Keys::from_secret_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_public_key_hex_roundtrip() {
        let pk = Keys::generate().unwrap().public_key();
        let parsed: PublicKey = pk.to_hex().parse().unwrap();
        assert_eq!(pk, parsed);
    }

    #[test]
    fn test_public_key_rejects_bad_input() {
        assert!(PublicKey::from_hex("abcd").is_err());
        assert!(PublicKey::from_hex(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_public_key_serde_as_hex_string() {
        let pk = Keys::generate().unwrap().public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_hex()));

        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pk);
        assert!(serde_json::from_str::<PublicKey>("\"1234\"").is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let keys = Keys::generate().unwrap();
        let digest = crate::crypto::sha256(b"track suggestion");
        let sig = keys.sign_digest(&digest);

        assert!(keys.public_key().verify(&digest, &sig).is_ok());

        let other = Keys::generate().unwrap();
        assert!(other.public_key().verify(&digest, &sig).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keys = Keys::generate().unwrap();
        let debug = format!("{:?}", keys);
        assert!(debug.contains(&keys.public_key().to_hex()));
        assert!(!debug.contains(&keys.secret_hex()));
    }
}
