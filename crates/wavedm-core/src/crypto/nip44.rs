//! NIP-44 version 2 payload encryption
//!
//! ```text
//! conversation_key = HKDF-extract(salt = "nip44-v2", ikm = ECDH(a, B).x)
//! chacha_key || chacha_nonce || hmac_key = HKDF-expand(conversation_key, info = nonce, 76)
//! payload = base64(0x02 || nonce (32) || ChaCha20(padded plaintext) || HMAC-SHA256(nonce || ciphertext))
//! ```
//!
//! The conversation key is symmetric: `ECDH(a, B) == ECDH(b, A)`, so the
//! same key encrypts in one direction and decrypts in the other.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use secp256k1::{ecdh, Parity, PublicKey as FullPublicKey, SecretKey, XOnlyPublicKey};
use sha2::Sha256;
use thiserror::Error;

/// Payload version byte
pub const VERSION: u8 = 2;

/// Smallest plaintext that can be encrypted (bytes)
pub const MIN_PLAINTEXT_LEN: usize = 1;

/// Largest plaintext that can be encrypted (bytes)
pub const MAX_PLAINTEXT_LEN: usize = 65535;

/// Per-message nonce size
pub const NONCE_SIZE: usize = 32;

/// HMAC-SHA256 tag size
pub const MAC_SIZE: usize = 32;

const HKDF_SALT: &[u8] = b"nip44-v2";

// Bounds on the base64 text and on the decoded bytes.
const MIN_PAYLOAD_LEN: usize = 132;
const MAX_PAYLOAD_LEN: usize = 87472;
const MIN_DECODED_LEN: usize = 99;
const MAX_DECODED_LEN: usize = 65603;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced by NIP-44 encryption and decryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Nip44Error {
    #[error("Plaintext length {0} is outside 1..=65535")]
    PlaintextLength(usize),

    #[error("Unknown encryption version")]
    UnknownVersion,

    #[error("Unsupported encryption version: {0}")]
    UnsupportedVersion(u8),

    #[error("Invalid payload length: {0}")]
    PayloadLength(usize),

    #[error("Invalid base64: {0}")]
    Base64(String),

    #[error("Invalid MAC")]
    InvalidMac,

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Decrypted plaintext is not valid UTF-8")]
    InvalidUtf8,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Shared secret between two identities.
#[derive(Clone, PartialEq, Eq)]
pub struct ConversationKey([u8; 32]);

impl ConversationKey {
    /// Derive the conversation key for `secret` talking to `public`.
    pub fn derive(secret: &SecretKey, public: &XOnlyPublicKey) -> Self {
        // Parity does not affect the x coordinate of the shared point.
        let point = FullPublicKey::from_x_only_public_key(*public, Parity::Even);
        let shared = ecdh::shared_secret_point(&point, secret);
        let (prk, _) = Hkdf::<Sha256>::extract(Some(HKDF_SALT), &shared[..32]);

        let mut key = [0u8; 32];
        key.copy_from_slice(&prk);
        Self(key)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ConversationKey(..)")
    }
}

struct MessageKeys {
    chacha_key: [u8; 32],
    chacha_nonce: [u8; 12],
    hmac_key: [u8; 32],
}

fn message_keys(
    conversation_key: &ConversationKey,
    nonce: &[u8; NONCE_SIZE],
) -> Result<MessageKeys, Nip44Error> {
    let hkdf = Hkdf::<Sha256>::from_prk(conversation_key.as_bytes())
        .map_err(|e| Nip44Error::KeyDerivation(e.to_string()))?;

    let mut okm = [0u8; 76];
    hkdf.expand(nonce, &mut okm)
        .map_err(|e| Nip44Error::KeyDerivation(e.to_string()))?;

    let mut keys = MessageKeys {
        chacha_key: [0u8; 32],
        chacha_nonce: [0u8; 12],
        hmac_key: [0u8; 32],
    };
    keys.chacha_key.copy_from_slice(&okm[0..32]);
    keys.chacha_nonce.copy_from_slice(&okm[32..44]);
    keys.hmac_key.copy_from_slice(&okm[44..76]);
    Ok(keys)
}

/// Padded size for a plaintext of `unpadded_len` bytes (excluding the
/// 2-byte length prefix).
pub fn calc_padded_len(unpadded_len: usize) -> usize {
    if unpadded_len <= 32 {
        return 32;
    }

    let next_power = 1usize << (usize::BITS - (unpadded_len - 1).leading_zeros());
    let chunk = if next_power <= 256 { 32 } else { next_power / 8 };
    chunk * ((unpadded_len - 1) / chunk + 1)
}

fn pad(plaintext: &str) -> Result<Vec<u8>, Nip44Error> {
    let bytes = plaintext.as_bytes();
    let len = bytes.len();
    if !(MIN_PLAINTEXT_LEN..=MAX_PLAINTEXT_LEN).contains(&len) {
        return Err(Nip44Error::PlaintextLength(len));
    }

    let mut padded = vec![0u8; 2 + calc_padded_len(len)];
    padded[..2].copy_from_slice(&(len as u16).to_be_bytes());
    padded[2..2 + len].copy_from_slice(bytes);
    Ok(padded)
}

fn unpad(padded: &[u8]) -> Result<String, Nip44Error> {
    if padded.len() < 2 {
        return Err(Nip44Error::InvalidPadding);
    }

    let len = u16::from_be_bytes([padded[0], padded[1]]) as usize;
    if len == 0 || padded.len() != 2 + calc_padded_len(len) {
        return Err(Nip44Error::InvalidPadding);
    }

    String::from_utf8(padded[2..2 + len].to_vec()).map_err(|_| Nip44Error::InvalidUtf8)
}

fn mac(hmac_key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, Nip44Error> {
    let mut mac = HmacSha256::new_from_slice(hmac_key)
        .map_err(|e| Nip44Error::KeyDerivation(e.to_string()))?;
    mac.update(nonce);
    mac.update(ciphertext);
    Ok(mac)
}

/// Encrypt `plaintext` under `conversation_key` with a fresh random nonce.
pub fn encrypt(conversation_key: &ConversationKey, plaintext: &str) -> Result<String, Nip44Error> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);
    encrypt_with_nonce(conversation_key, plaintext, &nonce)
}

/// Encrypt with a caller-chosen nonce. The nonce must never repeat under
/// the same conversation key.
pub fn encrypt_with_nonce(
    conversation_key: &ConversationKey,
    plaintext: &str,
    nonce: &[u8; NONCE_SIZE],
) -> Result<String, Nip44Error> {
    let keys = message_keys(conversation_key, nonce)?;

    let mut ciphertext = pad(plaintext)?;
    let mut cipher = ChaCha20::new(&keys.chacha_key.into(), &keys.chacha_nonce.into());
    cipher.apply_keystream(&mut ciphertext);

    let tag = mac(&keys.hmac_key, nonce, &ciphertext)?.finalize().into_bytes();

    let mut payload = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len() + MAC_SIZE);
    payload.push(VERSION);
    payload.extend_from_slice(nonce);
    payload.extend_from_slice(&ciphertext);
    payload.extend_from_slice(&tag);

    Ok(BASE64.encode(payload))
}

/// Decrypt a base64 NIP-44 v2 payload.
///
/// The MAC is checked (in constant time) before anything is decrypted.
pub fn decrypt(conversation_key: &ConversationKey, payload: &str) -> Result<String, Nip44Error> {
    if payload.starts_with('#') {
        return Err(Nip44Error::UnknownVersion);
    }
    if !(MIN_PAYLOAD_LEN..=MAX_PAYLOAD_LEN).contains(&payload.len()) {
        return Err(Nip44Error::PayloadLength(payload.len()));
    }

    let data = BASE64
        .decode(payload)
        .map_err(|e| Nip44Error::Base64(e.to_string()))?;
    if !(MIN_DECODED_LEN..=MAX_DECODED_LEN).contains(&data.len()) {
        return Err(Nip44Error::PayloadLength(data.len()));
    }
    if data[0] != VERSION {
        return Err(Nip44Error::UnsupportedVersion(data[0]));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&data[1..1 + NONCE_SIZE]);
    let (ciphertext, tag) = data[1 + NONCE_SIZE..].split_at(data.len() - 1 - NONCE_SIZE - MAC_SIZE);

    let keys = message_keys(conversation_key, &nonce)?;
    mac(&keys.hmac_key, &nonce, ciphertext)?
        .verify_slice(tag)
        .map_err(|_| Nip44Error::InvalidMac)?;

    let mut padded = ciphertext.to_vec();
    let mut cipher = ChaCha20::new(&keys.chacha_key.into(), &keys.chacha_nonce.into());
    cipher.apply_keystream(&mut padded);

    unpad(&padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::{Keypair, Secp256k1};

    fn secret(last_byte: u8) -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = last_byte;
        SecretKey::from_slice(&bytes).unwrap()
    }

    fn x_only(secret: &SecretKey) -> XOnlyPublicKey {
        let secp = Secp256k1::new();
        Keypair::from_secret_key(&secp, secret).x_only_public_key().0
    }

    fn random_secret() -> SecretKey {
        loop {
            let mut bytes = [0u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            if let Ok(sk) = SecretKey::from_slice(&bytes) {
                return sk;
            }
        }
    }

    #[test]
    fn test_padded_len_table() {
        let cases = [
            (16, 32),
            (32, 32),
            (33, 64),
            (37, 64),
            (45, 64),
            (49, 64),
            (64, 64),
            (65, 96),
            (100, 128),
            (111, 128),
            (200, 224),
            (250, 256),
            (320, 320),
            (383, 384),
            (384, 384),
            (400, 448),
            (500, 512),
            (512, 512),
            (515, 640),
            (700, 768),
            (800, 896),
            (900, 1024),
            (1020, 1024),
            (65536, 65536),
        ];

        for (unpadded, padded) in cases {
            assert_eq!(calc_padded_len(unpadded), padded, "unpadded_len = {}", unpadded);
        }
    }

    #[test]
    fn test_conversation_key_known_answer() {
        let key = ConversationKey::derive(&secret(1), &x_only(&secret(2)));
        assert_eq!(
            hex::encode(key.as_bytes()),
            "c41c775356fd92eadc63ff5a0dc1da211b268cbea22316767095b2871ea1412d"
        );
    }

    #[test]
    fn test_encrypt_known_answer() {
        let key = ConversationKey::derive(&secret(1), &x_only(&secret(2)));
        let mut nonce = [0u8; NONCE_SIZE];
        nonce[31] = 1;

        let payload = encrypt_with_nonce(&key, "a", &nonce).unwrap();
        assert_eq!(
            payload,
            "AgAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABee0G5VSK0/9YypIObAtDKfYEAjD35uVkHyB0F4DwrcNaCXlCWZKaArsGrY6M9wnuTMxWfp1RTN9Xga8no+kF5Vsb"
        );
        assert_eq!(decrypt(&key, &payload).unwrap(), "a");
    }

    #[test]
    fn test_conversation_key_symmetric() {
        let alice = random_secret();
        let bob = random_secret();

        let ab = ConversationKey::derive(&alice, &x_only(&bob));
        let ba = ConversationKey::derive(&bob, &x_only(&alice));
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_roundtrip_between_parties() {
        let alice = random_secret();
        let bob = random_secret();
        let message = "Great track! Have a listen 🎧";

        let payload = encrypt(&ConversationKey::derive(&alice, &x_only(&bob)), message).unwrap();
        let plaintext = decrypt(&ConversationKey::derive(&bob, &x_only(&alice)), &payload).unwrap();

        assert_eq!(plaintext, message);
    }

    #[test]
    fn test_random_nonce_changes_payload() {
        let key = ConversationKey::derive(&random_secret(), &x_only(&random_secret()));
        let p1 = encrypt(&key, "same").unwrap();
        let p2 = encrypt(&key, "same").unwrap();
        assert_ne!(p1, p2);
    }

    #[test]
    fn test_wrong_key_fails_mac() {
        let alice = random_secret();
        let bob = random_secret();
        let eve = random_secret();

        let payload = encrypt(&ConversationKey::derive(&alice, &x_only(&bob)), "secret").unwrap();
        let result = decrypt(&ConversationKey::derive(&eve, &x_only(&alice)), &payload);
        assert_eq!(result, Err(Nip44Error::InvalidMac));
    }

    #[test]
    fn test_tampered_ciphertext_fails_mac() {
        let key = ConversationKey::derive(&random_secret(), &x_only(&random_secret()));
        let payload = encrypt(&key, "do not touch").unwrap();

        let mut raw = BASE64.decode(&payload).unwrap();
        raw[40] ^= 0x01;
        let tampered = BASE64.encode(raw);

        assert_eq!(decrypt(&key, &tampered), Err(Nip44Error::InvalidMac));
    }

    #[test]
    fn test_plaintext_bounds() {
        let key = ConversationKey::derive(&random_secret(), &x_only(&random_secret()));
        assert_eq!(encrypt(&key, ""), Err(Nip44Error::PlaintextLength(0)));

        let too_long = "x".repeat(MAX_PLAINTEXT_LEN + 1);
        assert_eq!(
            encrypt(&key, &too_long),
            Err(Nip44Error::PlaintextLength(MAX_PLAINTEXT_LEN + 1))
        );

        let longest = "x".repeat(MAX_PLAINTEXT_LEN);
        let payload = encrypt(&key, &longest).unwrap();
        assert_eq!(decrypt(&key, &payload).unwrap().len(), MAX_PLAINTEXT_LEN);
    }

    #[test]
    fn test_rejects_unknown_and_unsupported_versions() {
        let key = ConversationKey::derive(&random_secret(), &x_only(&random_secret()));
        assert_eq!(decrypt(&key, "#Atqupco0WyaOW2IGDKcshwxI9xO8HgD/P8Ddt46CbxDbrhdG8VmJZE0UICD06CUvEvdnr1cp1fiMtlM/GrE92xAc1EwsVCQEgWEu2gsHUVf4JAa3TpgkmFc3TWsax0v6n/Wq"), Err(Nip44Error::UnknownVersion));

        let payload = encrypt(&key, "hello").unwrap();
        let mut raw = BASE64.decode(&payload).unwrap();
        raw[0] = 1;
        assert_eq!(
            decrypt(&key, &BASE64.encode(raw)),
            Err(Nip44Error::UnsupportedVersion(1))
        );
    }

    #[test]
    fn test_rejects_short_payload() {
        let key = ConversationKey::derive(&random_secret(), &x_only(&random_secret()));
        assert!(matches!(
            decrypt(&key, "AgAA"),
            Err(Nip44Error::PayloadLength(4))
        ));
    }

    #[test]
    fn test_unpad_rejects_bad_length_prefix() {
        let mut padded = pad("hello").unwrap();
        padded[1] = 40;
        assert_eq!(unpad(&padded), Err(Nip44Error::InvalidPadding));

        assert_eq!(unpad(&[0u8; 34]), Err(Nip44Error::InvalidPadding));
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = ConversationKey::derive(&random_secret(), &x_only(&random_secret()));
        assert_eq!(format!("{:?}", key), "ConversationKey(..)");
    }
}
