//! Error types for wavedm

use thiserror::Error;

use crate::crypto::nip44::Nip44Error;

/// Main error type for wavedm operations.
///
/// Protocol-shape mismatches found while opening a gift wrap are *not*
/// errors; they are reported as [`crate::envelope::Rejection`] values.
#[derive(Error, Debug)]
pub enum DmError {
    /// The identity in use cannot perform NIP-44 encryption
    #[error("Private messaging requires a NIP-44 capable signer")]
    MissingEncryptionCapability,

    /// NIP-44 encryption or decryption failed
    #[error("NIP-44 error: {0}")]
    Nip44(#[from] Nip44Error),

    /// Invalid key material (bad hex, off-curve point, invalid scalar)
    #[error("Key error: {0}")]
    Key(String),

    /// Signing or signature verification failed
    #[error("Signature error: {0}")]
    Signature(String),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The OS random source is unavailable
    #[error("Entropy source unavailable: {0}")]
    Entropy(String),

    /// Relay publish or query failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// Application payload cannot be encoded
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DmError {
    fn from(err: serde_json::Error) -> Self {
        DmError::Serialization(err.to_string())
    }
}

impl From<secp256k1::Error> for DmError {
    fn from(err: secp256k1::Error) -> Self {
        DmError::Key(err.to_string())
    }
}

/// Result type alias using DmError
pub type DmResult<T> = Result<T, DmError>;
