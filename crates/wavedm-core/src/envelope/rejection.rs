//! Outcomes of opening a gift wrap that are not errors

use std::fmt;

use thiserror::Error;

use crate::crypto::Nip44Error;
use crate::error::DmError;
use crate::event::Kind;
use crate::identity::PublicKey;

/// Which envelope layer a check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    GiftWrap,
    Seal,
    Rumor,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::GiftWrap => f.write_str("gift wrap"),
            Layer::Seal => f.write_str("seal"),
            Layer::Rumor => f.write_str("rumor"),
        }
    }
}

/// Why an envelope is "not a message for us".
///
/// Relays routinely deliver gift wraps meant for other applications, so
/// rejections are expected and frequent. They are reported, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Envelope is not a well-formed signed event: {0}")]
    MalformedEnvelope(String),

    #[error("Unexpected {layer} kind: expected {expected}, got {got}")]
    WrongKind { layer: Layer, expected: Kind, got: Kind },

    #[error("Gift wrap has no recipient tag")]
    MissingAddressee,

    #[error("Gift wrap signature invalid: {0}")]
    WrapSignature(String),

    #[error("Gift wrap could not be decrypted: {0}")]
    WrapDecryption(Nip44Error),

    #[error("Seal is not a well-formed signed event: {0}")]
    MalformedSeal(String),

    #[error("Seal carries tags")]
    SealHasTags,

    #[error("Seal signature invalid: {0}")]
    SealSignature(String),

    #[error("Seal could not be decrypted: {0}")]
    SealDecryption(Nip44Error),

    #[error("Rumor is malformed: {0}")]
    MalformedRumor(String),

    #[error("Rumor carries a signature")]
    RumorSigned,

    #[error("Rumor id does not match its contents")]
    RumorIdMismatch,

    #[error("Rumor author {rumor} differs from seal author {seal}")]
    AuthorMismatch { seal: PublicKey, rumor: PublicKey },

    #[error("Rumor lacks the type tag for this application")]
    MissingTypeTag,

    #[error("Rumor lacks required tag: {0}")]
    MissingField(&'static str),
}

/// Result of opening one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded<T> {
    Message(T),
    Rejected(Rejection),
}

impl<T> Decoded<T> {
    pub fn message(self) -> Option<T> {
        match self {
            Decoded::Message(message) => Some(message),
            Decoded::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decoded::Message(_) => None,
            Decoded::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Decoded::Rejected(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Message(message) => Decoded::Message(f(message)),
            Decoded::Rejected(rejection) => Decoded::Rejected(rejection),
        }
    }
}

/// Internal short-circuit for the unwrap ladder: either a rejection to
/// report or a fatal error to propagate.
pub(crate) enum Stop {
    Rejected(Rejection),
    Fatal(DmError),
}

impl From<Rejection> for Stop {
    fn from(rejection: Rejection) -> Self {
        Stop::Rejected(rejection)
    }
}

impl From<DmError> for Stop {
    fn from(err: DmError) -> Self {
        Stop::Fatal(err)
    }
}

impl Stop {
    /// NIP-44 failures become `rejection`; anything else stays fatal.
    pub(crate) fn nip44(err: DmError, rejection: fn(Nip44Error) -> Rejection) -> Self {
        match err {
            DmError::Nip44(e) => Stop::Rejected(rejection(e)),
            other => Stop::Fatal(other),
        }
    }

    pub(crate) fn finish<T>(result: Result<T, Stop>) -> Result<Decoded<T>, DmError> {
        match result {
            Ok(value) => Ok(Decoded::Message(value)),
            Err(Stop::Rejected(rejection)) => Ok(Decoded::Rejected(rejection)),
            Err(Stop::Fatal(err)) => Err(err),
        }
    }
}
