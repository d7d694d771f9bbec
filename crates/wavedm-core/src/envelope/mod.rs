//! Private direct messages: encoding and decoding
//!
//! ```text
//! payload ──encode──▶ rumor ─┬─ seal → gift wrap  (to recipient)
//!                            └─ seal → gift wrap  (to sender)
//!
//! gift wrap ──decode──▶ Decoded::Message(Received { payload, sender, .. })
//!                     │ Decoded::Rejected(Rejection)
//! ```
//!
//! Decoding never fails just because an envelope is not ours or not
//! well-formed; that is a [`Rejection`]. Only capability failures are
//! errors.

mod decoder;
mod encoder;
mod rejection;

pub use decoder::{EnvelopeDecoder, Received};
pub use encoder::{AddressedWrap, EnvelopeEncoder, WrappedMessage, MAX_RUMOR_LEN};
pub use rejection::{Decoded, Layer, Rejection};

pub(crate) use rejection::Stop;
