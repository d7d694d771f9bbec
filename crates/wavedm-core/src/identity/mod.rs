//! Identities: stable user keys and single-use ephemeral keys
//!
//! ## Overview
//!
//! - **Keys**: a user's secp256k1 keypair. Signs seals, derives NIP-44
//!   conversation keys. Persists across messages.
//! - **EphemeralKeys**: generated per gift wrap, signs that one wrap and is
//!   wiped. Never reused, never stored.
//! - **PublicKey**: BIP-340 x-only key, the identity visible on the wire.
//!
//! ## Example
//!
//! ```rust
//! use wavedm_core::identity::{EphemeralKeys, Keys};
//!
//! let alice = Keys::generate().unwrap();
//! let throwaway = EphemeralKeys::generate().unwrap();
//!
//! assert_ne!(alice.public_key(), throwaway.public_key());
//! ```

mod ephemeral;
mod keys;

pub use ephemeral::EphemeralKeys;
pub use keys::{Keys, PublicKey};
