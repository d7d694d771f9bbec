use std::fmt;

use serde::{Deserialize, Serialize};

/// Event kind discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(pub u16);

impl Kind {
    /// Kind 13: a signed, encrypted rumor (NIP-59)
    pub const SEAL: Kind = Kind(13);

    /// Kind 14: a private direct message rumor (NIP-17)
    pub const PRIVATE_DIRECT_MESSAGE: Kind = Kind(14);

    /// Kind 1059: the ephemerally signed outer envelope (NIP-59)
    pub const GIFT_WRAP: Kind = Kind(1059);

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Kind {
    fn from(kind: u16) -> Self {
        Kind(kind)
    }
}
