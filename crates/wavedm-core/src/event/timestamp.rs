use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Unix time in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This time minus a uniform random offset in `[0, max_secs]`.
    ///
    /// Seal and gift wrap timestamps are moved into the past this way so
    /// relay-visible times do not reveal when a message was really sent.
    pub fn jittered_back(self, max_secs: u64) -> Self {
        let offset = rand::rng().random_range(0..=max_secs);
        Self(self.0.saturating_sub(offset))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
