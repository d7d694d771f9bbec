//! Runtime configuration
//!
//! Defaults suit the public relay network. A JSON file may override any
//! subset of fields:
//!
//! ```json
//! { "timestamp_jitter_secs": 86400, "inbox_limit": 50 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DmError, DmResult};

/// Two days: the backdating window NIP-59 recommends.
pub const DEFAULT_TIMESTAMP_JITTER_SECS: u64 = 2 * 24 * 60 * 60;

pub const DEFAULT_INBOX_LIMIT: usize = 100;

const MAX_TIMESTAMP_JITTER_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_INBOX_LIMIT: usize = 5_000;

/// Settings shared by the encoder and the messenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmConfig {
    /// Upper bound of the random offset subtracted from seal and wrap
    /// timestamps.
    pub timestamp_jitter_secs: u64,
    /// Maximum gift wraps requested per inbox query.
    pub inbox_limit: usize,
    /// Only fetch wraps newer than this many seconds (plus the jitter
    /// window). `None` fetches everything up to `inbox_limit`.
    pub inbox_lookback_secs: Option<u64>,
}

impl Default for DmConfig {
    fn default() -> Self {
        Self {
            timestamp_jitter_secs: DEFAULT_TIMESTAMP_JITTER_SECS,
            inbox_limit: DEFAULT_INBOX_LIMIT,
            inbox_lookback_secs: None,
        }
    }
}

impl DmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp_jitter(mut self, secs: u64) -> Self {
        self.timestamp_jitter_secs = secs;
        self
    }

    pub fn with_inbox_limit(mut self, limit: usize) -> Self {
        self.inbox_limit = limit;
        self
    }

    pub fn with_inbox_lookback(mut self, secs: u64) -> Self {
        self.inbox_lookback_secs = Some(secs);
        self
    }

    pub fn validate(&self) -> DmResult<()> {
        if self.timestamp_jitter_secs > MAX_TIMESTAMP_JITTER_SECS {
            return Err(DmError::Config(format!(
                "timestamp_jitter_secs must be at most {}, got {}",
                MAX_TIMESTAMP_JITTER_SECS, self.timestamp_jitter_secs
            )));
        }
        if self.inbox_limit == 0 || self.inbox_limit > MAX_INBOX_LIMIT {
            return Err(DmError::Config(format!(
                "inbox_limit must be between 1 and {}, got {}",
                MAX_INBOX_LIMIT, self.inbox_limit
            )));
        }
        Ok(())
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> DmResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            DmError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }
}
