//! Application payloads carried inside rumors
//!
//! A payload type owns one value of the rumor's `t` tag. The decoder only
//! hands a rumor to [`DmPayload::from_rumor`] after checking that tag, so
//! other applications' messages on the same relays never reach it.

mod track;

use crate::envelope::Rejection;
use crate::error::DmResult;
use crate::event::Tag;
use crate::giftwrap::Rumor;

pub use track::{
    TrackSuggestion, TAG_TRACK_ARTIST, TAG_TRACK_ID, TAG_TRACK_TITLE, TRACK_SUGGESTION_TYPE,
};

/// Structured content that can travel as a private direct message.
pub trait DmPayload: Sized + Send + Sync {
    /// Value of the `t` tag identifying this payload type.
    const TYPE: &'static str;

    /// Refuse to encode values that could never be decoded.
    fn validate(&self) -> DmResult<()> {
        Ok(())
    }

    /// Human-readable `subject` tag value.
    fn subject(&self) -> String;

    /// Rumor `content`.
    fn content(&self) -> String;

    /// Payload-specific tags, appended after the envelope's own.
    fn tags(&self) -> Vec<Tag>;

    /// Rebuild the payload from a rumor already known to carry `TYPE`.
    fn from_rumor(rumor: &Rumor) -> Result<Self, Rejection>;
}
