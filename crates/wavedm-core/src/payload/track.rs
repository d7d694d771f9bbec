//! Track suggestions

use serde::{Deserialize, Serialize};

use crate::envelope::Rejection;
use crate::error::{DmError, DmResult};
use crate::event::Tag;
use crate::giftwrap::Rumor;

use super::DmPayload;

pub const TRACK_SUGGESTION_TYPE: &str = "track-suggestion";
pub const TAG_TRACK_ID: &str = "track-id";
pub const TAG_TRACK_TITLE: &str = "track-title";
pub const TAG_TRACK_ARTIST: &str = "track-artist";

/// One user recommending a track to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSuggestion {
    pub track_id: String,
    pub track_title: String,
    pub track_artist: String,
    /// Free-text note; may be empty.
    pub message: String,
}

impl TrackSuggestion {
    pub fn new(
        track_id: impl Into<String>,
        track_title: impl Into<String>,
        track_artist: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            track_title: track_title.into(),
            track_artist: track_artist.into(),
            message: message.into(),
        }
    }
}

impl DmPayload for TrackSuggestion {
    const TYPE: &'static str = TRACK_SUGGESTION_TYPE;

    fn validate(&self) -> DmResult<()> {
        if self.track_id.is_empty() {
            return Err(DmError::InvalidPayload("track id is empty".to_string()));
        }
        Ok(())
    }

    fn subject(&self) -> String {
        format!(
            "Track suggestion: {} by {}",
            self.track_title, self.track_artist
        )
    }

    fn content(&self) -> String {
        self.message.clone()
    }

    fn tags(&self) -> Vec<Tag> {
        vec![
            Tag::pair(TAG_TRACK_ID, &self.track_id),
            Tag::pair(TAG_TRACK_TITLE, &self.track_title),
            Tag::pair(TAG_TRACK_ARTIST, &self.track_artist),
        ]
    }

    fn from_rumor(rumor: &Rumor) -> Result<Self, Rejection> {
        let field = |name: &'static str| {
            rumor
                .tag_value(name)
                .map(str::to_string)
                .ok_or(Rejection::MissingField(name))
        };

        let track_id = field(TAG_TRACK_ID)?;
        if track_id.is_empty() {
            return Err(Rejection::MissingField(TAG_TRACK_ID));
        }

        Ok(Self {
            track_id,
            track_title: field(TAG_TRACK_TITLE)?,
            track_artist: field(TAG_TRACK_ARTIST)?,
            message: rumor.content.clone(),
        })
    }
}
