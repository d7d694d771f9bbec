use serde::{Deserialize, Serialize};

use crate::identity::PublicKey;

/// Recipient reference (`["p", <hex pubkey>]`)
pub const TAG_PUBKEY: &str = "p";

/// Conversation subject (`["subject", <text>]`)
pub const TAG_SUBJECT: &str = "subject";

/// Type discriminator (`["t", <name>]`)
pub const TAG_TYPE: &str = "t";

/// One event tag: a name followed by zero or more values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// `[name, value]`
    pub fn pair(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self(vec![name.into(), value.into()])
    }

    /// `["p", pubkey]`
    pub fn public_key(pubkey: &PublicKey) -> Self {
        Self::pair(TAG_PUBKEY, pubkey.to_hex())
    }

    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// First value of the first tag called `name`.
pub fn find_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|tag| tag.name() == Some(name))
        .and_then(Tag::value)
}

/// Whether any `name` tag carries exactly `value`.
pub fn has_pair(tags: &[Tag], name: &str, value: &str) -> bool {
    tags.iter()
        .any(|tag| tag.name() == Some(name) && tag.value() == Some(value))
}

/// Every well-formed `p` tag, in order. Malformed keys are skipped.
pub fn public_keys(tags: &[Tag]) -> Vec<PublicKey> {
    tags.iter()
        .filter(|tag| tag.name() == Some(TAG_PUBKEY))
        .filter_map(|tag| tag.value())
        .filter_map(|value| PublicKey::from_hex(value).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Keys;

    #[test]
    fn test_tag_serializes_as_array() {
        let tag = Tag::pair("t", "track-suggestion");
        assert_eq!(
            serde_json::to_string(&tag).unwrap(),
            r#"["t","track-suggestion"]"#
        );
    }

    #[test]
    fn test_find_value_returns_first_match() {
        let tags = vec![
            Tag::pair("subject", "first"),
            Tag::pair("subject", "second"),
            Tag::new(["empty"]),
        ];
        assert_eq!(find_value(&tags, "subject"), Some("first"));
        assert_eq!(find_value(&tags, "empty"), None);
        assert_eq!(find_value(&tags, "missing"), None);
    }

    #[test]
    fn test_has_pair() {
        let tags = vec![Tag::pair("t", "playlist"), Tag::pair("t", "track-suggestion")];
        assert!(has_pair(&tags, "t", "track-suggestion"));
        assert!(!has_pair(&tags, "t", "livestream"));
    }

    #[test]
    fn test_public_keys_skips_malformed() {
        let alice = Keys::generate().unwrap().public_key();
        let tags = vec![
            Tag::public_key(&alice),
            Tag::pair("p", "not-a-key"),
            Tag::new(["p"]),
        ];
        assert_eq!(public_keys(&tags), vec![alice]);
    }
}
