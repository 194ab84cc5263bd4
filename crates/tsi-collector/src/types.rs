//! Advanced-search API response types.
//!
//! Only the fields the collector reads are modelled; everything else in the
//! payload is ignored.

use serde::Deserialize;
use tsi_core::{parse_timestamp, TweetRecord};

/// One page of search results.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    /// Absent or `null` on some empty pages.
    #[serde(default)]
    pub tweets: Option<Vec<ApiTweet>>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl SearchPage {
    /// The cursor for the following page, if the API provided a usable one.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTweet {
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ApiTweet {
    /// Convert into a tagged record. Returns `None` when the timestamp or text
    /// is missing, or the timestamp does not parse.
    #[must_use]
    pub fn into_record(self, industry: &str) -> Option<TweetRecord> {
        let timestamp = self.created_at.as_deref().and_then(parse_timestamp)?;
        let text = self.text?;
        Some(TweetRecord {
            timestamp,
            text,
            industry: industry.to_string(),
        })
    }
}
