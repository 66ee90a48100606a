//! Feed items as supplied by the feed source.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ItemError;

/// One advisory entry from the storm feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    #[serde(default)]
    pub link: String,
    /// RSS form, e.g. `Fri, 14 Sep 2018 03:00:00 GMT`
    pub published: String,
}

/// Layout of `published` once the zone abbreviation is removed.
const PUBLISHED_WITHOUT_ZONE: &str = "%a, %d %b %Y %H:%M:%S";

impl FeedItem {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: published.into(),
        }
    }

    /// Parse the published timestamp.
    ///
    /// RFC 2822 zones (`GMT`, `UT`, `EDT`, numeric offsets...) are honoured.
    /// Any other trailing zone abbreviation is read as a zero offset.
    /// North American zones such as `EDT` therefore shift the instant by
    /// their real offset rather than being read as UTC.
    pub fn published_at(&self) -> Result<DateTime<Utc>, ItemError> {
        let value = self.published.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
            return Ok(parsed.with_timezone(&Utc));
        }

        let malformed = |reason: String| ItemError::MalformedTimestamp {
            value: value.to_string(),
            reason,
        };

        let (stamp, zone) = value
            .rsplit_once(' ')
            .ok_or_else(|| malformed("missing zone".to_string()))?;
        if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(malformed(format!("unrecognised zone '{}'", zone)));
        }
        NaiveDateTime::parse_from_str(stamp, PUBLISHED_WITHOUT_ZONE)
            .map(|naive| naive.and_utc())
            .map_err(|e| malformed(e.to_string()))
    }

    /// Archive name without extension, taken from the link's last path segment.
    pub fn file_stem(&self) -> Option<&str> {
        let path = self.link.split(['?', '#']).next()?;
        let name = path.rsplit('/').next()?;
        let stem = match name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => name,
        };
        (!stem.is_empty()).then_some(stem)
    }
}
