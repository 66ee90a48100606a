//! Advisory title classification and parsing.
//!
//! Titles look like
//! `Advisory #033 Wind Field [shp] - Tropical Storm Florence (AT1/AL062018)`:
//! a kind label, a descriptor, the storm name, then `(BASIN/CODE)`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::ItemError;

/// Marker present in wind-field advisory titles
const WIND_FIELD_MARKER: &str = "Wind Field [shp]";

/// Marker present in track-point advisory titles
const TRACK_POINTS_MARKER: &str = "Best Track Points [kmz]";

static WIND_FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Wind Field \[shp\] - (?:.*\s)?([^\s()]+)\s*\([^/()]*/([^/()\s]+)\)").unwrap()
});

static TRACK_POINTS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Best Track Points \[kmz\] - (?:.*\s)?([^\s()]+)\s*\([^/()]*/([^/()\s]+)\)")
        .unwrap()
});

/// The two advisory products the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdvisoryKind {
    WindField,
    TrackPoints,
}

impl AdvisoryKind {
    /// Classify a feed title. Titles of other products yield `None`.
    pub fn classify(title: &str) -> Option<Self> {
        if title.contains(WIND_FIELD_MARKER) {
            Some(AdvisoryKind::WindField)
        } else if title.contains(TRACK_POINTS_MARKER) {
            Some(AdvisoryKind::TrackPoints)
        } else {
            None
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            AdvisoryKind::WindField => &WIND_FIELD_PATTERN,
            AdvisoryKind::TrackPoints => &TRACK_POINTS_PATTERN,
        }
    }
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvisoryKind::WindField => write!(f, "wind-field"),
            AdvisoryKind::TrackPoints => write!(f, "track-points"),
        }
    }
}

/// Name and code extracted from a title, both lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub name: String,
    pub code: String,
}

/// Extract `(name, code)` from a title of the given kind.
pub fn parse_title(title: &str, kind: AdvisoryKind) -> Result<ParsedTitle, ItemError> {
    let caps = kind.pattern().captures(title).ok_or_else(|| {
        ItemError::MalformedTitle(format!("'{}' does not match the {} layout", title, kind))
    })?;

    match (caps.get(1), caps.get(2)) {
        (Some(name), Some(code)) => Ok(ParsedTitle {
            name: name.as_str().to_lowercase(),
            code: code.as_str().to_lowercase(),
        }),
        _ => Err(ItemError::MalformedTitle(title.to_string())),
    }
}
