use regex::Regex;

use crate::github::Notification;

/// Regex filter on a record's release tag.
///
/// The pattern is searched for anywhere in the tag (anchor it with `^`/`$`
/// for prefix or exact matches).
#[derive(Debug, Clone)]
pub struct TagFilter {
    regex: Regex,
}

impl TagFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// A record without a tag (not a release, enrichment off or failed) never
    /// matches.
    pub fn matches(&self, notification: &Notification) -> bool {
        notification
            .tag_name()
            .is_some_and(|tag| self.regex.is_match(tag))
    }
}

/// Decide whether a record is emitted. Without a filter every record is.
pub fn should_emit(filter: Option<&TagFilter>, notification: &Notification) -> bool {
    filter.is_none_or(|f| f.matches(notification))
}
