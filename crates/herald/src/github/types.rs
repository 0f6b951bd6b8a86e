//! Wire types for the notifications API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key holding the enriched release tag.
pub const TAG_NAME_FIELD: &str = "tagname";

/// Payload key holding the enriched release tarball URL.
pub const TARBALL_URL_FIELD: &str = "tarball_url";

/// Payload key holding the enriched release page URL.
pub const CHANGELOG_FIELD: &str = "changelog";

/// Subject type of release notifications.
pub const RELEASE_SUBJECT_TYPE: &str = "Release";

/// One notification thread, exactly as the API returned it.
///
/// The record is kept as an ordered JSON object so that every upstream field
/// passes through to the emitted event untouched, including fields this crate
/// knows nothing about. Typed accessors cover the handful of fields the
/// pipeline branches on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification(Map<String, Value>);

impl Notification {
    /// Thread id. GitHub sends it as a string; numbers are rendered as-is.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn subject_type(&self) -> Option<&str> {
        self.nested_str("subject", "type")
    }

    pub fn subject_url(&self) -> Option<&str> {
        self.nested_str("subject", "url")
    }

    pub fn subject_title(&self) -> Option<&str> {
        self.nested_str("subject", "title")
    }

    /// `owner/name` of the repository the thread belongs to.
    pub fn repository_full_name(&self) -> Option<&str> {
        self.nested_str("repository", "full_name")
    }

    pub fn is_release(&self) -> bool {
        self.subject_type() == Some(RELEASE_SUBJECT_TYPE)
    }

    /// The release tag, present only after successful enrichment.
    pub fn tag_name(&self) -> Option<&str> {
        self.0.get(TAG_NAME_FIELD).and_then(Value::as_str)
    }

    /// Merge release metadata into the record. URLs the release lacks are
    /// written as `null`.
    pub fn attach_release(&mut self, detail: &ReleaseDetail) {
        self.0.insert(
            TAG_NAME_FIELD.to_string(),
            Value::String(detail.tag_name.clone()),
        );
        self.0.insert(
            TARBALL_URL_FIELD.to_string(),
            detail.tarball_url.clone().map_or(Value::Null, Value::String),
        );
        self.0.insert(
            CHANGELOG_FIELD.to_string(),
            detail.changelog_url.clone().map_or(Value::Null, Value::String),
        );
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.0
    }

    fn nested_str(&self, outer: &str, inner: &str) -> Option<&str> {
        self.0.get(outer)?.get(inner)?.as_str()
    }
}

/// Release metadata fetched from a release notification's subject URL.
///
/// Only the tag is required; GitHub sends `null` for the tarball of some
/// releases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseDetail {
    pub tag_name: String,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default, rename = "html_url")]
    pub changelog_url: Option<String>,
}
