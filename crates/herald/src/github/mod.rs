//! GitHub notifications API.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for API operations
//! - [`types`] - Notification records and release metadata
//! - [`client`] - The authenticated client (list, release detail, mark read)

mod client;
mod error;
mod types;

pub use client::{NotificationClient, NotificationList};
pub use error::{GitHubError, short_error_message};
pub use types::{
    CHANGELOG_FIELD, Notification, RELEASE_SUBJECT_TYPE, ReleaseDetail, TAG_NAME_FIELD,
    TARBALL_URL_FIELD,
};
