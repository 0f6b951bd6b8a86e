//! Release enrichment.

use crate::github::{Notification, NotificationClient, short_error_message};

/// What enrichment did to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Enrichment {
    /// Not a release, or enrichment is turned off. The record is untouched.
    NotApplicable,
    /// Release fields were merged in; carries the tag.
    Enriched(String),
    /// The detail call failed. The record is untouched.
    Failed(String),
}

/// Merge release metadata into a `Release` record.
///
/// Failures are reported, never propagated: one bad release must not cost the
/// rest of the tick.
pub(crate) async fn enrich_release(
    client: &NotificationClient,
    notification: &mut Notification,
    enabled: bool,
) -> Enrichment {
    if !enabled || !notification.is_release() {
        return Enrichment::NotApplicable;
    }

    let Some(url) = notification.subject_url().map(str::to_string) else {
        return Enrichment::Failed("release notification has no subject url".to_string());
    };

    match client.get_release(&url).await {
        Ok(detail) => {
            notification.attach_release(&detail);
            Enrichment::Enriched(detail.tag_name)
        }
        Err(e) => Enrichment::Failed(short_error_message(&e)),
    }
}
