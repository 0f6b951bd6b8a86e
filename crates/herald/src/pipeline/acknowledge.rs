//! Repository-scoped mark-as-read.

use std::collections::HashSet;

use crate::github::{Notification, NotificationClient, short_error_message};

/// How acknowledgement runs for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AckMode {
    Off,
    /// Would acknowledge, but the tick is a dry run.
    DryRun,
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AckOutcome {
    Acknowledged { repository: String, status: u16 },
    Skipped { repository: String, reason: &'static str },
    Failed { repository: Option<String>, error: String },
}

/// Issues one mark-as-read call per record, or per repository when deduping.
pub(crate) struct Acknowledger<'a> {
    client: &'a NotificationClient,
    mode: AckMode,
    dedupe: bool,
    seen: HashSet<String>,
}

impl<'a> Acknowledger<'a> {
    pub(crate) fn new(client: &'a NotificationClient, mode: AckMode, dedupe: bool) -> Self {
        Self {
            client,
            mode,
            dedupe,
            seen: HashSet::new(),
        }
    }

    /// Acknowledge the record's repository. `None` when acknowledgement is off.
    pub(crate) async fn acknowledge(&mut self, notification: &Notification) -> Option<AckOutcome> {
        if self.mode == AckMode::Off {
            return None;
        }

        let Some(repository) = notification.repository_full_name().map(str::to_string) else {
            return Some(AckOutcome::Failed {
                repository: None,
                error: "notification has no repository.full_name".to_string(),
            });
        };

        if self.mode == AckMode::DryRun {
            return Some(AckOutcome::Skipped {
                repository,
                reason: "dry run",
            });
        }

        if self.dedupe && !self.seen.insert(repository.clone()) {
            return Some(AckOutcome::Skipped {
                repository,
                reason: "already acknowledged this tick",
            });
        }

        let outcome = match self.client.mark_repository_read(&repository).await {
            Ok(status) => AckOutcome::Acknowledged { repository, status },
            Err(e) => AckOutcome::Failed {
                repository: Some(repository),
                error: short_error_message(&e),
            },
        };
        Some(outcome)
    }
}
