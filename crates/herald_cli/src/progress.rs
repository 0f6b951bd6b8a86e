//! Progress reporting for pipeline ticks.
//!
//! Stdout carries the event stream, so progress only ever goes to the log.
//! The library already logs fetch status and every failure at its own
//! level, so the reporter repeats those at `debug` only and adds the tick
//! summary.

use herald::pipeline::{ProgressCallback, TickProgress};

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the reporter as a pipeline progress callback.
    pub fn into_callback(self) -> ProgressCallback {
        Box::new(move |event| self.handle(event))
    }

    pub fn handle(&self, event: TickProgress) {
        match event {
            TickProgress::FetchingNotifications => {
                tracing::debug!("Fetching notifications");
            }

            TickProgress::FetchComplete { status, count } => {
                tracing::debug!(status, count, "Fetched notifications");
            }

            TickProgress::FetchFailed { status, error } => {
                tracing::debug!(status = ?status, error = %error, "Fetch failed");
            }

            TickProgress::Acknowledged { repository, status } => {
                tracing::debug!(repository = %repository, status, "Marked as read");
            }

            TickProgress::AcknowledgeSkipped { repository, reason } => {
                tracing::debug!(repository = %repository, reason, "Skipped mark as read");
            }

            TickProgress::AcknowledgeFailed { repository, error } => {
                tracing::debug!(repository = ?repository, error = %error, "Mark as read failed");
            }

            TickProgress::Enriched {
                notification_id,
                tag,
            } => {
                tracing::debug!(notification_id = %notification_id, tag = %tag, "Added release details");
            }

            TickProgress::EnrichmentFailed {
                notification_id,
                error,
            } => {
                tracing::debug!(notification_id = %notification_id, error = %error, "Release details unavailable");
            }

            TickProgress::Filtered {
                notification_id,
                tag,
            } => {
                tracing::debug!(notification_id = %notification_id, tag = ?tag, "Filtered by tag");
            }

            TickProgress::Emitted { notification_id } => {
                tracing::debug!(notification_id = %notification_id, "Emitted");
            }

            TickProgress::EmitFailed {
                notification_id,
                error,
            } => {
                tracing::debug!(notification_id = %notification_id, error = %error, "Emit failed");
            }

            TickProgress::TickComplete {
                fetched,
                emitted,
                filtered,
            } => {
                tracing::info!(fetched, emitted, filtered, "Tick complete");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
