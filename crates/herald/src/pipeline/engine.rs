//! The per-tick pipeline: fetch, then per record acknowledge, enrich, filter
//! and emit.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::acknowledge::{AckMode, AckOutcome, Acknowledger};
use super::enrich::{Enrichment, enrich_release};
use super::filter::should_emit;
use super::progress::{ProgressCallback, TickProgress, emit};
use super::types::{PipelineOptions, RunResult};
use crate::config::RunConfiguration;
use crate::github::{Notification, NotificationClient, short_error_message};
use crate::health::{self, HealthStatus};
use crate::sink::EventSink;

/// One configured notification poller.
///
/// The host calls [`Pipeline::run_tick`] on its schedule, never concurrently
/// for the same instance. The pipeline owns the [`RunResult`] of the last tick
/// and replaces it when a tick ends.
pub struct Pipeline {
    config: RunConfiguration,
    client: NotificationClient,
    sink: Arc<dyn EventSink>,
    options: PipelineOptions,
    on_progress: Option<ProgressCallback>,
    last_result: RunResult,
}

impl Pipeline {
    pub fn new(
        config: RunConfiguration,
        client: NotificationClient,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            client,
            sink,
            options: PipelineOptions::default(),
            on_progress: None,
            last_result: RunResult::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Resume from a result saved by an earlier process.
    #[must_use]
    pub fn with_previous_result(mut self, result: RunResult) -> Self {
        self.last_result = result;
        self
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn last_result(&self) -> &RunResult {
        &self.last_result
    }

    /// Health as of `now`, judged against the configured staleness threshold.
    pub fn health(&self, now: DateTime<Utc>) -> HealthStatus {
        health::assess(
            &self.last_result,
            Some(self.config.staleness_threshold()),
            now,
        )
    }

    /// Run one tick.
    ///
    /// Never returns an error: a failed list call aborts the tick (nothing is
    /// acknowledged or emitted) and is recorded in the returned result, and
    /// per-record failures are recorded and skipped past.
    pub async fn run_tick(&mut self) -> &RunResult {
        let mut result = RunResult::starting(Utc::now(), &self.last_result);
        let on_progress = self.on_progress.as_ref();

        emit(on_progress, TickProgress::FetchingNotifications);
        let notifications = match self.client.list_notifications().await {
            Ok(list) => {
                tracing::info!(
                    status = list.status,
                    count = list.notifications.len(),
                    "fetch notification request status"
                );
                emit(
                    on_progress,
                    TickProgress::FetchComplete {
                        status: list.status,
                        count: list.notifications.len(),
                    },
                );
                result.last_fetch_status = Some(list.status);
                list.notifications
            }
            Err(e) => {
                let error = short_error_message(&e);
                tracing::error!(status = ?e.status(), error = %e, "fetch notification request failed");
                if e.is_auth_error() {
                    tracing::warn!("credentials were rejected; check username and token");
                }
                emit(
                    on_progress,
                    TickProgress::FetchFailed {
                        status: e.status(),
                        error: error.clone(),
                    },
                );
                result.last_fetch_status = e.status();
                result.run_error = Some(format!("fetch failed: {error}"));
                self.last_result = result;
                return &self.last_result;
            }
        };
        result.fetched = notifications.len();

        let mode = match (self.config.mark_as_read, self.options.dry_run) {
            (false, _) => AckMode::Off,
            (true, true) => AckMode::DryRun,
            (true, false) => AckMode::Live,
        };
        let mut acknowledger =
            Acknowledger::new(&self.client, mode, self.config.dedupe_acknowledgements);

        for notification in notifications {
            process_record(
                &self.config,
                &self.client,
                self.sink.as_ref(),
                &mut acknowledger,
                on_progress,
                notification,
                &mut result,
            )
            .await;
        }

        emit(
            on_progress,
            TickProgress::TickComplete {
                fetched: result.fetched,
                emitted: result.emitted_count,
                filtered: result.filtered,
            },
        );

        self.last_result = result;
        &self.last_result
    }
}

async fn process_record(
    config: &RunConfiguration,
    client: &NotificationClient,
    sink: &dyn EventSink,
    acknowledger: &mut Acknowledger<'_>,
    on_progress: Option<&ProgressCallback>,
    mut notification: Notification,
    result: &mut RunResult,
) {
    let id = notification.id().unwrap_or_default();

    match acknowledger.acknowledge(&notification).await {
        None => {}
        Some(AckOutcome::Acknowledged { repository, status }) => {
            tracing::debug!(repository = %repository, status, "mark as read request status");
            result.acknowledged += 1;
            emit(on_progress, TickProgress::Acknowledged { repository, status });
        }
        Some(AckOutcome::Skipped { repository, reason }) => {
            tracing::debug!(repository = %repository, reason, "mark as read skipped");
            emit(
                on_progress,
                TickProgress::AcknowledgeSkipped { repository, reason },
            );
        }
        Some(AckOutcome::Failed { repository, error }) => {
            tracing::warn!(repository = ?repository, notification_id = %id, error = %error, "mark as read failed");
            result.record_errors.push(format!(
                "mark as read {}: {}",
                repository.as_deref().unwrap_or("<unknown repository>"),
                error
            ));
            emit(
                on_progress,
                TickProgress::AcknowledgeFailed { repository, error },
            );
        }
    }

    match enrich_release(client, &mut notification, config.add_release_details).await {
        Enrichment::NotApplicable => {}
        Enrichment::Enriched(tag) => {
            tracing::debug!(notification_id = %id, tag = %tag, "release details added");
            emit(
                on_progress,
                TickProgress::Enriched {
                    notification_id: id.clone(),
                    tag,
                },
            );
        }
        Enrichment::Failed(error) => {
            tracing::warn!(notification_id = %id, error = %error, "release details unavailable");
            result
                .record_errors
                .push(format!("release details for {id}: {error}"));
            emit(
                on_progress,
                TickProgress::EnrichmentFailed {
                    notification_id: id.clone(),
                    error,
                },
            );
        }
    }

    if !should_emit(config.tag_filter.as_ref(), &notification) {
        let tag = notification.tag_name().map(str::to_string);
        tracing::info!(notification_id = %id, tag = ?tag, "notification filtered by tag");
        result.filtered += 1;
        emit(
            on_progress,
            TickProgress::Filtered {
                notification_id: id,
                tag,
            },
        );
        return;
    }

    match sink.emit(&notification).await {
        Ok(()) => {
            result.emitted_count += 1;
            result.last_emitted_at = Some(Utc::now());
            emit(on_progress, TickProgress::Emitted { notification_id: id });
        }
        Err(e) => {
            tracing::error!(notification_id = %id, sink = sink.name(), error = %e, "failed to emit event");
            result.record_errors.push(format!("emit {id}: {e}"));
            if result.run_error.is_none() {
                result.run_error = Some(format!("{} sink: {e}", sink.name()));
            }
            emit(
                on_progress,
                TickProgress::EmitFailed {
                    notification_id: id,
                    error: e.to_string(),
                },
            );
        }
    }
}
