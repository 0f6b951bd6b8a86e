//! Run bookkeeping shared by the pipeline and the health reporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options that change how a tick behaves without changing what it fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Fetch, enrich, filter and emit, but never mark anything as read.
    pub dry_run: bool,
}

/// Outcome of the most recent tick.
///
/// Replaced wholesale at the end of every tick. Only `last_emitted_at` carries
/// over from the previous result when a tick emits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Status of the notification list call (`None` when no response arrived).
    pub last_fetch_status: Option<u16>,
    /// Records decoded from the list response.
    pub fetched: usize,
    /// Records handed to the sink.
    pub emitted_count: usize,
    /// Records dropped by the tag filter.
    pub filtered: usize,
    /// Successful mark-as-read calls.
    pub acknowledged: usize,
    pub last_run_at: Option<DateTime<Utc>>,
    /// When an event was last emitted, by this tick or an earlier one.
    pub last_emitted_at: Option<DateTime<Utc>>,
    /// Set when the tick failed as a whole (fetch failure, sink failure).
    pub run_error: Option<String>,
    /// Per-record failures (enrichment, acknowledge). Non-fatal.
    #[serde(default)]
    pub record_errors: Vec<String>,
}

impl RunResult {
    /// Fresh bookkeeping for a tick starting at `started_at`.
    pub(crate) fn starting(started_at: DateTime<Utc>, previous: &RunResult) -> Self {
        Self {
            last_run_at: Some(started_at),
            last_emitted_at: previous.last_emitted_at,
            ..Self::default()
        }
    }

    /// True when the tick ran to completion.
    pub fn succeeded(&self) -> bool {
        self.last_run_at.is_some() && self.run_error.is_none()
    }

    /// True when no tick has run yet.
    pub fn never_ran(&self) -> bool {
        self.last_run_at.is_none()
    }
}
