//! Progress events emitted while a tick runs.
//!
//! Hosts that want to render or log the pipeline's progress pass a
//! [`ProgressCallback`]; the pipeline never depends on one being present.

/// Progress events emitted during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TickProgress {
    /// About to request the notification list.
    FetchingNotifications,

    /// The list call succeeded.
    FetchComplete {
        /// HTTP status of the list call.
        status: u16,
        /// Number of records decoded.
        count: usize,
    },

    /// The list call failed; the tick is aborted.
    FetchFailed {
        /// HTTP status, when a response arrived.
        status: Option<u16>,
        /// Short error message.
        error: String,
    },

    /// A repository was marked as read.
    Acknowledged {
        repository: String,
        status: u16,
    },

    /// Acknowledgement was not attempted (dry run, or repository already
    /// acknowledged this tick).
    AcknowledgeSkipped {
        repository: String,
        reason: &'static str,
    },

    /// Acknowledgement failed for a record; the record is still processed.
    AcknowledgeFailed {
        /// Repository, when the record named one.
        repository: Option<String>,
        error: String,
    },

    /// Release metadata was merged into a record.
    Enriched {
        notification_id: String,
        tag: String,
    },

    /// Release metadata could not be fetched; the record stays un-enriched.
    EnrichmentFailed {
        notification_id: String,
        error: String,
    },

    /// The tag filter dropped a record.
    Filtered {
        notification_id: String,
        /// The tag the filter was evaluated against, if there was one.
        tag: Option<String>,
    },

    /// A record was handed to the sink.
    Emitted { notification_id: String },

    /// The sink rejected a record.
    EmitFailed {
        notification_id: String,
        error: String,
    },

    /// The tick finished processing every record.
    TickComplete {
        fetched: usize,
        emitted: usize,
        filtered: usize,
    },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(TickProgress) + Send + Sync>;

/// Helper to emit progress events.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: TickProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
