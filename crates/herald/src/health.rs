//! Health reporting.
//!
//! An instance is working when its most recent tick did not fail and it has
//! emitted an event within the staleness threshold.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::pipeline::RunResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnhealthyReason {
    /// The most recent tick failed as a whole.
    RunFailed(String),
    /// Nothing has been emitted within the threshold (or ever).
    Stale {
        last_emitted_at: Option<DateTime<Utc>>,
        threshold: Duration,
    },
}

impl fmt::Display for UnhealthyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnhealthyReason::RunFailed(error) => write!(f, "last run failed: {error}"),
            UnhealthyReason::Stale {
                last_emitted_at: Some(at),
                threshold,
            } => write!(
                f,
                "no event emitted since {} (threshold {} days)",
                at.to_rfc3339(),
                threshold.num_days()
            ),
            UnhealthyReason::Stale {
                last_emitted_at: None,
                threshold,
            } => write!(
                f,
                "no event emitted yet (threshold {} days)",
                threshold.num_days()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub reasons: Vec<UnhealthyReason>,
}

/// Derive health from the last run.
///
/// Per-record enrichment and acknowledge failures are deliberately ignored;
/// only whole-run failures and staleness count. Pass `None` as `staleness` to
/// skip the staleness check.
pub fn assess(result: &RunResult, staleness: Option<Duration>, now: DateTime<Utc>) -> HealthStatus {
    let mut reasons = Vec::new();

    if let Some(error) = &result.run_error {
        reasons.push(UnhealthyReason::RunFailed(error.clone()));
    }

    if let Some(threshold) = staleness {
        let fresh = result
            .last_emitted_at
            .is_some_and(|at| now.signed_duration_since(at) < threshold);
        if !fresh {
            reasons.push(UnhealthyReason::Stale {
                last_emitted_at: result.last_emitted_at,
                threshold,
            });
        }
    }

    HealthStatus {
        healthy: reasons.is_empty(),
        reasons,
    }
}
