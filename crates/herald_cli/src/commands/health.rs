use std::path::Path;

use chrono::{DateTime, Utc};
use console::{Term, style};
use herald::{HealthStatus, RawOptions, RunResult, assess};
use serde_json::json;

use super::shared::resolve_or_report;
use crate::config::load_state;

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "never".to_string(), |at| at.to_rfc3339())
}

fn render_text(status: &HealthStatus, result: &RunResult) -> String {
    let mut out = String::new();
    if status.healthy {
        out.push_str(&format!("{}\n", style("healthy").green().bold()));
    } else {
        out.push_str(&format!("{}\n", style("unhealthy").red().bold()));
        for reason in &status.reasons {
            out.push_str(&format!("  - {reason}\n"));
        }
    }
    out.push('\n');
    if result.never_ran() {
        out.push_str("  no run recorded yet\n");
        return out;
    }
    out.push_str(&format!("  last run:          {}\n", format_time(result.last_run_at)));
    out.push_str(&format!(
        "  last fetch status: {}\n",
        result
            .last_fetch_status
            .map_or_else(|| "none".to_string(), |s| s.to_string())
    ));
    out.push_str(&format!("  last emitted:      {}\n", format_time(result.last_emitted_at)));
    out.push_str(&format!("  record errors:     {}\n", result.record_errors.len()));
    out
}

fn render_json(status: &HealthStatus, result: &RunResult) -> serde_json::Value {
    json!({
        "healthy": status.healthy,
        "reasons": status.reasons.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "last_result": result,
    })
}

/// Report whether the last run worked and something was emitted recently.
pub(crate) fn handle_health(
    raw: &RawOptions,
    state_path: Option<&Path>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_or_report(raw)?;
    let result = match state_path {
        Some(path) => load_state(path)?.unwrap_or_default(),
        None => RunResult::default(),
    };

    let status = assess(&result, Some(config.staleness_threshold()), Utc::now());

    if json_output || !Term::stdout().is_term() {
        println!("{}", serde_json::to_string_pretty(&render_json(&status, &result))?);
    } else {
        print!("{}", render_text(&status, &result));
    }

    if status.healthy {
        Ok(())
    } else {
        Err("instance is unhealthy".into())
    }
}
