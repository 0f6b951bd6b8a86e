use std::path::Path;
use std::sync::Arc;

use herald::sink::JsonLinesSink;
use herald::{EventSink, NotificationClient, Pipeline, PipelineOptions, RawOptions, RunResult};

use super::shared::resolve_or_report;
use crate::config::{load_state, save_state};
use crate::progress::LoggingReporter;

/// Run one tick and write every emitted event to stdout as a JSON line.
pub(crate) async fn handle_run(
    raw: &RawOptions,
    dry_run: bool,
    state_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sink: Arc<dyn EventSink> = Arc::new(JsonLinesSink::stdout());
    let result = run_once(raw, dry_run, state_path, sink).await?;

    match result.run_error {
        Some(error) => Err(format!("run failed: {error}").into()),
        None => Ok(()),
    }
}

async fn run_once(
    raw: &RawOptions,
    dry_run: bool,
    state_path: Option<&Path>,
    sink: Arc<dyn EventSink>,
) -> Result<RunResult, Box<dyn std::error::Error>> {
    let config = resolve_or_report(raw)?;
    let client = NotificationClient::new(&config)?;

    let previous = match state_path {
        Some(path) => load_state(path)?.unwrap_or_default(),
        None => RunResult::default(),
    };

    if dry_run {
        tracing::info!("Dry run: notifications will not be marked as read");
    }

    let mut pipeline = Pipeline::new(config, client, sink)
        .with_options(PipelineOptions { dry_run })
        .with_progress(LoggingReporter::new().into_callback())
        .with_previous_result(previous);

    let result = pipeline.run_tick().await.clone();

    // A dry run leaves no trace beyond what it printed.
    if !dry_run && let Some(path) = state_path {
        save_state(path, &result)?;
        tracing::debug!("Saved run result to {:?}", path);
    }

    Ok(result)
}
