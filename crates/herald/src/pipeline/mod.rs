//! The notification pipeline.
//!
//! One [`Pipeline`] per configured instance. Each tick fetches the
//! authenticated user's notifications and, record by record in fetch order,
//! marks the record's repository as read, merges release metadata into
//! release records, applies the tag filter, and emits what survives.
//!
//! # Module Structure
//!
//! - [`types`] - `PipelineOptions` and the per-tick `RunResult`
//! - [`progress`] - Progress reporting: `TickProgress`, `ProgressCallback`, `emit()`
//! - [`filter`] - The tag filter
//! - `acknowledge` / `enrich` - The per-record stages
//! - [`engine`] - `Pipeline` and the tick itself
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use herald::config::RunConfiguration;
//! use herald::github::NotificationClient;
//! use herald::pipeline::Pipeline;
//! use herald::sink::JsonLinesSink;
//!
//! let config = RunConfiguration::resolve(&raw).map_err(|errors| ...)?;
//! let client = NotificationClient::new(&config)?;
//! let mut pipeline = Pipeline::new(config, client, Arc::new(JsonLinesSink::stdout()));
//! let result = pipeline.run_tick().await;
//! println!("emitted {} events", result.emitted_count);
//! ```

mod acknowledge;
pub mod engine;
mod enrich;
pub mod filter;
pub mod progress;
pub mod types;

pub use engine::Pipeline;
pub use filter::{TagFilter, should_emit};
pub use progress::{ProgressCallback, TickProgress, emit};
pub use types::{PipelineOptions, RunResult};
