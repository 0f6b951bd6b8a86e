//! Herald - GitHub notifications as an event stream.
//!
//! This library polls the authenticated user's GitHub notifications and emits
//! one event per notification, optionally marking each notification's
//! repository as read, merging release metadata into release notifications,
//! and filtering releases by tag.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use herald::{NotificationClient, Pipeline, RunConfiguration, default_options};
//! use herald::sink::JsonLinesSink;
//!
//! let mut raw = default_options();
//! raw.insert("username".into(), "octocat".into());
//! raw.insert("token".into(), token);
//! let config = RunConfiguration::resolve(&raw).map_err(|errors| ...)?;
//!
//! let client = NotificationClient::new(&config)?;
//! let mut pipeline = Pipeline::new(config, client, Arc::new(JsonLinesSink::stdout()));
//!
//! // Call on the host's schedule; never concurrently for one pipeline.
//! let result = pipeline.run_tick().await;
//! let health = pipeline.health(chrono::Utc::now());
//! ```

pub mod config;
pub mod github;
pub mod health;
pub mod http;
pub mod pipeline;
pub mod sink;

pub use config::{ConfigError, RawOptions, RunConfiguration, Secret, default_options};
pub use github::{GitHubError, Notification, NotificationClient, short_error_message};
pub use health::{HealthStatus, UnhealthyReason, assess};
pub use pipeline::{Pipeline, PipelineOptions, RunResult, TagFilter, TickProgress};
pub use sink::{EventSink, SinkError};
