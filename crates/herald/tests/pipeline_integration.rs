//! End-to-end ticks through the public API.
//!
//! A scripted transport stands in for the API so every tick is deterministic,
//! and a channel sink collects what would have gone downstream.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use herald::config::keys;
use herald::http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use herald::sink::ChannelSink;
use herald::{
    Notification, NotificationClient, Pipeline, PipelineOptions, RawOptions, RunConfiguration,
    RunResult, UnhealthyReason, default_options,
};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

const API: &str = "https://api.github.test";

/// Keep a hung tick from hanging the suite.
const TICK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    responses: HashMap<(HttpMethod, String), VecDeque<(u16, String)>>,
    requests: Vec<HttpRequest>,
}

impl ScriptedTransport {
    fn respond(&self, method: HttpMethod, url: impl Into<String>, status: u16, body: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .responses
            .entry((method, url.into()))
            .or_default()
            .push_back((status, body.into()));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    fn puts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == HttpMethod::Put)
            .map(|r| r.url)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut script = self.inner.lock().unwrap();
        let key = (request.method, request.url.clone());
        script.requests.push(request);

        let (status, body) = script
            .responses
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| HttpError::Transport(format!("connection refused: {}", key.1)))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into_bytes(),
        })
    }
}

fn raw_options(pairs: &[(&str, &str)]) -> RawOptions {
    let mut raw = default_options();
    raw.insert(keys::USERNAME.to_string(), "octocat".to_string());
    raw.insert(keys::TOKEN.to_string(), "ghp_example".to_string());
    raw.insert(keys::API_BASE.to_string(), API.to_string());
    for (key, value) in pairs {
        raw.insert(key.to_string(), value.to_string());
    }
    raw
}

fn pipeline(
    pairs: &[(&str, &str)],
    transport: &ScriptedTransport,
) -> (Pipeline, UnboundedReceiver<Notification>) {
    let config = RunConfiguration::resolve(&raw_options(pairs)).expect("config should resolve");
    let client = NotificationClient::from_config_with_transport(&config, Arc::new(transport.clone()));
    let (sink, rx) = ChannelSink::new();
    (Pipeline::new(config, client, Arc::new(sink)), rx)
}

async fn tick(pipeline: &mut Pipeline) -> RunResult {
    tokio::time::timeout(TICK_TIMEOUT, pipeline.run_tick())
        .await
        .expect("tick should finish")
        .clone()
}

fn received(rx: &mut UnboundedReceiver<Notification>) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(serde_json::to_value(&event).expect("event should encode"));
    }
    events
}

#[tokio::test]
async fn release_notification_is_acknowledged_enriched_and_emitted() {
    let transport = ScriptedTransport::default();
    let release_url = format!("{API}/repos/a/b/releases/9");
    transport.respond(
        HttpMethod::Get,
        format!("{API}/notifications"),
        200,
        json!([{
            "id": "100",
            "unread": true,
            "reason": "subscribed",
            "subject": { "title": "v3.0.0", "url": release_url, "type": "Release" },
            "repository": { "full_name": "a/b" }
        }])
        .to_string(),
    );
    transport.respond(HttpMethod::Put, format!("{API}/repos/a/b/notifications"), 205, "");
    transport.respond(
        HttpMethod::Get,
        release_url.clone(),
        200,
        json!({ "tag_name": "v3.0.0", "tarball_url": "T", "html_url": "H" }).to_string(),
    );

    let (mut pipeline, mut rx) = pipeline(&[(keys::REGEX_FILTER_TAG, "^v3\\.")], &transport);
    let result = tick(&mut pipeline).await;

    let events = received(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], "100");
    assert_eq!(events[0]["tagname"], "v3.0.0");
    assert_eq!(events[0]["tarball_url"], "T");
    assert_eq!(events[0]["changelog"], "H");
    assert_eq!(events[0]["subject"]["type"], "Release");

    assert_eq!(transport.puts(), vec![format!("{API}/repos/a/b/notifications")]);
    assert_eq!(result.last_fetch_status, Some(200));
    assert_eq!(result.emitted_count, 1);
    assert!(pipeline.health(Utc::now()).healthy);

    let auth = transport.requests()[0]
        .header("authorization")
        .map(str::to_string);
    assert_eq!(auth.as_deref(), Some("Basic b2N0b2NhdDpnaHBfZXhhbXBsZQ=="));
}

#[tokio::test]
async fn rejected_credentials_emit_nothing_and_report_unhealthy() {
    let transport = ScriptedTransport::default();
    transport.respond(
        HttpMethod::Get,
        format!("{API}/notifications"),
        401,
        r#"{"message":"Bad credentials"}"#,
    );

    let (mut pipeline, mut rx) = pipeline(&[], &transport);
    let result = tick(&mut pipeline).await;

    assert!(received(&mut rx).is_empty());
    assert!(transport.puts().is_empty());
    assert_eq!(result.last_fetch_status, Some(401));

    let health = pipeline.health(Utc::now());
    assert!(!health.healthy);
    assert!(
        health
            .reasons
            .iter()
            .any(|r| matches!(r, UnhealthyReason::RunFailed(_)))
    );
}

#[tokio::test]
async fn unreachable_api_aborts_the_tick_without_a_status() {
    let transport = ScriptedTransport::default();

    let (mut pipeline, mut rx) = pipeline(&[], &transport);
    let result = tick(&mut pipeline).await;

    assert!(received(&mut rx).is_empty());
    assert_eq!(result.last_fetch_status, None);
    assert!(
        result
            .run_error
            .as_deref()
            .is_some_and(|e| e.contains("Network error"))
    );
}

#[tokio::test]
async fn dry_run_emits_everything_but_marks_nothing_read() {
    let transport = ScriptedTransport::default();
    transport.respond(
        HttpMethod::Get,
        format!("{API}/notifications"),
        200,
        json!([
            { "id": "1", "subject": { "type": "Issue" }, "repository": { "full_name": "a/b" } },
            { "id": "2", "subject": { "type": "PullRequest" }, "repository": { "full_name": "c/d" } }
        ])
        .to_string(),
    );

    let (pipeline, mut rx) = pipeline(&[], &transport);
    let mut pipeline = pipeline.with_options(PipelineOptions { dry_run: true });
    let result = tick(&mut pipeline).await;

    let ids: Vec<_> = received(&mut rx).into_iter().map(|e| e["id"].clone()).collect();
    assert_eq!(ids, vec![json!("1"), json!("2")]);
    assert!(transport.puts().is_empty());
    assert_eq!(result.acknowledged, 0);
}

#[tokio::test]
async fn previous_result_keeps_health_across_restarts() {
    let transport = ScriptedTransport::default();
    transport.respond(HttpMethod::Get, format!("{API}/notifications"), 200, "[]");

    let previous = RunResult {
        last_fetch_status: Some(200),
        emitted_count: 1,
        last_run_at: Some(Utc::now() - chrono::Duration::hours(2)),
        last_emitted_at: Some(Utc::now() - chrono::Duration::hours(2)),
        ..RunResult::default()
    };

    let (pipeline, _rx) = pipeline(&[], &transport);
    let mut pipeline = pipeline.with_previous_result(previous.clone());
    let result = tick(&mut pipeline).await;

    assert_eq!(result.fetched, 0);
    assert_eq!(result.last_emitted_at, previous.last_emitted_at);
    assert!(pipeline.health(Utc::now()).healthy);
}

#[tokio::test]
async fn quiet_instance_goes_stale() {
    let transport = ScriptedTransport::default();
    transport.respond(HttpMethod::Get, format!("{API}/notifications"), 200, "[]");

    let (mut pipeline, _rx) = pipeline(&[(keys::EXPECTED_RECEIVE_PERIOD_IN_DAYS, "1")], &transport);
    let result = tick(&mut pipeline).await;
    assert!(result.succeeded());

    let health = pipeline.health(Utc::now());
    assert!(!health.healthy);
    assert!(matches!(
        health.reasons.as_slice(),
        [UnhealthyReason::Stale { last_emitted_at: None, .. }]
    ));
}
