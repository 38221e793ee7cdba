//! Tests for engine module

use super::*;
use crate::config::TapConfig;
use crate::http::HttpClientConfig;
use crate::output::MemorySink;
use crate::state::{State, StreamState};
use crate::types::BackoffType;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Helpers
// ============================================================================

fn client(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(1)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(5),
            Duration::from_millis(50),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn select(names: &[&str]) -> Selection {
    let names: Vec<String> = names.iter().map(ToString::to_string).collect();
    Catalog::builtin()
        .unwrap()
        .select(
            &TapConfig::new("acc", "tok").with_paid_streams(true),
            Some(names.as_slice()),
        )
        .unwrap()
}

fn engine(server: &MockServer, state: StateManager, sink: &MemorySink) -> SyncEngine {
    SyncEngine::new(client(server), Catalog::builtin().unwrap(), state, sink.clone())
}

fn page(server_path: &str, page: u32, body: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path(server_path))
        .and(query_param("page", page.to_string()))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
}

fn checks(range: std::ops::Range<usize>) -> serde_json::Value {
    json!(range
        .map(|i| json!({"id": format!("c{i}"), "name": format!("check {i}")}))
        .collect::<Vec<_>>())
}

fn kinds(sink: &MemorySink) -> Vec<String> {
    sink.messages()
        .iter()
        .map(|m| match m {
            Message::Schema { stream, .. } => format!("SCHEMA {stream}"),
            Message::Record { stream, record, .. } => {
                let id = record.get("id").or_else(|| record.get("region"));
                format!("RECORD {stream} {}", id.and_then(Value::as_str).unwrap_or("?"))
            }
            Message::State { .. } => "STATE".to_string(),
        })
        .collect()
}

// ============================================================================
// SyncConfig / SyncStats / Report Tests
// ============================================================================

#[test]
fn test_sync_config_from_tap_config() {
    let tap = TapConfig::new("a", "t")
        .with_start_date("2024-01-01T00:00:00Z")
        .with_validation(ValidationPolicy::Strict);
    let config = SyncConfig::from_tap_config(&tap).unwrap();

    assert_eq!(config.validation, ValidationPolicy::Strict);
    assert_eq!(
        config.start_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(SyncConfig::new().validation, ValidationPolicy::Lenient);
}

#[test]
fn test_sync_stats() {
    let mut stats = SyncStats::new();
    stats.add_record("checks");
    stats.add_record("checks");
    stats.add_record("locations");
    stats.add_page();

    assert_eq!(stats.records_for("checks"), 2);
    assert_eq!(stats.records_for("missing"), 0);
    assert_eq!(stats.total_records(), 3);
    assert_eq!(stats.pages_fetched, 1);
}

#[test]
fn test_stream_phase() {
    assert_eq!(StreamPhase::Fetching.to_string(), "FETCHING");
    assert_eq!(StreamPhase::Failed.to_string(), "FAILED");
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[tokio::test]
async fn test_unpaginated_stream_single_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"region": "us-east-1", "name": "N. Virginia"},
            {"region": "eu-west-1", "name": "Ireland"},
            {"region": "ap-south-1", "name": "Mumbai"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let state = StateManager::in_memory();
    let mut engine = engine(&server, state.clone(), &sink);
    let report = engine.run(select(&["locations"])).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcome("locations").unwrap().records, 3);
    assert_eq!(
        kinds(&sink),
        vec![
            "SCHEMA locations",
            "RECORD locations us-east-1",
            "RECORD locations eu-west-1",
            "RECORD locations ap-south-1",
        ]
    );
    assert!(state.snapshot().await.bookmarks.is_empty());
}

#[tokio::test]
async fn test_page_number_stream_stops_on_empty_page() {
    let server = MockServer::start().await;
    page("/checks", 1, checks(0..100)).mount(&server).await;
    page("/checks", 2, checks(100..200)).mount(&server).await;
    page("/checks", 3, checks(200..237)).mount(&server).await;
    page("/checks", 4, json!([])).mount(&server).await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine.run(select(&["checks"])).await.unwrap();

    assert_eq!(report.stats.pages_fetched, 4);
    assert_eq!(report.outcome("checks").unwrap().records, 237);
    assert_eq!(sink.records("checks").len(), 237);
    assert_eq!(sink.records("checks")[236]["id"], "c236");
}

#[tokio::test]
async fn test_cursor_stream_follows_next_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check-alerts"))
        .and(query_param("nextId", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{"id": 3, "name": "c"}],
            "nextId": null
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check-alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entries": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}],
            "nextId": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine.run(select(&["check_alerts"])).await.unwrap();

    assert_eq!(report.stats.pages_fetched, 2);
    let ids: Vec<i64> = sink
        .records("check_alerts")
        .iter()
        .filter_map(|r| r["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

// ============================================================================
// Parent / Child Tests
// ============================================================================

fn mount_results(check: &str, created_at: &str) -> [Mock; 2] {
    let results_path = format!("/check-results/{check}");
    [
        page(
            &results_path,
            1,
            json!([{"id": format!("r-{check}"), "checkId": check, "created_at": created_at}]),
        ),
        page(&results_path, 2, json!([])),
    ]
}

#[tokio::test]
async fn test_children_sync_after_each_parent_record() {
    let server = MockServer::start().await;
    page("/checks", 1, checks(1..3)).mount(&server).await;
    page("/checks", 2, json!([])).mount(&server).await;
    for mock in mount_results("c1", "2024-01-02T00:00:00Z") {
        mock.mount(&server).await;
    }
    for mock in mount_results("c2", "2024-01-05T00:00:00+00:00") {
        mock.mount(&server).await;
    }

    let sink = MemorySink::new();
    let state = StateManager::in_memory();
    let mut engine = engine(&server, state.clone(), &sink);
    let report = engine
        .run(select(&["checks", "check_results"]))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.stats.partitions_synced, 2);
    assert_eq!(
        kinds(&sink),
        vec![
            "SCHEMA checks",
            "SCHEMA check_results",
            "RECORD checks c1",
            "RECORD check_results r-c1",
            "RECORD checks c2",
            "RECORD check_results r-c2",
            "STATE",
        ]
    );

    let bookmark = state.stream_state("check_results").await.unwrap();
    assert_eq!(bookmark.replication_key.as_deref(), Some("created_at"));
    assert_eq!(
        bookmark.partitions["checkId=c1"].replication_key_value,
        Some(json!("2024-01-02T00:00:00Z"))
    );
    assert_eq!(
        bookmark.partitions["checkId=c2"].replication_key_value,
        Some(json!("2024-01-05T00:00:00Z"))
    );
    assert_eq!(sink.states().last().unwrap()["bookmarks"]["check_results"], serde_json::to_value(&bookmark).unwrap());
}

#[tokio::test]
async fn test_selected_child_pulls_parent_without_emitting_it() {
    let server = MockServer::start().await;
    page("/checks", 1, checks(1..2)).mount(&server).await;
    page("/checks", 2, json!([])).mount(&server).await;
    for mock in mount_results("c1", "2024-01-02T00:00:00Z") {
        mock.mount(&server).await;
    }

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine.run(select(&["check_results"])).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcome("check_results").unwrap().records, 1);
    assert_eq!(
        kinds(&sink),
        vec!["SCHEMA check_results", "RECORD check_results r-c1", "STATE"]
    );
}

#[tokio::test]
async fn test_child_failure_fails_only_the_child() {
    let server = MockServer::start().await;
    page("/checks", 1, checks(1..4)).mount(&server).await;
    page("/checks", 2, json!([])).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/check-results/c1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;
    for check in ["c2", "c3"] {
        for mock in mount_results(check, "2024-01-02T00:00:00Z") {
            mock.mount(&server).await;
        }
    }

    let persisted = State {
        bookmarks: [(
            "check_results".to_string(),
            StreamState {
                replication_key: Some("created_at".to_string()),
                ..Default::default()
            },
        )]
        .into_iter()
        .collect(),
    };
    let state = StateManager::from_state(persisted.clone());
    let sink = MemorySink::new();
    let mut engine = engine(&server, state.clone(), &sink);
    let report = engine
        .run(select(&["checks", "check_results"]))
        .await
        .unwrap();

    assert!(!report.is_success());
    let failed: Vec<&str> = report.failed().map(|o| o.stream.as_str()).collect();
    assert_eq!(failed, vec!["check_results"]);
    assert!(report.outcome("check_results").unwrap().error.as_ref().unwrap().contains("500"));

    let checks = report.outcome("checks").unwrap();
    assert_eq!(checks.phase, StreamPhase::Done);
    assert_eq!(checks.records, 3);
    assert_eq!(report.stats.partitions_synced, 2);
    assert_eq!(
        kinds(&sink),
        vec![
            "SCHEMA checks",
            "SCHEMA check_results",
            "RECORD checks c1",
            "RECORD checks c2",
            "RECORD check_results r-c2",
            "RECORD checks c3",
            "RECORD check_results r-c3",
        ]
    );

    // The failed stream keeps its previous bookmark
    assert!(sink.states().is_empty());
    assert_eq!(state.snapshot().await, persisted);
}

#[tokio::test]
async fn test_parent_failure_fails_its_children() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/checks"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine
        .run(select(&["checks", "check_results"]))
        .await
        .unwrap();

    let failed: Vec<&str> = report.failed().map(|o| o.stream.as_str()).collect();
    assert_eq!(failed, vec!["checks", "check_results"]);
    assert!(report
        .outcome("check_results")
        .unwrap()
        .error
        .as_ref()
        .unwrap()
        .starts_with("Stream 'checks' failed"));
}

// ============================================================================
// Incremental Tests
// ============================================================================

fn notifications() -> serde_json::Value {
    json!([
        {"id": 1, "timestamp": "2024-01-01T00:00:00Z"},
        {"id": 2, "timestamp": "2024-01-02T00:00:00+00:00"},
        {"id": 3, "timestamp": "2024-01-03T00:00:00Z"},
        {"id": 4, "timestamp": null}
    ])
}

#[tokio::test]
async fn test_incremental_resume_from_bookmark() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alert-notifications"))
        .and(query_param("page", "1"))
        .and(query_param("from", "1704153600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(notifications()))
        .expect(1)
        .mount(&server)
        .await;
    page("/alert-notifications", 2, json!([])).mount(&server).await;

    let state = StateManager::from_json(
        r#"{"bookmarks": {"alert_notifications": {"replication_key": "timestamp", "replication_key_value": "2024-01-02T00:00:00Z"}}}"#,
    )
    .unwrap();
    let sink = MemorySink::new();
    let mut engine = engine(&server, state.clone(), &sink);
    let report = engine
        .run(select(&["alert_notifications"]))
        .await
        .unwrap();

    // Records equal to the watermark are kept, older ones filtered
    let ids: Vec<i64> = sink
        .records("alert_notifications")
        .iter()
        .filter_map(|r| r["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert_eq!(report.stats.records_filtered, 1);

    let bookmark = state.stream_state("alert_notifications").await.unwrap();
    assert_eq!(
        bookmark.replication_key_value,
        Some(json!("2024-01-03T00:00:00Z"))
    );
}

#[tokio::test]
async fn test_start_date_floor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alert-notifications"))
        .and(query_param("page", "1"))
        .and(query_param("from", "1704240000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(notifications()))
        .expect(1)
        .mount(&server)
        .await;
    page("/alert-notifications", 2, json!([])).mount(&server).await;

    let sink = MemorySink::new();
    let config = SyncConfig::new().with_start_date(Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
    let mut engine = engine(&server, StateManager::in_memory(), &sink).with_config(config);
    engine.run(select(&["alert_notifications"])).await.unwrap();

    assert_eq!(sink.records("alert_notifications").len(), 2);
}

// ============================================================================
// Record Admission Tests
// ============================================================================

fn mount_locations_with_bad_records() -> Mock {
    Mock::given(method("GET"))
        .and(path("/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"region": null, "name": "nowhere"},
            {"name": "missing key"},
            {"region": "us-east-1", "name": 5},
            {"region": "eu-west-1", "name": "Ireland"},
            "not an object"
        ])))
}

#[tokio::test]
async fn test_lenient_validation_emits_invalid_records() {
    let server = MockServer::start().await;
    mount_locations_with_bad_records().mount(&server).await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine.run(select(&["locations"])).await.unwrap();

    assert_eq!(sink.records("locations").len(), 2);
    assert_eq!(report.stats.records_invalid, 1);
    assert_eq!(report.stats.records_dropped, 2);
}

#[tokio::test]
async fn test_strict_validation_drops_invalid_records() {
    let server = MockServer::start().await;
    mount_locations_with_bad_records().mount(&server).await;

    let sink = MemorySink::new();
    let config = SyncConfig::new().with_validation(ValidationPolicy::Strict);
    let mut engine = engine(&server, StateManager::in_memory(), &sink).with_config(config);
    let report = engine.run(select(&["locations"])).await.unwrap();

    let records = sink.records("locations");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["region"], "eu-west-1");
    assert_eq!(report.stats.records_dropped, 3);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_stream_does_not_stop_siblings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/runtimes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "2024.02"}])))
        .expect(1)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine
        .run(select(&["locations", "runtimes"]))
        .await
        .unwrap();

    let locations = report.outcome("locations").unwrap();
    assert_eq!(locations.phase, StreamPhase::Failed);
    assert!(locations.error.as_ref().unwrap().contains("503"));
    assert_eq!(report.outcome("runtimes").unwrap().phase, StreamPhase::Done);
    assert_eq!(sink.records("runtimes").len(), 1);
}

#[tokio::test]
async fn test_auth_failure_aborts_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/runtimes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let err = engine
        .run(select(&["locations", "runtimes"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_malformed_body_fails_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runtimes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let mut engine = engine(&server, StateManager::in_memory(), &sink);
    let report = engine.run(select(&["runtimes"])).await.unwrap();
    assert!(report.outcome("runtimes").unwrap().is_failed());
}
