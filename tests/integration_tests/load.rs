//! Loading real files through the public library API.

use std::path::PathBuf;
use std::time::Duration;

use e2etrace::activity::{ActivityType, Relationship, Scope};
use e2etrace::config::TraceConfig;
use e2etrace::loader::{CancellationToken, LoadState, Loader};
use e2etrace::trace::{ActivityId, TraceEventType};
use e2etrace::{TraceDataSource, TraceError};
use serde_json::json;

use crate::common::{TraceFiles, client_records};

fn load(paths: &[PathBuf]) -> TraceDataSource {
    Loader::default().load(paths).unwrap().source
}

fn sequence(source: &TraceDataSource) -> Vec<(String, TraceEventType)> {
    source
        .graph()
        .records()
        .iter()
        .map(|r| (r.activity_id.as_str().to_string(), r.event_type))
        .collect()
}

#[test]
fn test_records_merge_across_files() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let source = load(&[server, client]);

    use TraceEventType::*;
    let expected: Vec<(String, TraceEventType)> = [
        ("a", Start),
        ("b", Start),
        ("a", Transfer),
        ("b", Trace),
        ("c", Start),
        ("c", Trace),
        ("d", Start),
        ("c", Transfer),
        ("d", Stop),
        ("c", Stop),
        ("b", Stop),
        ("a", Stop),
    ]
    .into_iter()
    .map(|(id, kind)| (id.to_string(), kind))
    .collect();
    assert_eq!(sequence(&source), expected);

    let times: Vec<_> = source.graph().records().iter().map(|r| r.time).collect();
    assert!(times.is_sorted());
}

#[test]
fn test_file_order_does_not_matter() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let forward = load(&[client.clone(), server.clone()]);
    let backward = load(&[server, client]);

    assert_eq!(sequence(&forward), sequence(&backward));
    let labels = |source: &TraceDataSource| -> Vec<String> {
        source
            .get_execution_columns()
            .executions()
            .map(|e| e.label())
            .collect()
    };
    assert_eq!(labels(&forward), labels(&backward));
    assert_eq!(
        labels(&forward),
        ["client01/app.exe:100", "server01/svc.exe:200"]
    );
}

#[test]
fn test_hierarchy_and_classification() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let source = load(&[client, server]);

    let id = ActivityId::normalize;
    let scope = Scope::unscoped();
    assert_eq!(
        source.get_direct_relationship(&id("a"), &id("b"), &scope),
        Relationship::Parent
    );
    assert_eq!(
        source.get_direct_relationship(&id("d"), &id("c"), &scope),
        Relationship::Child
    );
    assert_eq!(
        source.get_direct_relationship(&id("a"), &id("c"), &scope),
        Relationship::None
    );

    let kind = |name: &str| source.get_activity(&id(name)).unwrap().activity_type();
    assert_eq!(kind("a"), ActivityType::Message);
    assert_eq!(kind("b"), ActivityType::Connection);
    assert_eq!(kind("c"), ActivityType::Listen);
    assert_eq!(kind("d"), ActivityType::UserCodeExecution);

    for (_, activity) in source.graph().activities() {
        assert!(activity.start_time() <= activity.end_time());
    }
    assert!(source.graph().inconsistencies().is_empty());
}

#[test]
fn test_message_exchange_spans_executions() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let source = load(&[client, server]);

    let correlation = source.correlate_message_exchanges(&source.trace_ids());
    assert_eq!(correlation.exchanges.len(), 1);
    let exchange = &correlation.exchanges[0];
    assert_eq!(exchange.correlation_id, "urn:uuid:1");
    assert_eq!(exchange.sent.column, Some(0));
    assert_eq!(exchange.received.column, Some(1));

    let layout = source.layout();
    let sent = layout.cell(layout.cell_ref(exchange.sent.trace).unwrap());
    assert_eq!(
        sent.unwrap().related_cell(),
        layout.cell_ref(exchange.received.trace)
    );
}

#[test]
fn test_thread_mode_splits_columns() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let config = TraceConfig {
        thread_mode: true,
        ..TraceConfig::default()
    };
    let source = Loader::new(config).load(&[client, server]).unwrap().source;

    let columns = source.get_execution_columns();
    assert_eq!(columns.len(), 3);
    assert_eq!(
        columns.execution(1).map(|e| e.label()).as_deref(),
        Some("client01/app.exe:100#2")
    );

    // `b` runs on thread 2 only, so thread 1 sees no relationship with it.
    let thread_one = columns.execution(0).unwrap().clone();
    let id = ActivityId::normalize;
    let same_thread = Scope::execution(thread_one.clone());
    assert_eq!(
        source.get_direct_relationship(&id("a"), &id("b"), &same_thread),
        Relationship::None
    );
    assert_eq!(
        source.get_direct_relationship(
            &id("a"),
            &id("b"),
            &Scope::execution(thread_one).allow_cross_thread(true)
        ),
        Relationship::Parent
    );
}

#[test]
fn test_malformed_lines_are_skipped() {
    let files = TraceFiles::new();
    let mut contents = String::from("{not json}\n\n");
    for record in client_records() {
        contents.push_str(&record.to_string());
        contents.push('\n');
    }
    let path = files.write_raw("noisy.jsonl", &contents);

    let outcome = Loader::default().load(&[path]).unwrap();
    assert_eq!(outcome.stats.records, 6);
    assert_eq!(outcome.stats.skipped, 1);
    assert_eq!(outcome.source.record_count(), 6);
}

#[test]
fn test_directory_is_not_a_trace_file() {
    let files = TraceFiles::new();
    let err = Loader::default().load(&[files.dir()]).unwrap_err();
    assert!(matches!(err, TraceError::InvalidFile { .. }), "{err:?}");
}

#[test]
fn test_cancelled_load_reports_state() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let token = CancellationToken::new();
    token.cancel();

    let mut loader = Loader::default();
    let outcome = loader.load_with_token(&[client, server], token).unwrap();
    assert_eq!(outcome.state, LoadState::Cancelled);
    assert_eq!(loader.state(), LoadState::Cancelled);
}

#[test]
fn test_cancel_during_load_keeps_partial_source() {
    const TOTAL: usize = 100_000;
    let files = TraceFiles::new();
    let mut contents = String::new();
    for i in 0..TOTAL {
        let mut record = client_records()[0].clone();
        record["activity_id"] = json!(format!("a{i}"));
        contents.push_str(&record.to_string());
        contents.push('\n');
    }
    let path = files.write_raw("large.jsonl", &contents);

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(5));
            token.cancel();
        })
    };
    let mut loader = Loader::default();
    let outcome = loader.load_with_token(&[path], token).unwrap();
    canceller.join().unwrap();

    assert_eq!(outcome.state, LoadState::Cancelled);
    assert!(outcome.stats.cancelled);
    assert!(outcome.stats.records < TOTAL, "{:?}", outcome.stats);
    assert_eq!(outcome.source.record_count(), outcome.stats.records);
    assert_eq!(loader.state(), LoadState::Cancelled);
}

#[test]
fn test_shared_source_after_load() {
    let files = TraceFiles::new();
    let (client, _) = files.client_server();
    let shared = load(&[client]).into_shared();

    let reader = std::sync::Arc::clone(&shared);
    let count = std::thread::spawn(move || reader.lock().unwrap().record_count())
        .join()
        .unwrap();
    assert_eq!(count, 6);
}
