//! Text views of a loaded trace.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::activity::{Activity, ActivityGraph, ActivityIdx};
use crate::layout::{ExchangeCorrelation, ExchangeEnd, Layout};
use crate::source::TraceDataSource;
use crate::trace::TraceId;

/// Activity hierarchy, roots first, then anything only reachable through a
/// transfer cycle. Ends with the inconsistencies found while loading.
pub fn render_tree(source: &TraceDataSource) -> String {
    let graph = source.graph();
    let mut out = String::new();
    section(&mut out, "ACTIVITY TREE");

    let mut visited = HashSet::new();
    for root in graph.roots() {
        render_subtree(&mut out, graph, root, &mut visited);
    }
    for (idx, _) in graph.activities() {
        render_subtree(&mut out, graph, idx, &mut visited);
    }

    if !graph.inconsistencies().is_empty() {
        section(&mut out, "INCONSISTENCIES");
        for inconsistency in graph.inconsistencies() {
            writeln!(out, "  {inconsistency}").unwrap();
        }
    }
    out
}

/// Deeper levels keep this indent and show their depth instead.
const MAX_INDENT_DEPTH: usize = 32;

fn render_subtree(
    out: &mut String,
    graph: &ActivityGraph,
    root: ActivityIdx,
    visited: &mut HashSet<ActivityIdx>,
) {
    let mut stack = vec![(root, 0usize)];
    while let Some((idx, depth)) = stack.pop() {
        if !visited.insert(idx) {
            continue;
        }
        let activity = graph.activity(idx);
        let duration = activity
            .duration()
            .map(|d| format!(", {}ms", d.num_milliseconds()))
            .unwrap_or_default();
        let marker = if depth > MAX_INDENT_DEPTH {
            format!("({depth}) ")
        } else {
            String::new()
        };
        writeln!(
            out,
            "{:indent$}{marker}{} [{}] {} records{duration}",
            "",
            label(activity),
            activity.activity_type(),
            activity.records().len(),
            indent = depth.min(MAX_INDENT_DEPTH) * 2
        )
        .unwrap();
        // Reversed so the first child is printed first.
        for &child in activity.children().iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}

/// Execution columns with the activities placed in each.
pub fn render_columns(source: &TraceDataSource, layout: &Layout) -> String {
    let graph = source.graph();
    let mut out = String::new();
    section(&mut out, "EXECUTION COLUMNS");

    for (column, execution) in source.get_execution_columns().executions().enumerate() {
        writeln!(out, "[{column}] {}", execution.label()).unwrap();
        for item in layout.column(column) {
            let paired = item
                .paired_activity_index()
                .map(|parent| format!(", parent at {parent}"))
                .unwrap_or_default();
            writeln!(
                out,
                "  {}  {}  {} cells{paired}",
                item.index(),
                truncate(label(graph.activity(item.activity())), 40),
                item.len()
            )
            .unwrap();
        }
    }

    writeln!(out, "\n{} rows", layout.rows().len()).unwrap();
    out
}

/// Matched message exchanges, then the records left without a counterpart.
pub fn render_exchanges(source: &TraceDataSource, correlation: &ExchangeCorrelation) -> String {
    let mut out = String::new();
    section(&mut out, "MESSAGE EXCHANGES");
    if correlation.exchanges.is_empty() {
        out.push_str("  (none)\n");
    }
    for exchange in &correlation.exchanges {
        writeln!(
            out,
            "{}  {} -> {}  ({} related)",
            exchange.correlation_id,
            end(source, &exchange.sent),
            end(source, &exchange.received),
            exchange.related.len()
        )
        .unwrap();
    }

    for (title, traces) in [
        ("UNMATCHED SENT", &correlation.unmatched_sent),
        ("UNMATCHED RECEIVED", &correlation.unmatched_received),
    ] {
        section(&mut out, title);
        if traces.is_empty() {
            out.push_str("  (none)\n");
        }
        for &trace in traces {
            writeln!(out, "  {trace} {}", correlation_id(source, trace)).unwrap();
        }
    }
    out
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    writeln!(out, "{title}\n{}", "-".repeat(title.len())).unwrap();
}

fn label(activity: &Activity) -> &str {
    activity.name().unwrap_or(activity.id().as_str())
}

fn end(source: &TraceDataSource, side: &ExchangeEnd) -> String {
    let execution = side
        .column
        .and_then(|column| source.get_execution_columns().execution(column))
        .map(|execution| execution.label())
        .unwrap_or_else(|| "?".to_string());
    format!("{} {execution}", side.trace)
}

fn correlation_id(source: &TraceDataSource, trace: TraceId) -> &str {
    source
        .get_record(trace)
        .and_then(|record| record.message.as_ref())
        .and_then(|message| message.correlation_id())
        .unwrap_or("")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
