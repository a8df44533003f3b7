//! Pairing "message sent" with "message received" records.

use indexmap::IndexMap;

use super::columns::ExecutionColumns;
use crate::activity::{ActivityGraph, ActivityIdx};
use crate::trace::{MessageDirection, TraceId};

/// One side of a message exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeEnd {
    pub trace: TraceId,
    /// Execution column of the record, when its execution has been observed.
    pub column: Option<usize>,
    pub activity: ActivityIdx,
}

/// A matched sent/received pair plus every other record sharing its
/// correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageExchangeCellItem {
    pub correlation_id: String,
    pub sent: ExchangeEnd,
    pub received: ExchangeEnd,
    pub related: Vec<TraceId>,
}

/// Result of [`correlate_message_exchanges`].
///
/// Unmatched records are normal: a trace set often covers only one side of a
/// conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeCorrelation {
    pub exchanges: Vec<MessageExchangeCellItem>,
    pub unmatched_sent: Vec<TraceId>,
    pub unmatched_received: Vec<TraceId>,
}

/// Pair message records by correlation id.
///
/// For each id, in order of first appearance in `traces`, the first sent and
/// first received record form the exchange; all other records with that id
/// go to `related`. Records without message information or without any
/// correlation id are ignored.
pub fn correlate_message_exchanges(
    graph: &ActivityGraph,
    columns: &ExecutionColumns,
    traces: &[TraceId],
) -> ExchangeCorrelation {
    let mut groups: IndexMap<&str, Vec<(TraceId, MessageDirection)>> = IndexMap::new();
    for &trace in traces {
        let Some(record) = graph.record(trace) else {
            continue;
        };
        let Some(message) = &record.message else {
            continue;
        };
        let Some(id) = message.correlation_id() else {
            log::debug!("Message record {trace} has no correlation id");
            continue;
        };
        groups.entry(id).or_default().push((trace, message.direction));
    }

    let end = |trace: TraceId| -> Option<ExchangeEnd> {
        let record = graph.record(trace)?;
        Some(ExchangeEnd {
            trace,
            column: columns.column_of(&record.execution),
            activity: graph.index_of(&record.activity_id)?,
        })
    };
    let first = |members: &[(TraceId, MessageDirection)], direction: MessageDirection| {
        members
            .iter()
            .find(|(_, d)| *d == direction)
            .map(|&(trace, _)| trace)
    };
    let all = |members: &[(TraceId, MessageDirection)], direction: MessageDirection| {
        members
            .iter()
            .filter(move |(_, d)| *d == direction)
            .map(|&(trace, _)| trace)
            .collect::<Vec<_>>()
    };

    let mut result = ExchangeCorrelation::default();
    for (id, members) in &groups {
        let sent = first(members.as_slice(), MessageDirection::Sent);
        let received = first(members.as_slice(), MessageDirection::Received);
        match (sent.and_then(end), received.and_then(end)) {
            (Some(sent), Some(received)) => {
                let related = members
                    .iter()
                    .map(|&(trace, _)| trace)
                    .filter(|&trace| trace != sent.trace && trace != received.trace)
                    .collect();
                result.exchanges.push(MessageExchangeCellItem {
                    correlation_id: (*id).to_string(),
                    sent,
                    received,
                    related,
                });
            }
            _ => {
                result
                    .unmatched_sent
                    .extend(all(members.as_slice(), MessageDirection::Sent));
                result
                    .unmatched_received
                    .extend(all(members.as_slice(), MessageDirection::Received));
            }
        }
    }

    log::debug!(
        "Correlated {} message exchanges ({} sent and {} received unmatched)",
        result.exchanges.len(),
        result.unmatched_sent.len(),
        result.unmatched_received.len()
    );
    result
}
