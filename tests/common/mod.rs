//! Fixtures shared by the integration tests.

use std::fs;
use std::path::PathBuf;

use serde_json::{Value, json};
use tempfile::TempDir;

/// A temporary directory of trace files.
pub struct TraceFiles {
    dir: TempDir,
}

impl TraceFiles {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Write one record per line, newline-terminated.
    pub fn write(&self, name: &str, records: &[Value]) -> PathBuf {
        let mut contents = String::new();
        for record in records {
            contents.push_str(&record.to_string());
            contents.push('\n');
        }
        self.write_raw(name, &contents)
    }

    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// A config path that does not exist, so defaults apply.
    pub fn no_config(&self) -> PathBuf {
        self.dir.path().join("absent-config.toml")
    }

    /// The client and server halves of one call, in that order.
    pub fn client_server(&self) -> (PathBuf, PathBuf) {
        (
            self.write("client.jsonl", &client_records()),
            self.write("server.jsonl", &server_records()),
        )
    }
}

fn at(time: &str) -> String {
    format!("2024-05-01T10:00:{time}Z")
}

fn client(activity: &str, kind: &str, time: &str, thread: &str) -> Value {
    json!({
        "activity_id": activity,
        "type": kind,
        "time": at(time),
        "source": "System.ServiceModel",
        "computer": "client01",
        "process": "app.exe",
        "pid": 100,
        "thread": thread,
    })
}

fn server(activity: &str, kind: &str, time: &str) -> Value {
    json!({
        "activity_id": activity,
        "type": kind,
        "time": at(time),
        "source": "System.ServiceModel",
        "computer": "server01",
        "process": "svc.exe",
        "pid": 200,
        "thread": "9",
    })
}

fn with(mut record: Value, key: &str, value: Value) -> Value {
    record[key] = value;
    record
}

/// Activity `a` opens connection `b` on another thread, which sends message `urn:uuid:1`.
pub fn client_records() -> Vec<Value> {
    vec![
        with(
            client("a", "Start", "00.000", "1"),
            "activity_name",
            json!("Process action 'Echo'"),
        ),
        with(
            client("a", "Transfer", "00.100", "1"),
            "related_activity_id",
            json!("b"),
        ),
        with(
            client("b", "Start", "00.100", "2"),
            "activity_name",
            json!("Open connection"),
        ),
        with(
            client("b", "Trace", "00.200", "2"),
            "message",
            json!({"direction": "Sent", "id": "urn:uuid:1"}),
        ),
        client("b", "Stop", "00.900", "2"),
        client("a", "Stop", "01.000", "1"),
    ]
}

/// Listener `c` receives `urn:uuid:1` and hands it to user code `d`.
pub fn server_records() -> Vec<Value> {
    vec![
        with(
            server("c", "Start", "00.300"),
            "activity_name",
            json!("Listen at 'http://server01/svc'"),
        ),
        with(
            server("c", "Trace", "00.300"),
            "message",
            json!({"direction": "Received", "id": "urn:uuid:1"}),
        ),
        with(
            server("c", "Transfer", "00.400"),
            "related_activity_id",
            json!("d"),
        ),
        with(
            server("d", "Start", "00.400"),
            "activity_name",
            json!("Execute user code"),
        ),
        server("d", "Stop", "00.500"),
        server("c", "Stop", "00.600"),
    ]
}
