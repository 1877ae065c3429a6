use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::diff_json;

pub enum MessageLogMode {
    Full,
    Diffed,
}

/// Appends every request and reply exchanged with the device to an NDJSON file.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_replies: HashMap<String, Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            mode,
            file,
            previous_replies: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, uri: &str, body: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "uri": uri,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_failure(&mut self, uri: &str, error: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "err",
            "uri": uri,
            "error": error,
        });
        self.write_line(&entry);
    }

    /// Diffed mode writes the first reply of each kind in full, and only the
    /// changed keys for later replies of the same kind.
    pub fn log_reply(&mut self, kind: &str, body: &Value) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "reply",
                    "kind": kind,
                    "body": body,
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => {
                let entry = match self.previous_replies.get(kind) {
                    None => json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "reply",
                        "kind": kind,
                        "full": true,
                        "body": body,
                    }),
                    Some(prev) => {
                        let mut changes = Vec::new();
                        diff_json(prev, body, "", &mut changes);

                        let change_entries: Vec<Value> = changes
                            .iter()
                            .map(|(path, old, new)| {
                                json!({ "path": path, "old": old, "new": new })
                            })
                            .collect();

                        json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "reply",
                            "kind": kind,
                            "changes": change_entries,
                        })
                    }
                };
                self.write_line(&entry);
                self.previous_replies.insert(kind.to_string(), body.clone());
            }
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
