//! Realtime Channel Framing
//!
//! Phoenix channel messages as spoken by the hosted realtime service:
//! join a `postgres_changes` topic, keep the socket alive with heartbeats,
//! leave on dispose, and decode change notifications.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::Table;
use crate::error::{BackendError, BackendResult};
use crate::repository::{ChangeEvent, ChangeKind, Filter};

/// Heartbeat period the service expects from idle sockets
pub const HEARTBEAT_INTERVAL_MS: u32 = 30_000;

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_CHANGES: &str = "postgres_changes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl Frame {
    pub fn encode(&self) -> BackendResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> BackendResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// `ok` / `error` for replies, `None` for anything else
    pub fn reply_status(&self) -> Option<&str> {
        if self.event != EVENT_REPLY {
            return None;
        }
        self.payload.get("status").and_then(Value::as_str)
    }
}

/// One topic per table + filter pair
pub fn channel_topic(table: Table, filter: &Filter) -> String {
    format!("realtime:public:{}:{}", table, filter.to_realtime_filter())
}

pub fn join_frame(topic: &str, table: Table, filter: &Filter, access_token: Option<&str>, reference: u64) -> Frame {
    let mut payload = json!({
        "config": {
            "postgres_changes": [{
                "event": "*",
                "schema": "public",
                "table": table.name(),
                "filter": filter.to_realtime_filter(),
            }]
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = Value::String(token.to_string());
    }
    Frame {
        topic: topic.to_string(),
        event: EVENT_JOIN.to_string(),
        payload,
        reference: Some(reference.to_string()),
    }
}

pub fn heartbeat_frame(reference: u64) -> Frame {
    Frame {
        topic: "phoenix".to_string(),
        event: EVENT_HEARTBEAT.to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

pub fn leave_frame(topic: &str, reference: u64) -> Frame {
    Frame {
        topic: topic.to_string(),
        event: EVENT_LEAVE.to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: ChangeKind,
    table: String,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
}

/// The change carried by a `postgres_changes` frame; `Ok(None)` for any
/// other frame or a table this client does not know
pub fn decode_change(frame: &Frame) -> BackendResult<Option<ChangeEvent>> {
    if frame.event != EVENT_CHANGES {
        return Ok(None);
    }
    let data = frame
        .payload
        .get("data")
        .cloned()
        .ok_or_else(|| BackendError::Decode("postgres_changes frame without data".into()))?;
    let data: ChangeData = serde_json::from_value(data)?;
    let Some(table) = Table::from_name(&data.table) else {
        tracing::debug!(table = %data.table, "ignoring change on unknown table");
        return Ok(None);
    };
    // empty objects stand in for absent rows
    let present = |row: Option<Value>| row.filter(|r| r.as_object().map(|o| !o.is_empty()).unwrap_or(false));
    Ok(Some(ChangeEvent {
        kind: data.kind,
        table,
        record: present(data.record),
        old_record: present(data.old_record),
    }))
}
