//! Event / Envelope - event stream のワイヤーフォーマット
//!
//! Nomad の `/v1/event/stream` は 1 行 1 JSON で以下のどちらかを返します。
//! - `{}`: heartbeat（イベントなし）
//! - `{"Index": 10, "Events": [...]}`: イベントのバッチ
//!
//! ここではペイロードを解釈せず、受け取った形のまま保持します。
//! 型付きの解釈は `classify` が担当します。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// One event as delivered by the orchestrator.
///
/// Field names follow the wire format so that re-serializing yields the same
/// shape the log sink is expected to forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Event {
    pub topic: String,
    #[serde(rename = "Type")]
    pub event_type: String,
    pub key: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_keys: Option<Vec<String>>,
    pub index: u64,
    pub payload: Map<String, Value>,
}

impl Event {
    /// Convenience constructor used by sources and tests.
    pub fn new(topic: impl Into<String>, event_type: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            topic: topic.into(),
            event_type: event_type.into(),
            payload,
            ..Self::default()
        }
    }
}

/// Envelope はストリームから受信する 1 単位
///
/// `events` が空なら heartbeat。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Envelope {
    pub index: u64,
    pub events: Vec<Event>,
}

impl Envelope {
    pub fn heartbeat() -> Self {
        Self::default()
    }

    pub fn batch(index: u64, events: Vec<Event>) -> Self {
        Self { index, events }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.events.is_empty()
    }
}

/// EventKind はイベントの分類タグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Deployment,
    Node,
    Job,
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Deployment => "deployment",
            EventKind::Node => "node",
            EventKind::Job => "job",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind counters keyed by `EventKind`.
pub type KindCounts = BTreeMap<EventKind, u64>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_is_heartbeat() {
        let env: Envelope = serde_json::from_str("{}").unwrap();
        assert!(env.is_heartbeat());
        assert_eq!(env.index, 0);
    }

    #[test]
    fn decodes_event_batch() {
        let line = json!({
            "Index": 17,
            "Events": [{
                "Topic": "Deployment",
                "Type": "DeploymentStatusUpdate",
                "Key": "d-1",
                "Namespace": "default",
                "FilterKeys": ["web"],
                "Index": 17,
                "Payload": { "Deployment": { "ID": "d-1" } }
            }]
        });
        let env: Envelope = serde_json::from_value(line).unwrap();
        assert!(!env.is_heartbeat());
        assert_eq!(env.index, 17);

        let event = &env.events[0];
        assert_eq!(event.topic, "Deployment");
        assert_eq!(event.event_type, "DeploymentStatusUpdate");
        assert_eq!(event.filter_keys.as_deref(), Some(&["web".to_string()][..]));
        assert!(event.payload.contains_key("Deployment"));
    }

    #[test]
    fn event_serializes_in_wire_shape() {
        let event = Event::new("Node", "NodeRegistration", json!({ "Node": { "ID": "n-1" } }));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["Topic"], "Node");
        assert_eq!(value["Type"], "NodeRegistration");
        assert_eq!(value["Payload"]["Node"]["ID"], "n-1");
        assert!(value.get("FilterKeys").is_none());
    }
}
