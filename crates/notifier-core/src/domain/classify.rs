//! Classify - 生イベントを型付きイベントに分類する
//!
//! ペイロードには判別子フィールドがないため、決められた優先順位
//! （Deployment → Node → Job）で順にデコードを試し、最初に成功したものを採用します。
//! デコード失敗は「この型ではない」という意味であり、エラーではありません。

use serde::de::DeserializeOwned;

use super::event::{Event, EventKind};
use super::resources::{Deployment, Job, Node};

/// TypedEvent は分類結果
#[derive(Debug, Clone, PartialEq)]
pub enum TypedEvent {
    Deployment(Deployment),
    Node(Node),
    Job(Job),
    Unknown,
}

impl TypedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TypedEvent::Deployment(_) => EventKind::Deployment,
            TypedEvent::Node(_) => EventKind::Node,
            TypedEvent::Job(_) => EventKind::Job,
            TypedEvent::Unknown => EventKind::Unknown,
        }
    }

    /// Job identity used by the job-name filter.
    ///
    /// Node and unknown events carry none and are never job-filtered.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            TypedEvent::Deployment(d) => Some(&d.job_id),
            TypedEvent::Job(j) => Some(&j.id),
            TypedEvent::Node(_) | TypedEvent::Unknown => None,
        }
    }

    /// Identifier of the underlying object, for log lines.
    pub fn object_id(&self) -> Option<&str> {
        match self {
            TypedEvent::Deployment(d) => Some(&d.id),
            TypedEvent::Node(n) => Some(&n.id),
            TypedEvent::Job(j) => Some(&j.id),
            TypedEvent::Unknown => None,
        }
    }
}

/// Raw event paired with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub raw: Event,
    pub typed: TypedEvent,
}

impl ClassifiedEvent {
    pub fn new(raw: Event) -> Self {
        let typed = classify(&raw);
        Self { raw, typed }
    }

    pub fn kind(&self) -> EventKind {
        self.typed.kind()
    }
}

/// 優先順位に従って分類
pub fn classify(event: &Event) -> TypedEvent {
    if let Some(deployment) = extract::<Deployment>(event, "Deployment") {
        return TypedEvent::Deployment(deployment);
    }
    if let Some(node) = extract::<Node>(event, "Node") {
        return TypedEvent::Node(node);
    }
    if let Some(job) = extract::<Job>(event, "Job") {
        return TypedEvent::Job(job);
    }
    TypedEvent::Unknown
}

fn extract<T: DeserializeOwned>(event: &Event, key: &str) -> Option<T> {
    let value = event.payload.get(key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::trace!("payload key {key} did not decode: {e}");
            None
        }
    }
}
