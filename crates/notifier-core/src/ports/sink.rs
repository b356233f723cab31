//! Sink port - 外部の observability バックエンドへの送出
//!
//! 各 Sink は自分の transport を専有し、他の Sink の成否を知りません。
//! リトライもイベント間のバッチングもしません。

use async_trait::async_trait;

use crate::domain::{ClassifiedEvent, EventKind};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("{sink}: HTTP {status}")]
    Status { sink: &'static str, status: u16 },

    #[error("{sink}: transport error: {message}")]
    Transport { sink: &'static str, message: String },

    #[error("{sink}: failed to serialize event: {message}")]
    Serialize { sink: &'static str, message: String },

    #[error("{sink}: write failed: {source}")]
    Write {
        sink: &'static str,
        #[source]
        source: WriteError,
    },
}

impl SinkError {
    pub fn sink(&self) -> &'static str {
        match self {
            SinkError::Status { sink, .. }
            | SinkError::Transport { sink, .. }
            | SinkError::Serialize { sink, .. }
            | SinkError::Write { sink, .. } => *sink,
        }
    }
}

/// WriteError は PointWriter の flush 失敗
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Sink は 1 つの外部バックエンドへイベントを送る
#[async_trait]
pub trait Sink: Send + Sync {
    /// ログ用の名前
    fn name(&self) -> &'static str;

    /// この種類のイベントを受け付けるか
    fn accepts(&self, kind: EventKind) -> bool;

    /// 1 イベントを送出する
    async fn accept(&self, event: &ClassifiedEvent) -> Result<(), SinkError>;
}
