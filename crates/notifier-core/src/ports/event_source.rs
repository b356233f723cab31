//! EventSource port - オーケストレーターのイベントストリーム
//!
//! `open()` が成功すると、Envelope（またはストリームレベルのエラー）が
//! 順番に流れてくる channel を返します。channel が閉じたらストリーム終了です。

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{Envelope, Subscription};

/// ストリームから受信する 1 要素
pub type StreamItem = Result<Envelope, SourceError>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 購読を開けなかった（接続不可、認証エラーなど）
    #[error("failed to open event stream: {0}")]
    Connect(String),

    /// 購読開始時に非 2xx が返った
    #[error("event stream rejected subscription: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// 1 行分のデコードに失敗
    #[error("failed to decode stream item: {0}")]
    Decode(String),

    /// 受信中の I/O エラー
    #[error("event stream read error: {0}")]
    Read(String),
}

/// EventSource は購読を開いて受信 channel を返す
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn open(&self, subscription: &Subscription) -> Result<mpsc::Receiver<StreamItem>, SourceError>;
}
