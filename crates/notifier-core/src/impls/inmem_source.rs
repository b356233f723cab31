//! InMemoryEventSource - 開発・テスト用のイベントソース
//!
//! # 使い方
//! - `from_items(vec![...])`: 事前に積んだ要素を流して channel を閉じる
//! - `channel(n)`: Sender を返し、テスト側から任意のタイミングで流す
//! - `failing(msg)`: `open()` が失敗するソース

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::domain::Subscription;
use crate::ports::{EventSource, SourceError, StreamItem};

pub struct InMemoryEventSource {
    receiver: Mutex<Option<mpsc::Receiver<StreamItem>>>,
    open_error: Option<String>,
    opened_with: Mutex<Vec<Subscription>>,
}

impl InMemoryEventSource {
    pub fn from_items(items: Vec<StreamItem>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // capacity == items.len() なので満杯にはならない
            let _ = tx.try_send(item);
        }
        Self::with_receiver(rx)
    }

    pub fn channel(capacity: usize) -> (mpsc::Sender<StreamItem>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::with_receiver(rx))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            receiver: Mutex::new(None),
            open_error: Some(message.into()),
            opened_with: Mutex::new(Vec::new()),
        }
    }

    fn with_receiver(rx: mpsc::Receiver<StreamItem>) -> Self {
        Self {
            receiver: Mutex::new(Some(rx)),
            open_error: None,
            opened_with: Mutex::new(Vec::new()),
        }
    }

    /// Subscriptions passed to `open()`, in call order.
    pub fn opened_with(&self) -> Vec<Subscription> {
        self.opened_with
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn open(&self, subscription: &Subscription) -> Result<mpsc::Receiver<StreamItem>, SourceError> {
        self.opened_with
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(subscription.clone());

        if let Some(message) = &self.open_error {
            return Err(SourceError::Connect(message.clone()));
        }

        self.receiver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| SourceError::Connect("in-memory source already opened".to_string()))
    }
}
