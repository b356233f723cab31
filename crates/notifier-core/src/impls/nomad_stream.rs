//! NomadEventStream - Nomad の `/v1/event/stream` を購読する EventSource
//!
//! # 実装詳細
//! - ureq（blocking）でリクエストし、改行区切り JSON を 1 行ずつデコード
//! - 読み取りは spawn_blocking 上で行い、bounded channel に流す
//! - 受信側が drop されたら次の行の送信で読み取りスレッドも終わる
//! - `idle_timeout` の間 1 行も届かなければ `SourceError::Read` を流してストリームを閉じる
//!   （Nomad は heartbeat を定期的に送るので、無音は接続断とみなす）
//! - 購読開始時の失敗（接続不可・非 2xx）は `open()` のエラー（致命的）

use async_trait::async_trait;
use std::io::{BufRead, BufReader, Read};
use std::time::Duration;
use tokio::sync::mpsc;
use ureq::Agent;

use crate::domain::{Envelope, Subscription};
use crate::ports::{EventSource, SourceError, StreamItem};

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Nomad の heartbeat 間隔（10 秒）より十分長く取る
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct NomadConfig {
    pub address: String,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub channel_capacity: usize,
    pub idle_timeout: Duration,
}

impl Default for NomadConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            namespace: None,
            channel_capacity: 64,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

pub struct NomadEventStream {
    config: NomadConfig,
    agent: Agent,
}

impl NomadEventStream {
    pub fn new(config: NomadConfig) -> Self {
        // ストリームは長時間開きっぱなしなので全体タイムアウトは付けない
        let agent_config = Agent::config_builder()
            .timeout_connect(Some(CONNECT_TIMEOUT))
            .http_status_as_error(false)
            .build();
        Self {
            config,
            agent: Agent::new_with_config(agent_config),
        }
    }

    fn stream_url(&self) -> String {
        format!("{}/v1/event/stream", self.config.address.trim_end_matches('/'))
    }

    /// Query parameters for a subscription: one `topic=<Topic>:<selector>` per
    /// topic, the start `index`, and the namespace when set.
    pub fn query_pairs(&self, subscription: &Subscription) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (topic, selectors) in subscription.topics.subscription_map() {
            for selector in selectors {
                pairs.push(("topic".to_string(), format!("{topic}:{selector}")));
            }
        }
        pairs.push(("index".to_string(), subscription.start_index.to_string()));
        if let Some(ns) = &self.config.namespace {
            pairs.push(("namespace".to_string(), ns.clone()));
        }
        pairs
    }
}

#[async_trait]
impl EventSource for NomadEventStream {
    async fn open(&self, subscription: &Subscription) -> Result<mpsc::Receiver<StreamItem>, SourceError> {
        let agent = self.agent.clone();
        let url = self.stream_url();
        let pairs = self.query_pairs(subscription);
        let token = self.config.token.clone();

        log::info!(
            "opening event stream at {url} (topics={:?}, index={})",
            subscription.topics.names().collect::<Vec<_>>(),
            subscription.start_index
        );

        let reader = tokio::task::spawn_blocking(move || {
            let mut request = agent.get(&url);
            for (k, v) in &pairs {
                request = request.query(k, v);
            }
            if let Some(token) = &token {
                request = request.header("X-Nomad-Token", token.as_str());
            }

            let mut response = request
                .call()
                .map_err(|e| SourceError::Connect(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.body_mut().read_to_string().unwrap_or_default();
                return Err(SourceError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(response.into_body().into_reader())
        })
        .await
        .map_err(|e| SourceError::Connect(format!("stream open task failed: {e}")))??;

        let capacity = self.config.channel_capacity.max(1);
        let (line_tx, line_rx) = mpsc::channel(capacity);
        let (tx, rx) = mpsc::channel(capacity);
        tokio::task::spawn_blocking(move || pump(reader, line_tx));
        tokio::spawn(forward_until_idle(line_rx, tx, self.config.idle_timeout));
        Ok(rx)
    }
}

async fn forward_until_idle(
    mut lines: mpsc::Receiver<StreamItem>,
    tx: mpsc::Sender<StreamItem>,
    idle: Duration,
) {
    loop {
        match tokio::time::timeout(idle, lines.recv()).await {
            Ok(Some(item)) => {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(_) => {
                log::warn!("no data from event stream for {idle:?}, closing it");
                let _ = tx
                    .send(Err(SourceError::Read(format!("no data received for {idle:?}"))))
                    .await;
                return;
            }
        }
    }
}

fn pump(reader: impl Read, tx: mpsc::Sender<StreamItem>) {
    for line in BufReader::new(reader).lines() {
        let item = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => decode_line(&line),
            Err(e) => {
                let _ = tx.blocking_send(Err(SourceError::Read(e.to_string())));
                return;
            }
        };
        if tx.blocking_send(item).is_err() {
            log::debug!("event stream receiver dropped, stopping reader");
            return;
        }
    }
    log::debug!("event stream reached EOF");
}

/// 1 行を Envelope にデコード
pub fn decode_line(line: &str) -> StreamItem {
    serde_json::from_str::<Envelope>(line).map_err(|e| SourceError::Decode(e.to_string()))
}
