//! SplunkSink - Splunk HTTP Event Collector (HEC) への Sink
//!
//! 生イベントを HEC のエンベロープで包んで JSON で POST します。
//! - `Authorization: Splunk <token>`
//! - 固定のリクエストタイムアウト
//! - 2xx 以外は失敗、ネットワークエラーも失敗
//!
//! # 証明書検証
//! デフォルトで検証します。`insecure_skip_verify` を明示的に立てた場合のみ無効化します
//! （検証用・社内向け環境のみ）。

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use ureq::Agent;
use ureq::tls::TlsConfig;

use crate::domain::{ClassifiedEvent, Event, EventKind};
use crate::ports::{Clock, Sink, SinkError, SystemClock};

pub const SPLUNK_SINK: &str = "splunk";

pub const HEC_HOST: &str = "nomad-client";
pub const HEC_SOURCE: &str = "nomad-deploy-notifier";
pub const HEC_SOURCETYPE: &str = "_json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SplunkConfig {
    pub endpoint: String,
    pub token: String,
    /// Trust any server certificate. Only for trial/internal collectors.
    pub insecure_skip_verify: bool,
    pub timeout: Duration,
}

impl SplunkConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            insecure_skip_verify: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// HEC エンベロープ
#[derive(Debug, Serialize)]
struct HecEvent<'a> {
    time: String,
    host: &'a str,
    source: &'a str,
    sourcetype: &'a str,
    event: &'a Event,
}

pub struct SplunkSink<C = SystemClock> {
    config: SplunkConfig,
    agent: Agent,
    clock: C,
}

impl SplunkSink {
    pub fn new(config: SplunkConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SplunkSink<C> {
    pub fn with_clock(config: SplunkConfig, clock: C) -> Self {
        let mut builder = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false);
        if config.insecure_skip_verify {
            log::warn!("splunk: TLS certificate verification is DISABLED for {}", config.endpoint);
            builder = builder.tls_config(TlsConfig::builder().disable_verification(true).build());
        }
        Self {
            agent: Agent::new_with_config(builder.build()),
            config,
            clock,
        }
    }

    fn payload(&self, event: &Event) -> Result<String, SinkError> {
        let hec = HecEvent {
            time: self.clock.now().timestamp().to_string(),
            host: HEC_HOST,
            source: HEC_SOURCE,
            sourcetype: HEC_SOURCETYPE,
            event,
        };
        serde_json::to_string(&hec).map_err(|e| SinkError::Serialize {
            sink: SPLUNK_SINK,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl<C: Clock> Sink for SplunkSink<C> {
    fn name(&self) -> &'static str {
        SPLUNK_SINK
    }

    fn accepts(&self, _kind: EventKind) -> bool {
        true
    }

    async fn accept(&self, event: &ClassifiedEvent) -> Result<(), SinkError> {
        let body = self.payload(&event.raw)?;
        let agent = self.agent.clone();
        let endpoint = self.config.endpoint.clone();
        let authorization = format!("Splunk {}", self.config.token);

        let status = tokio::task::spawn_blocking(move || {
            agent
                .post(&endpoint)
                .header("Authorization", authorization)
                .header("Content-Type", "application/json")
                .send(body)
                .map(|response| response.status())
        })
        .await
        .map_err(|e| SinkError::Transport {
            sink: SPLUNK_SINK,
            message: format!("send task failed: {e}"),
        })?
        .map_err(|e| SinkError::Transport {
            sink: SPLUNK_SINK,
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(SinkError::Status {
                sink: SPLUNK_SINK,
                status: status.as_u16(),
            });
        }

        match event.typed.object_id() {
            Some(id) => log::info!("sent {} event to {SPLUNK_SINK}: {id}", event.kind()),
            None => log::info!("sent {} event to {SPLUNK_SINK}", event.raw.topic),
        }
        Ok(())
    }
}
