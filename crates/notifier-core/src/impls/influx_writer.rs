//! InfluxWriter - InfluxDB v2 の write API への PointWriter 実装
//!
//! `write_point` はバッファに積むだけ。`flush` で line protocol を
//! `POST /api/v2/write` にまとめて送ります。
//! flush の成否にかかわらずバッファは空にします（リトライしない）。

use async_trait::async_trait;
use ureq::Agent;

use crate::domain::Point;
use crate::ports::{PointWriter, WriteError};

#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

pub struct InfluxWriter {
    config: InfluxConfig,
    agent: Agent,
    buffer: Vec<Point>,
}

impl InfluxWriter {
    pub fn new(config: InfluxConfig) -> Self {
        let agent_config = Agent::config_builder().http_status_as_error(false).build();
        Self {
            config,
            agent: Agent::new_with_config(agent_config),
            buffer: Vec::new(),
        }
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn write_url(&self) -> String {
        format!("{}/api/v2/write", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PointWriter for InfluxWriter {
    fn write_point(&mut self, point: Point) {
        self.buffer.push(point);
    }

    async fn flush(&mut self) -> Result<(), WriteError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let points = std::mem::take(&mut self.buffer);
        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        let agent = self.agent.clone();
        let url = self.write_url();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let mut response = agent
                .post(&url)
                .query("org", &config.org)
                .query("bucket", &config.bucket)
                .query("precision", "ns")
                .header("Authorization", format!("Token {}", config.token))
                .header("Content-Type", "text/plain; charset=utf-8")
                .send(body)
                .map_err(|e| WriteError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.body_mut().read_to_string().unwrap_or_default();
                return Err(WriteError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            log::debug!("flushed {} point(s) to {url}", points.len());
            Ok(())
        })
        .await
        .map_err(|e| WriteError::Transport(format!("flush task failed: {e}")))?
    }
}
