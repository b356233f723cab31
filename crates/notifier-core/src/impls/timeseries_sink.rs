//! TimeSeriesSink - Deployment 更新を time-series ポイントとして書き込む Sink
//!
//! # 排他制御
//! - writer は async Mutex で保護（ポイント構築〜flush の間ロックを保持）
//! - guard の drop でエラー時も必ず解放される
//!
//! # flush 失敗
//! 他の Sink と同様に `SinkError` として報告する（致命的ではない）。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClassifiedEvent, EventKind, Point, TypedEvent};
use crate::ports::{Clock, PointWriter, Sink, SinkError, SystemClock};

pub const TIMESERIES_SINK: &str = "influxdb";

pub struct TimeSeriesSink<W, C = SystemClock> {
    writer: Mutex<W>,
    clock: C,
}

impl<W: PointWriter> TimeSeriesSink<W> {
    pub fn new(writer: W) -> Self {
        Self::with_clock(writer, SystemClock)
    }
}

impl<W: PointWriter, C: Clock> TimeSeriesSink<W, C> {
    pub fn with_clock(writer: W, clock: C) -> Self {
        Self {
            writer: Mutex::new(writer),
            clock,
        }
    }

    /// Consume the sink and hand back the writer (tests inspect it).
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W, C> Sink for TimeSeriesSink<W, C>
where
    W: PointWriter,
    C: Clock,
{
    fn name(&self) -> &'static str {
        TIMESERIES_SINK
    }

    fn accepts(&self, kind: EventKind) -> bool {
        // 今は Deployment のみ
        kind == EventKind::Deployment
    }

    async fn accept(&self, event: &ClassifiedEvent) -> Result<(), SinkError> {
        let TypedEvent::Deployment(deployment) = &event.typed else {
            return Ok(());
        };

        let mut writer = self.writer.lock().await;
        let point = Point::from_deployment(deployment, self.clock.now());
        writer.write_point(point);
        writer.flush().await.map_err(|source| SinkError::Write {
            sink: TIMESERIES_SINK,
            source,
        })?;

        log::debug!(
            "wrote deployment {} ({} task groups) to {TIMESERIES_SINK}",
            deployment.id,
            deployment.task_groups.len()
        );
        Ok(())
    }
}
