//! Dispatcher - イベントストリームを読み、フィルタして Sink に振り分けるループ
//!
//! # 状態遷移
//! `Idle` → (購読成功) → `Streaming` → (キャンセル or channel close) → `Stopped`
//!
//! # フロー（Envelope ごと）
//! 1. ストリームエラー → warn を出して継続（連続回数の上限はポリシー次第）
//! 2. heartbeat → 何もしない
//! 3. バッチ内のイベントを順に分類 → topic / job フィルタ
//! 4. 受け付ける Sink すべてに順番に送出。失敗は Sink ごとに隔離
//!
//! # キャンセル
//! 購読前、受信待ち（select）、バッチ内のイベント間、Sink 呼び出しの間で確認します。
//! 実行中の Sink 呼び出しは中断しませんが、キャンセル後に次の Sink は呼びません。

use tokio::sync::watch;

use super::policy::ErrorPolicy;
use super::status::DispatchStats;
use crate::domain::{ClassifiedEvent, Envelope, Event, EventKind, Subscription, normalize_topic};
use crate::ports::{EventSource, Sink, SinkError, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Streaming,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// シャットダウン要求
    Cancelled,
    /// ソース側が channel を閉じた
    SourceClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub reason: StopReason,
    pub stats: DispatchStats,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("could not subscribe to event stream: {0}")]
    Subscribe(#[source] SourceError),

    #[error("sink failure (fail-fast): {0}")]
    Sink(#[source] SinkError),

    #[error("giving up after {0} consecutive stream errors")]
    TooManyStreamErrors(u32),
}

/// Dispatcher は購読元を専有し、Sink 群へイベントを配る
///
/// 構築は `DispatcherBuilder` 経由（起動時検証あり）。
pub struct Dispatcher {
    source: Box<dyn EventSource>,
    sinks: Vec<Box<dyn Sink>>,
    subscription: Subscription,
    policy: ErrorPolicy,
    state: LoopState,
    stats: DispatchStats,
}

enum Next {
    Cancelled,
    Item(Option<Result<Envelope, SourceError>>),
}

/// 1 イベント分の送出結果
enum Delivery {
    Done,
    Cancelled,
}

impl Dispatcher {
    pub(crate) fn new(
        source: Box<dyn EventSource>,
        sinks: Vec<Box<dyn Sink>>,
        subscription: Subscription,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            source,
            sinks,
            subscription,
            policy,
            state: LoopState::Idle,
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// ループ本体
    ///
    /// `shutdown` が `true` になるか、Sender が drop されるとキャンセル扱い。
    /// Sink の失敗は（fail-fast でない限り）ログに出るだけで戻り値には現れません。
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<DispatchReport, DispatchError> {
        if *shutdown.borrow_and_update() {
            return Ok(self.stop(StopReason::Cancelled));
        }

        let opened = tokio::select! {
            _ = cancelled(&mut shutdown) => None,
            opened = self.source.open(&self.subscription) => Some(opened),
        };
        let mut rx = match opened {
            None => return Ok(self.stop(StopReason::Cancelled)),
            Some(Ok(rx)) => rx,
            Some(Err(e)) => {
                self.halt();
                log::error!("error creating event stream client: {e}");
                return Err(DispatchError::Subscribe(e));
            }
        };

        self.state = LoopState::Streaming;
        log::info!("streaming events to sinks {:?}", self.sink_names());

        let mut consecutive_errors: u32 = 0;
        loop {
            // 受信は「待つ」可能性があるので shutdown と競合させる
            let next = tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => Next::Cancelled,
                item = rx.recv() => Next::Item(item),
            };

            let envelope = match next {
                Next::Cancelled => return Ok(self.stop(StopReason::Cancelled)),
                Next::Item(None) => {
                    log::warn!("event stream closed by source");
                    return Ok(self.stop(StopReason::SourceClosed));
                }
                Next::Item(Some(Err(e))) => {
                    self.stats.stream_errors += 1;
                    consecutive_errors += 1;
                    log::warn!("error from event stream: {e}");
                    if self.policy.stream_errors_exceeded(consecutive_errors) {
                        self.halt();
                        return Err(DispatchError::TooManyStreamErrors(consecutive_errors));
                    }
                    continue;
                }
                Next::Item(Some(Ok(envelope))) => envelope,
            };

            consecutive_errors = 0;
            self.stats.envelopes += 1;
            if envelope.is_heartbeat() {
                self.stats.heartbeats += 1;
                continue;
            }

            for event in envelope.events {
                if *shutdown.borrow() {
                    return Ok(self.stop(StopReason::Cancelled));
                }
                match self.dispatch_event(event, &shutdown).await {
                    Ok(Delivery::Done) => {}
                    Ok(Delivery::Cancelled) => return Ok(self.stop(StopReason::Cancelled)),
                    Err(e) => {
                        self.halt();
                        return Err(e);
                    }
                }
            }
        }
    }

    async fn dispatch_event(
        &mut self,
        raw: Event,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<Delivery, DispatchError> {
        self.stats.events += 1;

        let on_topic = normalize_topic(&raw.topic)
            .is_some_and(|topic| self.subscription.topics.contains(&topic));
        if !on_topic {
            self.stats.filtered_by_topic += 1;
            log::debug!("dropping event on unsubscribed topic {:?}", raw.topic);
            return Ok(Delivery::Done);
        }

        let event = ClassifiedEvent::new(raw);
        let kind = event.kind();

        if let Some(job_id) = event.typed.job_id()
            && !self.subscription.job.accepts(job_id)
        {
            self.stats.filtered_by_job += 1;
            log::debug!("dropping {kind} event for job {job_id:?}");
            return Ok(Delivery::Done);
        }

        if kind == EventKind::Unknown {
            self.stats.unknown += 1;
        }
        self.stats.record_routed(kind);

        for sink in self.sinks.iter().filter(|s| s.accepts(kind)) {
            if *shutdown.borrow() {
                log::debug!("shutdown requested, skipping {} for {kind} event", sink.name());
                return Ok(Delivery::Cancelled);
            }
            match sink.accept(&event).await {
                Ok(()) => self.stats.delivered += 1,
                Err(e) => {
                    self.stats.sink_failures += 1;
                    log::warn!("error sending {kind} event to {}: {e}", sink.name());
                    if self.policy.is_fail_fast() {
                        return Err(DispatchError::Sink(e));
                    }
                }
            }
        }
        Ok(Delivery::Done)
    }

    /// エラー終了
    fn halt(&mut self) {
        self.state = LoopState::Stopped;
        log::info!("dispatcher halted: {}", self.stats);
    }

    fn stop(&mut self, reason: StopReason) -> DispatchReport {
        self.state = LoopState::Stopped;
        log::info!("dispatcher stopped ({reason:?}): {}", self.stats);
        DispatchReport {
            reason,
            stats: self.stats.clone(),
        }
    }
}

/// shutdown が立つ（または Sender が drop される）まで待つ
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
