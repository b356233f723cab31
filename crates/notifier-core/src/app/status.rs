//! Status - dispatch の集計値
//!
//! 黙って捨てたイベントも数えておき、停止時にログへ出します。

use std::fmt;

use crate::domain::{EventKind, KindCounts};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// heartbeat を含む受信 Envelope 数
    pub envelopes: u64,
    pub heartbeats: u64,
    /// バッチ内のイベント総数
    pub events: u64,
    pub filtered_by_topic: u64,
    pub filtered_by_job: u64,
    /// どの型にも当てはまらなかったイベント
    pub unknown: u64,
    /// Sink への送出成功回数（イベント × Sink）
    pub delivered: u64,
    pub sink_failures: u64,
    pub stream_errors: u64,
    /// フィルタを通過したイベントの種類別件数
    pub routed_by_kind: KindCounts,
}

impl DispatchStats {
    pub fn routed(&self, kind: EventKind) -> u64 {
        self.routed_by_kind.get(&kind).copied().unwrap_or(0)
    }

    pub(crate) fn record_routed(&mut self, kind: EventKind) {
        *self.routed_by_kind.entry(kind).or_default() += 1;
    }
}

impl fmt::Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "envelopes={} heartbeats={} events={} filtered_topic={} filtered_job={} unknown={} delivered={} sink_failures={} stream_errors={}",
            self.envelopes,
            self.heartbeats,
            self.events,
            self.filtered_by_topic,
            self.filtered_by_job,
            self.unknown,
            self.delivered,
            self.sink_failures,
            self.stream_errors,
        )?;
        for (kind, count) in &self.routed_by_kind {
            write!(f, " routed_{kind}={count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routed_counts_per_kind() {
        let mut stats = DispatchStats::default();
        stats.record_routed(EventKind::Deployment);
        stats.record_routed(EventKind::Deployment);
        stats.record_routed(EventKind::Node);

        assert_eq!(stats.routed(EventKind::Deployment), 2);
        assert_eq!(stats.routed(EventKind::Node), 1);
        assert_eq!(stats.routed(EventKind::Job), 0);
    }

    #[test]
    fn display_includes_drop_counters() {
        let stats = DispatchStats {
            filtered_by_job: 3,
            sink_failures: 1,
            ..Default::default()
        };
        let line = stats.to_string();
        assert!(line.contains("filtered_job=3"));
        assert!(line.contains("sink_failures=1"));
    }
}
