//! DispatcherBuilder - Dispatcher の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - EventSource が未設定 → BuildError::MissingSource
//! - Sink が 1 つもない → BuildError::NoSinkConfigured
//! - 購読トピックが空 → BuildError::EmptyTopics
//!
//! どれも起動時に落とすべきエラーで、ループ開始後には起こりません。

use super::dispatcher::Dispatcher;
use super::policy::ErrorPolicy;
use crate::domain::Subscription;
use crate::ports::{EventSource, Sink};

/// DispatcherBuilder は Dispatcher を構築
///
/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .source(NomadEventStream::new(nomad_config))
///     .sink(SplunkSink::new(splunk_config))
///     .subscription(subscription)
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    source: Option<Box<dyn EventSource>>,
    sinks: Vec<Box<dyn Sink>>,
    subscription: Subscription,
    policy: ErrorPolicy,
}

/// BuildError は Dispatcher 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no event source configured")]
    MissingSource,

    #[error("no sink configured; enable at least one output")]
    NoSinkConfigured,

    #[error("topic list is empty after normalization")]
    EmptyTopics,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            sinks: Vec::new(),
            subscription: Subscription::default(),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn source(mut self, source: impl EventSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Sink を追加（登録順に呼ばれる）
    pub fn sink(self, sink: impl Sink + 'static) -> Self {
        self.boxed_sink(Box::new(sink))
    }

    pub fn boxed_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = subscription;
        self
    }

    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        if self.sinks.is_empty() {
            return Err(BuildError::NoSinkConfigured);
        }
        if self.subscription.topics.is_empty() {
            return Err(BuildError::EmptyTopics);
        }
        Ok(Dispatcher::new(
            source,
            self.sinks,
            self.subscription,
            self.policy,
        ))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LoopState;
    use crate::app::testing::{RecordingSink, new_log};
    use crate::domain::{EventKind, JobFilter, TopicFilter};
    use crate::impls::InMemoryEventSource;

    #[test]
    fn test_build_success() {
        let log = new_log();
        let dispatcher = DispatcherBuilder::new()
            .source(InMemoryEventSource::from_items(vec![]))
            .sink(RecordingSink::only("ts", EventKind::Deployment, &log))
            .sink(RecordingSink::all("log", &log))
            .build()
            .unwrap();

        assert_eq!(dispatcher.sink_names(), vec!["ts", "log"]);
        assert_eq!(dispatcher.state(), LoopState::Idle);
        assert_eq!(dispatcher.subscription().topics, TopicFilter::default());
    }

    #[test]
    fn test_build_without_sinks() {
        let result = DispatcherBuilder::new()
            .source(InMemoryEventSource::from_items(vec![]))
            .build();
        assert!(matches!(result, Err(BuildError::NoSinkConfigured)));
    }

    #[test]
    fn test_build_without_source() {
        let log = new_log();
        let result = DispatcherBuilder::new()
            .sink(RecordingSink::all("log", &log))
            .build();
        assert!(matches!(result, Err(BuildError::MissingSource)));
    }

    #[test]
    fn test_build_with_empty_topics() {
        let log = new_log();
        let result = DispatcherBuilder::new()
            .source(InMemoryEventSource::from_items(vec![]))
            .sink(RecordingSink::all("log", &log))
            .subscription(Subscription::new(TopicFilter::parse(" , "), JobFilter::any()))
            .build();
        assert!(matches!(result, Err(BuildError::EmptyTopics)));
    }
}
