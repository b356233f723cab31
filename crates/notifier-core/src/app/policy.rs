//! Error policy: what the dispatcher does when things go wrong mid-stream.

/// What to do when a sink rejects an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkFailurePolicy {
    /// Log a warning and keep going (at-most-effort delivery).
    #[default]
    Continue,
    /// Stop the dispatcher with an error.
    FailFast,
}

/// Error policy for the dispatch loop.
///
/// Default: continue on sink failures and on any number of stream errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPolicy {
    pub on_sink_error: SinkFailurePolicy,

    /// Give up after this many stream errors in a row.
    /// A successfully received envelope resets the count. `None` = never.
    pub max_consecutive_stream_errors: Option<u32>,
}

impl ErrorPolicy {
    pub fn fail_fast() -> Self {
        Self {
            on_sink_error: SinkFailurePolicy::FailFast,
            ..Self::default()
        }
    }

    pub fn with_max_consecutive_stream_errors(mut self, max: u32) -> Self {
        self.max_consecutive_stream_errors = Some(max);
        self
    }

    pub fn is_fail_fast(&self) -> bool {
        self.on_sink_error == SinkFailurePolicy::FailFast
    }

    /// `consecutive` - number of stream errors seen in a row, including this one.
    pub fn stream_errors_exceeded(&self, consecutive: u32) -> bool {
        self.max_consecutive_stream_errors
            .is_some_and(|max| consecutive >= max)
    }
}
