//! Subscription filter (topics + job name + start index).

use super::topic::TopicFilter;

/// Job-name filter.
///
/// An empty name means "no filter". Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    name: Option<String>,
}

impl JobFilter {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: (!name.is_empty()).then_some(name),
        }
    }

    pub fn any() -> Self {
        Self { name: None }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn accepts(&self, job_id: &str) -> bool {
        match &self.name {
            Some(name) => name == job_id,
            None => true,
        }
    }
}

/// Subscription describes what the dispatcher asks the event source for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub topics: TopicFilter,
    pub job: JobFilter,
    /// Stream offset passed to the source (`index` query parameter).
    pub start_index: u64,
}

impl Subscription {
    pub fn new(topics: TopicFilter, job: JobFilter) -> Self {
        Self {
            topics,
            job,
            start_index: 0,
        }
    }

    pub fn with_start_index(mut self, index: u64) -> Self {
        self.start_index = index;
        self
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new(TopicFilter::default(), JobFilter::any())
    }
}
