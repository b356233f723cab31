//! Test fixtures shared by the app-layer tests.

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::domain::{ClassifiedEvent, Envelope, Event, EventKind, Point};
use crate::ports::{PointWriter, Sink, SinkError, WriteError};

/// (sink name, object id or topic) in invocation order.
pub(crate) type CallLog = Arc<Mutex<Vec<(String, String)>>>;

/// Sink that records every invocation into a shared log.
pub(crate) struct RecordingSink {
    name: &'static str,
    kinds: Vec<EventKind>,
    fail_status: Option<u16>,
    calls: CallLog,
}

impl RecordingSink {
    /// Accepts every kind.
    pub(crate) fn all(name: &'static str, calls: &CallLog) -> Self {
        Self {
            name,
            kinds: vec![EventKind::Deployment, EventKind::Node, EventKind::Job, EventKind::Unknown],
            fail_status: None,
            calls: Arc::clone(calls),
        }
    }

    pub(crate) fn only(name: &'static str, kind: EventKind, calls: &CallLog) -> Self {
        Self {
            kinds: vec![kind],
            ..Self::all(name, calls)
        }
    }

    /// Every call is recorded and then rejected with `status`.
    pub(crate) fn failing(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    async fn accept(&self, event: &ClassifiedEvent) -> Result<(), SinkError> {
        let id = event
            .typed
            .object_id()
            .map(str::to_string)
            .unwrap_or_else(|| event.raw.topic.clone());
        self.calls.lock().unwrap().push((self.name.to_string(), id));

        match self.fail_status {
            Some(status) => Err(SinkError::Status { sink: self.name, status }),
            None => Ok(()),
        }
    }
}

pub(crate) fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn calls(log: &CallLog) -> Vec<(String, String)> {
    log.lock().unwrap().clone()
}

pub(crate) fn deployment(id: &str, job_id: &str) -> Event {
    Event::new(
        "Deployment",
        "DeploymentStatusUpdate",
        json!({ "Deployment": {
            "ID": id,
            "JobID": job_id,
            "Status": "running",
            "StatusDescription": "Deployment is running",
            "TaskGroups": { "app": { "HealthyAllocs": 1, "PlacedAllocs": 2, "DesiredCanaries": 0 } }
        }}),
    )
}

pub(crate) fn job(id: &str) -> Event {
    Event::new("Job", "JobRegistered", json!({ "Job": { "ID": id, "Name": id } }))
}

pub(crate) fn node(id: &str) -> Event {
    Event::new("Node", "NodeRegistration", json!({ "Node": { "ID": id } }))
}

pub(crate) fn batch(index: u64, events: Vec<Event>) -> Envelope {
    Envelope::batch(index, events)
}

/// PointWriter whose flushed points stay visible after it is moved into a sink.
#[derive(Default)]
pub(crate) struct SharedWriter {
    pending: Vec<Point>,
    pub(crate) flushed: Arc<Mutex<Vec<Point>>>,
}

#[async_trait]
impl PointWriter for SharedWriter {
    fn write_point(&mut self, point: Point) {
        self.pending.push(point);
    }

    async fn flush(&mut self) -> Result<(), WriteError> {
        let points = std::mem::take(&mut self.pending);
        self.flushed.lock().unwrap().extend(points);
        Ok(())
    }
}
