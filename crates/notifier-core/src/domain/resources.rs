//! Typed views of the payload objects we care about.
//!
//! Only the fields the sinks and filters read are modeled; everything else in
//! the payload is ignored on decode (the raw event is still forwarded as-is).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deployment snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Deployment {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "JobID", default)]
    pub job_id: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_groups: BTreeMap<String, DeploymentState>,
}

/// Per task-group rollout progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeploymentState {
    pub healthy_allocs: i64,
    pub placed_allocs: i64,
    pub desired_canaries: i64,
    pub desired_total: i64,
    pub unhealthy_allocs: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub datacenter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Job {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(rename = "Type", default)]
    pub job_type: String,
    #[serde(default)]
    pub status: String,
}

// Nomad は空の map を null で返すことがある
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
