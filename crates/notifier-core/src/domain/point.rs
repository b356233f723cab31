//! Point - time-series のデータポイントと line protocol 表現
//!
//! InfluxDB line protocol:
//! `measurement,tag=v field=1i,other="s" 1700000000000000000`

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::resources::Deployment;

pub const DEPLOYMENT_MEASUREMENT: &str = "nomad_deployment";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Deployment 更新 1 件につき 1 ポイント
    ///
    /// タイムスタンプは受信時刻（イベント時刻は当てにならない）。
    pub fn from_deployment(deployment: &Deployment, received_at: DateTime<Utc>) -> Self {
        let mut point = Point::new(DEPLOYMENT_MEASUREMENT, received_at)
            .tag("deployment_id", deployment.id.as_str())
            .field("status", deployment.status.as_str())
            .field("status_description", deployment.status_description.as_str());

        for (name, tg) in &deployment.task_groups {
            point = point
                .field(format!("task_group_{name}_healthy"), tg.healthy_allocs)
                .field(format!("task_group_{name}_placed"), tg.placed_allocs)
                .field(format!("task_group_{name}_desired_canaries"), tg.desired_canaries);
        }
        point
    }

    /// Render as one line of InfluxDB line protocol (nanosecond precision).
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);
        // 空のタグ値は line protocol として不正なので出さない
        for (k, v) in self.tags.iter().filter(|(k, v)| !k.is_empty() && !v.is_empty()) {
            let _ = write!(line, ",{}={}", escape(k, TAG_SPECIAL), escape(v, TAG_SPECIAL));
        }

        let mut first = true;
        for (k, v) in &self.fields {
            line.push(if first { ' ' } else { ',' });
            first = false;
            let _ = write!(line, "{}=", escape(k, TAG_SPECIAL));
            match v {
                FieldValue::Integer(i) => {
                    let _ = write!(line, "{i}i");
                }
                FieldValue::Float(f) => {
                    let _ = write!(line, "{f}");
                }
                FieldValue::Boolean(b) => {
                    let _ = write!(line, "{b}");
                }
                FieldValue::Text(s) => {
                    let _ = write!(line, "\"{}\"", escape(s, &['"', '\\']));
                }
            }
        }

        if let Some(ns) = self.timestamp.timestamp_nanos_opt() {
            let _ = write!(line, " {ns}");
        }
        line
    }
}

const TAG_SPECIAL: &[char] = &[',', '=', ' '];

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resources::DeploymentState;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    fn deployment(groups: &[&str]) -> Deployment {
        Deployment {
            id: "d-1".into(),
            job_id: "web".into(),
            status: "running".into(),
            status_description: "Deployment is running".into(),
            task_groups: groups
                .iter()
                .map(|name| {
                    (
                        name.to_string(),
                        DeploymentState {
                            healthy_allocs: 2,
                            placed_allocs: 3,
                            desired_canaries: 1,
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn deployment_point_has_one_triple_per_task_group() {
        let point = Point::from_deployment(&deployment(&["api", "frontend"]), at());

        assert_eq!(point.measurement, DEPLOYMENT_MEASUREMENT);
        assert_eq!(point.tags.len(), 1);
        assert_eq!(point.tags["deployment_id"], "d-1");
        // status + status_description + 3 per group
        assert_eq!(point.fields.len(), 2 + 3 * 2);
        for group in ["api", "frontend"] {
            assert_eq!(point.fields[&format!("task_group_{group}_healthy")], FieldValue::Integer(2));
            assert_eq!(point.fields[&format!("task_group_{group}_placed")], FieldValue::Integer(3));
            assert_eq!(
                point.fields[&format!("task_group_{group}_desired_canaries")],
                FieldValue::Integer(1)
            );
        }
        assert_eq!(point.timestamp, at());
    }

    #[test]
    fn deployment_without_groups_keeps_status_fields() {
        let point = Point::from_deployment(&deployment(&[]), at());
        assert_eq!(point.fields.len(), 2);
        assert_eq!(point.fields["status"], FieldValue::Text("running".into()));
    }

    #[test]
    fn renders_line_protocol() {
        let line = Point::new("cpu", at())
            .tag("host", "a b")
            .field("idle", 0.5)
            .field("count", 3_i64)
            .field("ok", true)
            .field("msg", "say \"hi\"")
            .to_line_protocol();

        assert_eq!(
            line,
            "cpu,host=a\\ b count=3i,idle=0.5,msg=\"say \\\"hi\\\"\",ok=true 1700000000000000000"
        );
    }

    #[test]
    fn escapes_measurement_and_keys() {
        let line = Point::new("my measure,x", at())
            .tag("k=1", "v,2")
            .field("f 1", 1_i64)
            .to_line_protocol();
        assert!(line.starts_with("my\\ measure\\,x,k\\=1=v\\,2 f\\ 1=1i "));
    }

    #[test]
    fn empty_tag_value_is_omitted() {
        let mut dep = deployment(&[]);
        dep.id = String::new();
        let line = Point::from_deployment(&dep, at()).to_line_protocol();
        assert!(!line.contains("deployment_id"));
        assert!(line.starts_with("nomad_deployment status=\"running\","), "{line}");
    }
}
