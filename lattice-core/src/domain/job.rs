//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Server-issued job identifier
///
/// The server may hand out numeric or textual ids; the node echoes back
/// whichever form it received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Number(u64),
    Text(String),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Number(n) => write!(f, "{}", n),
            JobId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        JobId::Number(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        JobId::Text(value.to_string())
    }
}

impl JobId {
    /// Accepts a non-negative integer or a non-blank string
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(JobId::Number),
            Value::String(s) if !s.trim().is_empty() => Some(JobId::Text(s.clone())),
            _ => None,
        }
    }
}

/// Job descriptor as delivered by the server
///
/// Everything apart from the id and the type selector is treated as a run
/// parameter and handed to the computation engine untouched. The id is kept
/// as raw JSON so that an unusable id (negative, fractional, an object)
/// still parses and is rejected by [`JobDescriptor::into_job`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescriptor {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub organisation_config_type: Option<String>,
    #[serde(flatten)]
    pub run_parameters: Map<String, Value>,
}

impl JobDescriptor {
    /// Validates the descriptor into a runnable job
    ///
    /// Returns `None` when the id is missing or unusable, or when the type
    /// selector is missing or blank. Callers treat that as "no job available".
    pub fn into_job(self) -> Option<Job> {
        let id = JobId::from_value(self.id.as_ref()?)?;
        let config_type = self
            .organisation_config_type
            .filter(|t| !t.trim().is_empty())?;

        Some(Job {
            id,
            config_type,
            parameters: self.run_parameters,
        })
    }
}

/// A well-formed unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    /// Declared computation type, matched exactly against registered models
    pub config_type: String,
    pub parameters: Map<String, Value>,
}

impl Job {
    /// Reads an unsigned integer run parameter
    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.parameters.get(key).and_then(Value::as_u64)
    }
}

/// Result of a job execution, posted back to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: JobId,
    pub node_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    #[serde(default)]
    pub outputs: Map<String, Value>,
}

impl JobResult {
    /// Builds a result, deriving the duration from the two timestamps
    ///
    /// A clock that stepped backwards yields a zero duration rather than a
    /// negative one.
    pub fn new(
        job_id: JobId,
        node_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        outputs: Map<String, Value>,
    ) -> Self {
        let millis = (end_time - start_time).num_milliseconds().max(0);
        Self {
            job_id,
            node_id: node_id.into(),
            start_time,
            end_time,
            duration_seconds: millis as f64 / 1000.0,
            outputs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_descriptor_parses_numeric_id_and_parameters() {
        let descriptor: JobDescriptor = serde_json::from_value(json!({
            "id": 1,
            "organisationConfigType": "A",
            "samples": 10
        }))
        .unwrap();

        let job = descriptor.into_job().unwrap();
        assert_eq!(job.id, JobId::Number(1));
        assert_eq!(job.config_type, "A");
        assert_eq!(job.param_u64("samples"), Some(10));
    }

    #[test]
    fn test_descriptor_accepts_text_id() {
        let descriptor: JobDescriptor = serde_json::from_value(json!({
            "id": "job-7",
            "organisationConfigType": "B"
        }))
        .unwrap();

        assert_eq!(descriptor.into_job().unwrap().id, JobId::from("job-7"));
    }

    #[test]
    fn test_descriptor_without_id_is_not_a_job() {
        let descriptor: JobDescriptor =
            serde_json::from_value(json!({ "organisationConfigType": "A" })).unwrap();
        assert!(descriptor.into_job().is_none());
    }

    #[test]
    fn test_descriptor_with_unusable_id_is_not_a_job() {
        for id in [json!(-1), json!(1.5), json!(""), json!({ "n": 1 }), json!(null)] {
            let descriptor: JobDescriptor =
                serde_json::from_value(json!({ "id": id, "organisationConfigType": "A" }))
                    .unwrap();
            assert!(descriptor.into_job().is_none());
        }
    }

    #[test]
    fn test_descriptor_without_type_is_not_a_job() {
        let descriptor: JobDescriptor = serde_json::from_value(json!({ "id": 3 })).unwrap();
        assert!(descriptor.into_job().is_none());

        let blank: JobDescriptor =
            serde_json::from_value(json!({ "id": 3, "organisationConfigType": "  " })).unwrap();
        assert!(blank.into_job().is_none());
    }

    #[test]
    fn test_result_duration_is_derived() {
        let start = Utc::now();
        let end = start + Duration::milliseconds(1500);
        let result = JobResult::new(JobId::Number(1), "host:123456", start, end, Map::new());
        assert_eq!(result.duration_seconds, 1.5);
    }

    #[test]
    fn test_result_duration_never_negative() {
        let start = Utc::now();
        let end = start - Duration::seconds(3);
        let result = JobResult::new(JobId::Number(1), "host:123456", start, end, Map::new());
        assert_eq!(result.duration_seconds, 0.0);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let start = Utc::now();
        let result = JobResult::new(JobId::Number(9), "m:1", start, start, Map::new());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["jobId"], json!(9));
        assert_eq!(value["nodeId"], json!("m:1"));
        assert!(value.get("durationSeconds").is_some());
    }
}
