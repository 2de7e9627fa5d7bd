//! Core types: task identifiers, task records, fetch request/outcome shapes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

/// Namespace prefix for task record keys
pub const TASK_KEY_PREFIX: &str = "task:";

/// Counter name used by the identifier allocator
pub const TASK_COUNTER: &str = "task";

/// Integer identifier allocated for a task
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Namespaced string key identifying a task record, e.g. `"task:1"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    /// Wrap a caller-supplied key verbatim
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build the key for an allocated identifier
    pub fn from_id(id: TaskId) -> Self {
        Self(format!("{TASK_KEY_PREFIX}{id}"))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier portion of a well-formed key, if any
    pub fn id(&self) -> Option<TaskId> {
        self.0
            .strip_prefix(TASK_KEY_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .map(TaskId)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters describing the outbound HTTP request to perform
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FetchRequest {
    /// HTTP method, e.g. "GET"
    #[serde(default)]
    pub method: String,

    /// Absolute URL to fetch
    #[serde(default)]
    pub address: String,

    /// Request headers to set
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,

    /// Request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl FetchRequest {
    /// Validate that required fields are present and well-formed
    ///
    /// Checks presence of `method` and `address`, that the method is a valid
    /// HTTP token, and that the address parses as a URL. Does not touch
    /// storage or the network.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.method.trim().is_empty() {
            missing.push("method");
        }
        if self.address.trim().is_empty() {
            missing.push("address");
        }
        if !missing.is_empty() {
            return Err(Error::validation("missing required fields", &missing));
        }

        if reqwest::Method::from_bytes(self.method.as_bytes()).is_err() {
            return Err(Error::validation(
                format!("invalid HTTP method: {:?}", self.method),
                &["method"],
            ));
        }

        if let Err(e) = url::Url::parse(&self.address) {
            return Err(Error::validation(
                format!("invalid address {:?}: {}", self.address, e),
                &["address"],
            ));
        }

        Ok(())
    }
}

/// Result summary of a completed outbound fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FetchOutcome {
    /// Status line of the response, e.g. "200 OK"
    pub http_status: String,

    /// Response headers (multi-valued)
    pub headers: HashMap<String, Vec<String>>,

    /// Response body length as reported, None when unknown
    pub content_length: Option<i64>,
}

/// Lifecycle state of a task record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Submitted, fetch not yet performed
    Pending,
    /// Fetch completed and outcome fields are populated
    Done,
    /// Fetch failed; the record carries the failure reason
    Failed,
}

/// Stored (and served) task record
///
/// Serialized as flat camelCase JSON. A record is written once as pending at
/// submission time and fully replaced exactly once by the worker's terminal
/// write: either done with the fetch outcome, or failed with a reason.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskRecord {
    /// The task key
    pub key: TaskKey,

    /// False while pending, true once a worker wrote a terminal record
    pub done: bool,

    /// Status line of the completed fetch
    #[serde(
        rename = "httpStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub http_status: Option<String>,

    /// Response headers of the completed fetch (multi-valued)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,

    /// Response body length, absent when unknown or not yet fetched
    #[serde(
        rename = "contentLength",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_length: Option<i64>,

    /// Failure reason, present only on failed records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    /// Fresh pending record for a newly allocated key
    pub fn pending(key: TaskKey) -> Self {
        Self {
            key,
            done: false,
            http_status: None,
            headers: HashMap::new(),
            content_length: None,
            error: None,
        }
    }

    /// Terminal record for a successfully completed fetch
    pub fn completed(key: TaskKey, outcome: FetchOutcome) -> Self {
        Self {
            key,
            done: true,
            http_status: Some(outcome.http_status),
            headers: outcome.headers,
            content_length: outcome.content_length,
            error: None,
        }
    }

    /// Terminal record for a failed fetch
    pub fn failed(key: TaskKey, reason: impl Into<String>) -> Self {
        Self {
            key,
            done: true,
            http_status: None,
            headers: HashMap::new(),
            content_length: None,
            error: Some(reason.into()),
        }
    }

    /// Lifecycle state of this record
    pub fn state(&self) -> TaskState {
        if !self.done {
            TaskState::Pending
        } else if self.error.is_some() {
            TaskState::Failed
        } else {
            TaskState::Done
        }
    }
}

/// Outcome of a delete request
///
/// Deleting a key that does not exist is a distinct "nothing to do" outcome,
/// never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record existed and was removed
    Deleted,
    /// No record existed under the key
    NotFound,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_key_from_id() {
        let key = TaskKey::from_id(TaskId(7));
        assert_eq!(key.as_str(), "task:7");
        assert_eq!(key.id(), Some(TaskId(7)));
    }

    #[test]
    fn test_task_key_id_rejects_foreign_keys() {
        assert_eq!(TaskKey::new("other:1").id(), None);
        assert_eq!(TaskKey::new("task:abc").id(), None);
    }

    #[test]
    fn test_pending_record_wire_shape() {
        let record = TaskRecord::pending(TaskKey::from_id(TaskId(1)));
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["key"], "task:1");
        assert_eq!(json["done"], false);
        assert!(json.get("httpStatus").is_none());
        assert!(json.get("contentLength").is_none());
        assert!(json.get("headers").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_completed_record_wire_shape() {
        let outcome = FetchOutcome {
            http_status: "200 OK".to_string(),
            headers: HashMap::from([(
                "content-type".to_string(),
                vec!["text/plain".to_string()],
            )]),
            content_length: Some(42),
        };
        let record = TaskRecord::completed(TaskKey::from_id(TaskId(1)), outcome);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["done"], true);
        assert_eq!(json["httpStatus"], "200 OK");
        assert_eq!(json["contentLength"], 42);
        assert_eq!(json["headers"]["content-type"][0], "text/plain");
        assert_eq!(record.state(), TaskState::Done);
    }

    #[test]
    fn test_failed_record_is_terminal_with_reason() {
        let record = TaskRecord::failed(TaskKey::from_id(TaskId(3)), "connection refused");
        assert_eq!(record.state(), TaskState::Failed);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["done"], true);
        assert_eq!(json["error"], "connection refused");
        assert!(json.get("httpStatus").is_none());
    }

    #[test]
    fn test_record_roundtrip() {
        let record = TaskRecord::pending(TaskKey::from_id(TaskId(5)));
        let bytes = serde_json::to_vec(&record).unwrap();
        let parsed: TaskRecord = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(parsed.key, record.key);
        assert_eq!(parsed.state(), TaskState::Pending);
    }

    #[test]
    fn test_validate_missing_fields() {
        let request = FetchRequest {
            method: "GET".to_string(),
            address: String::new(),
            headers: HashMap::new(),
            body: None,
        };

        let err = request.validate().unwrap_err();
        match err {
            Error::Validation { fields, .. } => assert_eq!(fields, vec!["address"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_bad_address() {
        let request = FetchRequest {
            method: "GET".to_string(),
            address: "not a url".to_string(),
            headers: HashMap::new(),
            body: None,
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        let request = FetchRequest {
            method: "POST".to_string(),
            address: "http://example.test/ok".to_string(),
            headers: HashMap::from([("accept".to_string(), "*/*".to_string())]),
            body: Some("payload".to_string()),
        };

        assert!(request.validate().is_ok());
    }
}
