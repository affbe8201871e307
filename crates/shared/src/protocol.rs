use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Priority, TaskId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// A null or missing stamp reads as the Unix epoch.
    #[serde(default, with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub content: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.priority.is_none() && self.completed.is_none()
    }
}

/// Common shape of the service's mutation envelopes: a `success` flag plus
/// either a human message or an error string.
pub trait ApiOutcome {
    fn succeeded(&self) -> bool;
    fn error_message(&self) -> Option<&str>;
}

macro_rules! api_outcome {
    ($name:ident) => {
        impl ApiOutcome for $name {
            fn succeeded(&self) -> bool {
                self.success
            }

            fn error_message(&self) -> Option<&str> {
                self.error.as_deref()
            }
        }
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCompletedResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub deleted_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

api_outcome!(TaskResponse);
api_outcome!(AckResponse);
api_outcome!(ClearCompletedResponse);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

/// Server-side summary from `GET /api/stats`. `completion_rate` keeps the
/// service's one-decimal precision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskStatsSummary {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub completion_rate: f64,
    #[serde(default)]
    pub priority_breakdown: PriorityBreakdown,
    #[serde(default)]
    pub recent_tasks: u64,
}

/// The service writes naive UTC timestamps (`2024-05-01T09:30:00.123456`);
/// offsets are accepted as well.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.naive_utc().format(NAIVE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => {
                parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
            }
            None => Ok(DateTime::<Utc>::default()),
        }
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_service_task_with_naive_timestamp() {
        let raw = r#"{
            "id": 4,
            "content": "Try adding a new task above",
            "completed": false,
            "priority": "low",
            "created_at": "2024-05-01T09:30:00.123456",
            "updated_at": null
        }"#;

        let task: Task = serde_json::from_str(raw).expect("decode");
        assert_eq!(task.id, TaskId(4));
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(
            task.created_at.timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
                .single()
                .expect("date")
                .timestamp()
        );
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn accepts_offset_timestamps_and_unknown_priority() {
        let raw = r#"{
            "id": 1,
            "content": "x",
            "priority": "urgent",
            "created_at": "2024-05-01T11:30:00+02:00"
        }"#;

        let task: Task = serde_json::from_str(raw).expect("decode");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert_eq!(
            task.created_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
                .single()
                .expect("date")
        );
    }

    #[test]
    fn null_or_missing_created_at_reads_as_epoch() {
        let raw = r#"[
            {"id": 1, "content": "legacy row", "created_at": null},
            {"id": 2, "content": "older row"}
        ]"#;

        let tasks: Vec<Task> = serde_json::from_str(raw).expect("decode");
        assert_eq!(tasks.len(), 2);
        for task in &tasks {
            assert_eq!(task.created_at.timestamp(), 0);
        }
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let raw = r#"{"id": 1, "content": "x", "created_at": "yesterday"}"#;
        let err = serde_json::from_str::<Task>(raw).expect_err("must fail");
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn update_request_omits_unset_fields() {
        let request = UpdateTaskRequest {
            priority: Some(Priority::High),
            ..UpdateTaskRequest::default()
        };
        let encoded = serde_json::to_value(&request).expect("encode");
        assert_eq!(encoded, serde_json::json!({ "priority": "high" }));
        assert!(!request.is_empty());
        assert!(UpdateTaskRequest::default().is_empty());
    }

    #[test]
    fn stats_summary_accepts_integer_rate_for_empty_store() {
        let raw = r#"{
            "total_tasks": 0,
            "completed_tasks": 0,
            "pending_tasks": 0,
            "completion_rate": 0,
            "priority_breakdown": {"high": 0, "medium": 0, "low": 0},
            "recent_tasks": 0
        }"#;
        let summary: TaskStatsSummary = serde_json::from_str(raw).expect("decode");
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn failed_envelope_exposes_error() {
        let raw = r#"{"success": false, "error": "Task content is required"}"#;
        let response: TaskResponse = serde_json::from_str(raw).expect("decode");
        assert!(!response.succeeded());
        assert_eq!(response.error_message(), Some("Task content is required"));
    }
}
