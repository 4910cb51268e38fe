// Copyright (c) Microsoft. All rights reserved.

/// Unit of a batch size or cancellation threshold.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobValueType {
    Percentage,
    Number,
}

impl JobValueType {
    pub fn from_percentage_flag(is_percentage: bool) -> Self {
        if is_percentage {
            JobValueType::Percentage
        } else {
            JobValueType::Number
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct JobBatch {
    #[serde(rename = "type")]
    pub value_type: JobValueType,
    pub value: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct JobCancellationThreshold {
    #[serde(rename = "type")]
    pub value_type: JobValueType,
    pub value: u32,

    /// Whether the threshold applies per batch rather than to the whole job.
    #[serde(default)]
    pub batch: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJob {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Id of the device group the job targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<JobBatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_threshold: Option<JobCancellationThreshold>,

    /// Job actions, e.g. property writes or command invocations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Start time, recurrence and end condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,
}

/// Body of a scheduled job create (PUT).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJobPayload {
    pub display_name: String,
    pub group: String,
    pub data: serde_json::Value,
    pub schedule: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<JobBatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_threshold: Option<JobCancellationThreshold>,
}

/// Body of a scheduled job update (PATCH). Absent fields keep their remote value.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledJobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<JobBatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_threshold: Option<JobCancellationThreshold>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct JobProgress {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub failed: u64,
}

/// One execution of a scheduled job.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_job_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<JobBatch>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_threshold: Option<JobCancellationThreshold>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,

    /// e.g. `pending`, `running`, `completed`, `failed`, `cancelled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        JobBatch, JobCancellationThreshold, JobRun, JobValueType, ScheduledJob, ScheduledJobPatch,
        ScheduledJobPayload,
    };

    #[test]
    fn scheduled_job_from_service() {
        let job: ScheduledJob = serde_json::from_value(json!({
            "id": "nightly-reset",
            "displayName": "Nightly reset",
            "group": "thermostats",
            "batch": { "type": "percentage", "value": 25 },
            "cancellationThreshold": { "type": "number", "value": 10, "batch": true },
            "data": [{ "type": "command", "target": "dtmi:sample:reset;1", "path": "reset" }],
            "schedule": { "start": "2022-08-01T00:00:00Z", "recurrence": "daily" },
            "enabled": true,
            "completed": false,
            "etag": "\"abc\""
        }))
        .unwrap();

        assert_eq!(
            Some(JobBatch {
                value_type: JobValueType::Percentage,
                value: 25
            }),
            job.batch
        );
        assert_eq!(
            Some(JobCancellationThreshold {
                value_type: JobValueType::Number,
                value: 10,
                batch: true
            }),
            job.cancellation_threshold
        );
        assert_eq!(Some(true), job.enabled);
        assert!(job.organizations.is_empty());
    }

    #[test]
    fn create_payload_shape() {
        let payload = ScheduledJobPayload {
            display_name: "Nightly reset".to_owned(),
            group: "thermostats".to_owned(),
            data: json!([{ "type": "command" }]),
            schedule: json!({ "start": "2022-08-01T00:00:00Z" }),
            description: None,
            batch: Some(JobBatch {
                value_type: JobValueType::from_percentage_flag(false),
                value: 5,
            }),
            cancellation_threshold: None,
        };

        assert_eq!(
            json!({
                "displayName": "Nightly reset",
                "group": "thermostats",
                "data": [{ "type": "command" }],
                "schedule": { "start": "2022-08-01T00:00:00Z" },
                "batch": { "type": "number", "value": 5 }
            }),
            serde_json::to_value(&payload).unwrap()
        );
    }

    #[test]
    fn empty_patch_sends_nothing() {
        assert_eq!(
            json!({}),
            serde_json::to_value(ScheduledJobPatch::default()).unwrap()
        );
    }

    #[test]
    fn job_run_progress() {
        let run: JobRun = serde_json::from_value(json!({
            "id": "run-1",
            "scheduledJobId": "nightly-reset",
            "status": "completed",
            "progress": { "total": 4, "completed": 3, "failed": 1 }
        }))
        .unwrap();

        let progress = run.progress.unwrap();
        assert_eq!(4, progress.total);
        assert_eq!(0, progress.pending);
        assert_eq!(Some("nightly-reset"), run.scheduled_job_id.as_deref());
    }
}
