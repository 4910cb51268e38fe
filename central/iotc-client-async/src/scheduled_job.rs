// Copyright (c) Microsoft. All rights reserved.

use iotc_common::{JobRun, OperationResult, ScheduledJob, ScheduledJobPatch, ScheduledJobPayload};

use crate::request::parse_model;
use crate::{Client, Error};

const BASE_PATH: &str = "api/scheduledJobs";

impl Client {
    pub async fn list_scheduled_jobs(&self, max_pages: u32) -> Result<Vec<ScheduledJob>, Error> {
        self.check_scheduled_jobs_supported()?;

        let uri = self.resource_url(BASE_PATH, &[]);
        self.list_pages(uri, max_pages, parse_model).await
    }

    pub async fn get_scheduled_job(&self, job_id: &str) -> Result<ScheduledJob, Error> {
        let uri = self.scheduled_job_url(job_id, &[])?;

        let value = self.send(hyper::Method::GET, &uri, None::<()>).await?;
        parse_model(value)
    }

    pub async fn create_scheduled_job(
        &self,
        job_id: &str,
        payload: &ScheduledJobPayload,
    ) -> Result<ScheduledJob, Error> {
        let uri = self.scheduled_job_url(job_id, &[])?;

        let value = self.send(hyper::Method::PUT, &uri, Some(payload)).await?;
        parse_model(value)
    }

    pub async fn update_scheduled_job(
        &self,
        job_id: &str,
        patch: &ScheduledJobPatch,
    ) -> Result<ScheduledJob, Error> {
        let uri = self.scheduled_job_url(job_id, &[])?;

        let value = self.send(hyper::Method::PATCH, &uri, Some(patch)).await?;
        parse_model(value)
    }

    pub async fn delete_scheduled_job(&self, job_id: &str) -> Result<OperationResult, Error> {
        let uri = self.scheduled_job_url(job_id, &[])?;

        self.send(hyper::Method::DELETE, &uri, None::<()>).await?;

        Ok(OperationResult::success())
    }

    /// Lists the runs of a scheduled job in the order the service returns them.
    pub async fn list_scheduled_job_runs(
        &self,
        job_id: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRun>, Error> {
        let uri = self.scheduled_job_url(job_id, &["jobs"])?;

        self.list_pages(uri, max_pages, parse_model).await
    }

    fn scheduled_job_url(&self, job_id: &str, suffix: &[&str]) -> Result<String, Error> {
        self.check_scheduled_jobs_supported()?;

        if job_id.is_empty() {
            return Err(Error::invalid_parameter("job_id", "must not be empty"));
        }

        let mut segments = vec![job_id];
        segments.extend_from_slice(suffix);

        Ok(self.resource_url(BASE_PATH, &segments))
    }

    fn check_scheduled_jobs_supported(&self) -> Result<(), Error> {
        let api_version = self.config.api_version();

        if api_version.supports_scheduled_jobs() {
            Ok(())
        } else {
            Err(Error::invalid_parameter(
                "api_version",
                format!(
                    "scheduled jobs require API version 2022-06-30-preview or later, not {}",
                    api_version
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use iotc_common::{
        ApiVersion, JobBatch, JobValueType, OperationResult, ScheduledJobPatch, ScheduledJobPayload,
    };
    use serde_json::json;
    use test_common::{MockServer, Response};

    use crate::client::tests::client;
    use crate::Error;

    fn job(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "displayName": "Nightly reset",
            "group": "thermostats",
            "data": [{ "type": "command", "target": "dtmi:sample:reset;1", "path": "reset" }],
            "schedule": { "start": "2022-08-01T00:00:00Z", "recurrence": "daily" },
            "enabled": true
        })
    }

    #[tokio::test]
    async fn old_api_versions_are_rejected_locally() {
        let server = MockServer::start(|_| Response::ok(job("nightly"))).await;

        for api_version in [
            ApiVersion::Preview,
            ApiVersion::V1_0,
            ApiVersion::V1_1Preview,
            ApiVersion::V2022_05_31,
        ] {
            let client = client(&server, api_version);

            let err = client.get_scheduled_job("nightly").await.unwrap_err();
            assert!(matches!(err, Error::InvalidParameter("api_version", _)));

            let err = client.list_scheduled_jobs(0).await.unwrap_err();
            assert!(matches!(err, Error::InvalidParameter("api_version", _)));

            let err = client
                .list_scheduled_job_runs("nightly", 0)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidParameter("api_version", _)));
        }

        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn get_and_list() {
        let server = MockServer::start(|req| {
            if req.path == "/api/scheduledJobs" {
                Response::ok(json!({ "value": [job("a"), job("b")] }))
            } else {
                Response::ok(job("a"))
            }
        })
        .await;
        let client = client(&server, ApiVersion::V2022_06_30Preview);

        let job = client.get_scheduled_job("a").await.unwrap();
        assert_eq!("a", job.id);
        assert_eq!(Some("thermostats"), job.group.as_deref());

        let jobs = client.list_scheduled_jobs(0).await.unwrap();
        assert_eq!(2, jobs.len());
        assert_eq!("b", jobs[1].id);

        let requests = server.requests();
        assert_eq!("/api/scheduledJobs/a", requests[0].path);
        assert_eq!(
            Some("2022-06-30-preview"),
            requests[0].query_param("api-version")
        );
    }

    #[tokio::test]
    async fn create_sends_full_payload() {
        let server = MockServer::start(|req| {
            let mut body = req.json_body().unwrap_or_default();
            body["id"] = json!("nightly");
            Response::ok(body)
        })
        .await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let payload = ScheduledJobPayload {
            display_name: "nightly".to_owned(),
            group: "thermostats".to_owned(),
            data: json!([{ "type": "command" }]),
            schedule: json!({ "start": "2022-08-01T00:00:00Z" }),
            description: None,
            batch: Some(JobBatch {
                value_type: JobValueType::Percentage,
                value: 10,
            }),
            cancellation_threshold: None,
        };
        let job = client
            .create_scheduled_job("nightly", &payload)
            .await
            .unwrap();
        assert_eq!(Some(&payload.data), job.data.as_ref());

        let requests = server.requests();
        assert_eq!(hyper::Method::PUT, requests[0].method);
        assert_eq!("/api/scheduledJobs/nightly", requests[0].path);
        assert_eq!(
            Some(json!({
                "displayName": "nightly",
                "group": "thermostats",
                "data": [{ "type": "command" }],
                "schedule": { "start": "2022-08-01T00:00:00Z" },
                "batch": { "type": "percentage", "value": 10 }
            })),
            requests[0].json_body()
        );
    }

    #[tokio::test]
    async fn update_without_content_sends_no_data() {
        let server = MockServer::start(|_| Response::ok(job("nightly"))).await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let patch = ScheduledJobPatch {
            description: Some("Resets every thermostat".to_owned()),
            ..Default::default()
        };
        client.update_scheduled_job("nightly", &patch).await.unwrap();

        let requests = server.requests();
        assert_eq!(hyper::Method::PATCH, requests[0].method);
        let body = requests[0].json_body().unwrap();
        assert_eq!(json!({ "description": "Resets every thermostat" }), body);
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn list_runs_of_a_job() {
        let server = MockServer::start(|req| match req.query_param("$skiptoken") {
            None => Response::ok(json!({
                "value": [{ "id": "run-1", "status": "completed" }],
                "nextLink": "jobs?$skiptoken=2"
            })),
            Some(_) => Response::ok(json!({ "value": [{ "id": "run-2", "status": "running" }] })),
        })
        .await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let runs = client
            .list_scheduled_job_runs("nightly", 0)
            .await
            .unwrap();
        let ids: Vec<_> = runs.iter().map(|run| run.id.as_str()).collect();
        assert_eq!(vec!["run-1", "run-2"], ids);

        let requests = server.requests();
        assert_eq!(2, requests.len());
        assert!(requests
            .iter()
            .all(|req| req.path == "/api/scheduledJobs/nightly/jobs"));

        let runs = client
            .list_scheduled_job_runs("nightly", 1)
            .await
            .unwrap();
        assert_eq!(1, runs.len());
    }

    #[tokio::test]
    async fn delete_returns_success() {
        let server = MockServer::start(|_| Response::no_content()).await;
        let client = client(&server, ApiVersion::V2022_07_31);

        assert_eq!(
            OperationResult::success(),
            client.delete_scheduled_job("nightly").await.unwrap()
        );
        assert_eq!(hyper::Method::DELETE, server.requests()[0].method);
    }
}
