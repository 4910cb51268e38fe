// Copyright (c) Microsoft. All rights reserved.

use std::io::Write;

use anyhow::{Context, Result};

use iotc_common::{
    JobBatch, JobCancellationThreshold, JobValueType, ScheduledJobPatch, ScheduledJobPayload,
};

use crate::internal::common::{self, process_json_arg, CommonArgs};
use crate::settings::Settings;

#[derive(clap::Subcommand)]
pub enum Options {
    /// List the scheduled jobs of an application.
    List(ListOptions),

    /// Show one scheduled job.
    Get(IdOptions),

    /// Create a scheduled job.
    Create(CreateOptions),

    /// Update some fields of a scheduled job.
    Update(UpdateOptions),

    /// Delete a scheduled job.
    Delete(IdOptions),

    /// List the runs of a scheduled job.
    ListRuns(ListRunsOptions),
}

#[derive(clap::Args)]
pub struct ListOptions {
    /// Stop after this many pages of results. 0 means no limit.
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args)]
pub struct IdOptions {
    #[arg(long, value_name = "ID")]
    job_id: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args)]
pub struct ListRunsOptions {
    #[arg(long, value_name = "ID")]
    job_id: String,

    /// Stop after this many pages of results. 0 means no limit.
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    #[command(flatten)]
    common: CommonArgs,
}

/// Batching and cancellation settings shared by create and update.
#[derive(clap::Args)]
pub struct BatchArgs {
    /// Number of devices per batch, or a percentage with --batch-type percentage.
    #[arg(long, value_name = "N")]
    batch: Option<u32>,

    /// "percentage" or "number".
    #[arg(long, value_name = "TYPE")]
    batch_type: Option<String>,

    /// Failed devices after which the job is cancelled, or a percentage with
    /// --threshold-type percentage.
    #[arg(long, value_name = "N")]
    threshold: Option<u32>,

    /// "percentage" or "number".
    #[arg(long, value_name = "TYPE")]
    threshold_type: Option<String>,

    /// Apply the cancellation threshold to each batch rather than the whole job.
    #[arg(long)]
    threshold_batch: bool,
}

impl BatchArgs {
    fn batch(&self) -> Option<JobBatch> {
        let value = self.batch?;

        Some(JobBatch {
            value_type: JobValueType::from_percentage_flag(common::is_percentage(
                self.batch_type.as_deref(),
            )),
            value,
        })
    }

    fn cancellation_threshold(&self) -> Option<JobCancellationThreshold> {
        let value = self.threshold?;

        Some(JobCancellationThreshold {
            value_type: JobValueType::from_percentage_flag(common::is_percentage(
                self.threshold_type.as_deref(),
            )),
            value,
            batch: self.threshold_batch,
        })
    }
}

#[derive(clap::Args)]
pub struct CreateOptions {
    #[arg(long, value_name = "ID")]
    job_id: String,

    /// Display name of the job. Defaults to the job id.
    #[arg(long, value_name = "NAME")]
    job_name: Option<String>,

    /// Id of the device group the job targets.
    #[arg(long, value_name = "ID")]
    group_id: String,

    /// Schedule as inline JSON or the path of a JSON file.
    #[arg(long, value_name = "JSON")]
    schedule: String,

    /// Job actions as inline JSON or the path of a JSON file.
    #[arg(long, value_name = "JSON")]
    content: String,

    #[arg(long)]
    description: Option<String>,

    #[command(flatten)]
    batch: BatchArgs,

    #[command(flatten)]
    common: CommonArgs,
}

impl CreateOptions {
    fn payload(&self) -> Result<ScheduledJobPayload> {
        let data = process_json_arg(&self.content, "content")?;
        let schedule = process_json_arg(&self.schedule, "schedule")?;

        Ok(ScheduledJobPayload {
            display_name: self.job_name.clone().unwrap_or_else(|| self.job_id.clone()),
            group: self.group_id.clone(),
            data,
            schedule,
            description: self.description.clone(),
            batch: self.batch.batch(),
            cancellation_threshold: self.batch.cancellation_threshold(),
        })
    }
}

#[derive(clap::Args)]
pub struct UpdateOptions {
    #[arg(long, value_name = "ID")]
    job_id: String,

    #[arg(long, value_name = "NAME")]
    job_name: Option<String>,

    #[arg(long, value_name = "ID")]
    group_id: Option<String>,

    /// Schedule as inline JSON or the path of a JSON file.
    #[arg(long, value_name = "JSON")]
    schedule: Option<String>,

    /// Job actions as inline JSON or the path of a JSON file.
    #[arg(long, value_name = "JSON")]
    content: Option<String>,

    #[arg(long)]
    description: Option<String>,

    #[command(flatten)]
    batch: BatchArgs,

    #[command(flatten)]
    common: CommonArgs,
}

impl UpdateOptions {
    fn patch(&self) -> Result<ScheduledJobPatch> {
        // An empty value leaves the field unchanged.
        let data = match self.content.as_deref() {
            Some("") | None => None,
            Some(content) => Some(process_json_arg(content, "content")?),
        };
        let schedule = match self.schedule.as_deref() {
            Some("") | None => None,
            Some(schedule) => Some(process_json_arg(schedule, "schedule")?),
        };

        Ok(ScheduledJobPatch {
            display_name: self.job_name.clone(),
            group: self.group_id.clone(),
            data,
            schedule,
            description: self.description.clone(),
            batch: self.batch.batch(),
            cancellation_threshold: self.batch.cancellation_threshold(),
        })
    }
}

pub async fn run<W>(options: Options, settings: &Settings, out: &mut W) -> Result<()>
where
    W: Write,
{
    match options {
        Options::List(options) => {
            let client = options.common.client(settings)?;
            let jobs = client
                .list_scheduled_jobs(common::max_pages(options.max_pages, settings))
                .await
                .context("could not list scheduled jobs")?;

            common::write_list(out, options.common.output, &jobs)
        }

        Options::Get(options) => {
            let client = options.common.client(settings)?;
            let job = client
                .get_scheduled_job(&options.job_id)
                .await
                .with_context(|| format!("could not get scheduled job {}", options.job_id))?;

            common::write_one(out, options.common.output, &job)
        }

        Options::Create(options) => {
            let payload = options.payload()?;
            let client = options.common.client(settings)?;

            let job = client
                .create_scheduled_job(&options.job_id, &payload)
                .await
                .with_context(|| format!("could not create scheduled job {}", options.job_id))?;

            common::write_one(out, options.common.output, &job)
        }

        Options::Update(options) => {
            let patch = options.patch()?;
            let client = options.common.client(settings)?;

            let job = client
                .update_scheduled_job(&options.job_id, &patch)
                .await
                .with_context(|| format!("could not update scheduled job {}", options.job_id))?;

            common::write_one(out, options.common.output, &job)
        }

        Options::Delete(options) => {
            let client = options.common.client(settings)?;
            let result = client
                .delete_scheduled_job(&options.job_id)
                .await
                .with_context(|| format!("could not delete scheduled job {}", options.job_id))?;

            common::write_result(out, options.common.output, &result)
        }

        Options::ListRuns(options) => {
            let client = options.common.client(settings)?;
            let runs = client
                .list_scheduled_job_runs(
                    &options.job_id,
                    common::max_pages(options.max_pages, settings),
                )
                .await
                .with_context(|| {
                    format!("could not list runs of scheduled job {}", options.job_id)
                })?;

            common::write_list(out, options.common.output, &runs)
        }
    }
}
