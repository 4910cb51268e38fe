// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod api_version;
pub use api_version::{ApiVersion, ParseApiVersionError};

pub mod device_group;
pub use device_group::{DeviceGroup, DeviceGroupPayload, DeviceGroupPreview, DeviceGroupV1_1Preview};

pub mod scheduled_job;
pub use scheduled_job::{
    JobBatch, JobCancellationThreshold, JobProgress, JobRun, JobValueType, ScheduledJob,
    ScheduledJobPatch, ScheduledJobPayload,
};

/// Returned for operations whose response carries no resource, such as deletes.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct OperationResult {
    pub result: String,
}

impl OperationResult {
    pub fn success() -> Self {
        OperationResult {
            result: "success".to_owned(),
        }
    }
}
