// Copyright (c) Microsoft. All rights reserved.

use std::io::Write;

use anyhow::{Context, Result};

use iotc_common::DeviceGroupPayload;

use crate::internal::common::{self, CommonArgs};
use crate::settings::Settings;

#[derive(clap::Subcommand)]
pub enum Options {
    /// List the device groups of an application.
    List(ListOptions),

    /// Show one device group.
    Get(IdOptions),

    /// Create a device group.
    Create(CreateOptions),

    /// Update some fields of a device group.
    Update(UpdateOptions),

    /// Delete a device group.
    Delete(IdOptions),
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
    device_group_id: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args)]
pub struct CreateOptions {
    #[arg(long, value_name = "ID")]
    device_group_id: String,

    #[arg(long, value_name = "NAME")]
    display_name: String,

    /// Query selecting the devices of the group,
    /// e.g. "SELECT * FROM devices WHERE $provisioned = true".
    #[arg(long, value_name = "QUERY")]
    filter: String,

    #[arg(long)]
    description: Option<String>,

    /// Comma-separated organization ids.
    #[arg(long, value_name = "ORGANIZATIONS", value_delimiter = ',')]
    organizations: Option<Vec<String>>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args)]
pub struct UpdateOptions {
    #[arg(long, value_name = "ID")]
    device_group_id: String,

    #[arg(long, value_name = "NAME")]
    display_name: Option<String>,

    #[arg(long, value_name = "QUERY")]
    filter: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Comma-separated organization ids.
    #[arg(long, value_name = "ORGANIZATIONS", value_delimiter = ',')]
    organizations: Option<Vec<String>>,

    #[command(flatten)]
    common: CommonArgs,
}

pub async fn run<W>(options: Options, settings: &Settings, out: &mut W) -> Result<()>
where
    W: Write,
{
    match options {
        Options::List(options) => {
            let client = options.common.client(settings)?;
            let groups = client
                .list_device_groups(common::max_pages(options.max_pages, settings))
                .await
                .context("could not list device groups")?;

            common::write_list(out, options.common.output, &groups)
        }

        Options::Get(options) => {
            let client = options.common.client(settings)?;
            let group = client
                .get_device_group(&options.device_group_id)
                .await
                .with_context(|| format!("could not get device group {}", options.device_group_id))?;

            common::write_one(out, options.common.output, &group)
        }

        Options::Create(options) => {
            let client = options.common.client(settings)?;
            let payload = DeviceGroupPayload {
                display_name: Some(options.display_name),
                filter: Some(options.filter),
                description: options.description,
                organizations: options.organizations,
            };

            let group = client
                .create_device_group(&options.device_group_id, &payload)
                .await
                .with_context(|| {
                    format!("could not create device group {}", options.device_group_id)
                })?;

            common::write_one(out, options.common.output, &group)
        }

        Options::Update(options) => {
            let client = options.common.client(settings)?;
            let payload = DeviceGroupPayload {
                display_name: options.display_name,
                filter: options.filter,
                description: options.description,
                organizations: options.organizations,
            };

            let group = client
                .update_device_group(&options.device_group_id, &payload)
                .await
                .with_context(|| {
                    format!("could not update device group {}", options.device_group_id)
                })?;

            common::write_one(out, options.common.output, &group)
        }

        Options::Delete(options) => {
            let client = options.common.client(settings)?;
            let result = client
                .delete_device_group(&options.device_group_id)
                .await
                .with_context(|| {
                    format!("could not delete device group {}", options.device_group_id)
                })?;

            common::write_result(out, options.common.output, &result)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_common::{MockServer, Response};

    use crate::settings::Settings;

    async fn run(server: &MockServer, args: &[&str]) -> anyhow::Result<String> {
        let endpoint = server.uri();
        let mut argv = vec!["iotcctl", "device-group"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&[
            "--app-id",
            "myapp",
            "--token",
            "Bearer t",
            "--endpoint",
            endpoint.as_str(),
        ]);

        let options = <crate::Options as clap::Parser>::try_parse_from(argv)?;
        let crate::Command::DeviceGroup(options) = options.command else {
            panic!("expected device-group command");
        };

        let mut out = vec![];
        super::run(options, &Settings::default(), &mut out).await?;

        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn create_with_organizations() {
        let server = MockServer::start(|req| {
            let mut body = req.json_body().unwrap_or_default();
            body["id"] = json!("thermostats");
            Response::ok(body)
        })
        .await;

        let out = run(
            &server,
            &[
                "create",
                "--device-group-id",
                "thermostats",
                "--display-name",
                "Thermostats",
                "--filter",
                "SELECT * FROM devices",
                "--organizations",
                "contoso,fabrikam",
            ],
        )
        .await
        .unwrap();
        let out: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!("thermostats", out["id"]);

        let requests = server.requests();
        assert_eq!("PUT", requests[0].method.as_str());
        assert_eq!("/api/deviceGroups/thermostats", requests[0].path);
        assert_eq!(Some("2022-07-31"), requests[0].query_param("api-version"));
        assert_eq!(Some("Bearer t"), requests[0].header("authorization"));
        assert_eq!(
            Some(json!({
                "displayName": "Thermostats",
                "filter": "SELECT * FROM devices",
                "organizations": ["contoso", "fabrikam"]
            })),
            requests[0].json_body()
        );
    }

    #[tokio::test]
    async fn list_as_table() {
        let server = MockServer::start(|_| {
            Response::ok(json!({
                "value": [
                    { "id": "thermostats", "displayName": "Thermostats" },
                    { "id": "fans" }
                ]
            }))
        })
        .await;

        let out = run(&server, &["list", "--output", "table", "--max-pages", "1"])
            .await
            .unwrap();
        assert_eq!(
            "ID           DISPLAY NAME\nthermostats  Thermostats\nfans         \n",
            out
        );
    }

    #[tokio::test]
    async fn update_sends_only_given_fields() {
        let server = MockServer::start(|_| Response::ok(json!({ "id": "thermostats" }))).await;

        run(
            &server,
            &[
                "update",
                "--device-group-id",
                "thermostats",
                "--description",
                "All thermostats",
            ],
        )
        .await
        .unwrap();

        let requests = server.requests();
        assert_eq!("PATCH", requests[0].method.as_str());
        assert_eq!(
            Some(json!({ "description": "All thermostats" })),
            requests[0].json_body()
        );
    }

    #[tokio::test]
    async fn service_error_is_reported() {
        let server = MockServer::start(|_| Response::error(403, "Forbidden for this token")).await;

        let err = run(&server, &["get", "--device-group-id", "thermostats"])
            .await
            .unwrap_err();
        let err = format!("{:#}", err);
        assert!(err.contains("could not get device group thermostats"));
        assert!(err.contains("Forbidden for this token"));
    }
}
