// Copyright (c) Microsoft. All rights reserved.

use iotc_common::{DeviceGroup, DeviceGroupPayload, OperationResult};

use crate::{Client, Error};

const BASE_PATH: &str = "api/deviceGroups";

impl Client {
    pub async fn list_device_groups(&self, max_pages: u32) -> Result<Vec<DeviceGroup>, Error> {
        let api_version = self.config.api_version();
        let uri = self.resource_url(BASE_PATH, &[]);

        self.list_pages(uri, max_pages, |value| {
            DeviceGroup::from_value(api_version, value).map_err(Error::malformed)
        })
        .await
    }

    pub async fn get_device_group(&self, device_group_id: &str) -> Result<DeviceGroup, Error> {
        let uri = self.device_group_url(device_group_id)?;

        let value = self.send(hyper::Method::GET, &uri, None::<()>).await?;
        DeviceGroup::from_value(self.config.api_version(), value).map_err(Error::malformed)
    }

    pub async fn create_device_group(
        &self,
        device_group_id: &str,
        payload: &DeviceGroupPayload,
    ) -> Result<DeviceGroup, Error> {
        let uri = self.device_group_url(device_group_id)?;

        let value = self.send(hyper::Method::PUT, &uri, Some(payload)).await?;
        DeviceGroup::from_value(self.config.api_version(), value).map_err(Error::malformed)
    }

    pub async fn update_device_group(
        &self,
        device_group_id: &str,
        payload: &DeviceGroupPayload,
    ) -> Result<DeviceGroup, Error> {
        let uri = self.device_group_url(device_group_id)?;

        let value = self.send(hyper::Method::PATCH, &uri, Some(payload)).await?;
        DeviceGroup::from_value(self.config.api_version(), value).map_err(Error::malformed)
    }

    pub async fn delete_device_group(&self, device_group_id: &str) -> Result<OperationResult, Error> {
        let uri = self.device_group_url(device_group_id)?;

        self.send(hyper::Method::DELETE, &uri, None::<()>).await?;

        Ok(OperationResult::success())
    }

    fn device_group_url(&self, device_group_id: &str) -> Result<String, Error> {
        if device_group_id.is_empty() {
            return Err(Error::invalid_parameter(
                "device_group_id",
                "must not be empty",
            ));
        }

        Ok(self.resource_url(BASE_PATH, &[device_group_id]))
    }
}

#[cfg(test)]
mod tests {
    use iotc_common::{ApiVersion, DeviceGroup, DeviceGroupPayload, OperationResult};
    use serde_json::json;
    use test_common::{MockServer, Response};

    use crate::client::tests::client;
    use crate::Error;

    fn group(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "displayName": format!("Group {}", id),
            "filter": "SELECT * FROM devices WHERE $provisioned = true",
            "organizations": ["contoso"]
        })
    }

    #[tokio::test]
    async fn list_across_pages() {
        let server = MockServer::start(|req| match req.query_param("$skiptoken") {
            None => Response::ok(json!({
                "value": [group("a"), group("b")],
                "nextLink": format!("{}/api/deviceGroups?$skiptoken=2", req.base_uri())
            })),
            Some(_) => Response::ok(json!({ "value": [group("c")] })),
        })
        .await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let groups = client.list_device_groups(0).await.unwrap();
        let ids: Vec<_> = groups.iter().map(DeviceGroup::id).collect();
        assert_eq!(vec!["a", "b", "c"], ids);
        assert!(matches!(groups[0], DeviceGroup::V1_1Preview(_)));

        let groups = client.list_device_groups(1).await.unwrap();
        assert_eq!(2, groups.len());

        let requests = server.requests();
        assert_eq!(3, requests.len());
        assert!(requests
            .iter()
            .all(|req| req.method == hyper::Method::GET && req.path == "/api/deviceGroups"));
    }

    #[tokio::test]
    async fn preview_schema_is_selected_by_api_version() {
        let server = MockServer::start(|_| Response::ok(group("a"))).await;
        let client = client(&server, ApiVersion::Preview);

        let group = client.get_device_group("a").await.unwrap();
        assert!(matches!(group, DeviceGroup::Preview(_)));
        assert_eq!(Some("Group a"), group.display_name());

        let requests = server.requests();
        assert_eq!("/api/deviceGroups/a", requests[0].path);
        assert_eq!(Some("preview"), requests[0].query_param("api-version"));
    }

    #[tokio::test]
    async fn create_and_update_send_payload() {
        let server = MockServer::start(|req| {
            let mut body = req.json_body().unwrap_or_default();
            body["id"] = json!("thermostats");
            Response::ok(body)
        })
        .await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let payload = DeviceGroupPayload {
            display_name: Some("Thermostats".to_owned()),
            filter: Some("SELECT * FROM devices".to_owned()),
            description: None,
            organizations: Some(vec!["contoso".to_owned()]),
        };
        let group = client
            .create_device_group("thermostats", &payload)
            .await
            .unwrap();
        assert_eq!("thermostats", group.id());

        let patch = DeviceGroupPayload {
            description: Some("All thermostats".to_owned()),
            ..Default::default()
        };
        client
            .update_device_group("thermostats", &patch)
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(hyper::Method::PUT, requests[0].method);
        assert_eq!(Some("application/json"), requests[0].header("content-type"));
        assert_eq!(
            Some(json!({
                "displayName": "Thermostats",
                "filter": "SELECT * FROM devices",
                "organizations": ["contoso"]
            })),
            requests[0].json_body()
        );

        assert_eq!(hyper::Method::PATCH, requests[1].method);
        assert_eq!(
            Some(json!({ "description": "All thermostats" })),
            requests[1].json_body()
        );
    }

    #[tokio::test]
    async fn delete_returns_success() {
        let server = MockServer::start(|_| Response::no_content()).await;
        let client = client(&server, ApiVersion::V2022_07_31);

        assert_eq!(
            OperationResult::success(),
            client.delete_device_group("thermostats").await.unwrap()
        );

        let requests = server.requests();
        assert_eq!(hyper::Method::DELETE, requests[0].method);
        assert_eq!(None, requests[0].header("content-type"));
        assert_eq!(None, requests[0].body);
    }

    #[tokio::test]
    async fn not_found() {
        let server = MockServer::start(|_| Response::error(404, "Device group not found")).await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let err = client.get_device_group("missing").await.unwrap_err();
        assert_eq!(Some(hyper::StatusCode::NOT_FOUND), err.status());
        assert!(err.to_string().contains("Device group not found"));
    }

    #[tokio::test]
    async fn empty_id_is_rejected_locally() {
        let server = MockServer::start(|_| Response::no_content()).await;
        let client = client(&server, ApiVersion::V2022_07_31);

        let err = client.delete_device_group("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter("device_group_id", _)));
        assert!(server.requests().is_empty());
    }
}
