// Copyright (c) Microsoft. All rights reserved.

use crate::ApiVersion;

/// Device group as returned by the `preview` API.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroupPreview {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Device group as returned by `1.1-preview` and every later API version.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroupV1_1Preview {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Query selecting the devices in the group, e.g. `SELECT * FROM devices WHERE $provisioned = true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organizations: Vec<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum DeviceGroup {
    Preview(DeviceGroupPreview),
    V1_1Preview(DeviceGroupV1_1Preview),
}

impl DeviceGroup {
    /// Deserializes `value` with the schema that `api_version` returns.
    pub fn from_value(
        api_version: ApiVersion,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        match api_version {
            ApiVersion::Preview => serde_json::from_value(value).map(DeviceGroup::Preview),
            _ => serde_json::from_value(value).map(DeviceGroup::V1_1Preview),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DeviceGroup::Preview(group) => &group.id,
            DeviceGroup::V1_1Preview(group) => &group.id,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            DeviceGroup::Preview(group) => group.display_name.as_deref(),
            DeviceGroup::V1_1Preview(group) => group.display_name.as_deref(),
        }
    }
}

/// Body of a device group create (PUT) or update (PATCH). Absent fields are not sent.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroupPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizations: Option<Vec<String>>,
}
