// Copyright (c) Microsoft. All rights reserved.

use http_common::HttpResponse;

use crate::Error;

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetails {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

/// Unwraps the JSON envelope of an IoT Central response.
pub(crate) fn extract_result(response: HttpResponse) -> Result<serde_json::Value, Error> {
    let (status, body) = response.into_parts();
    let is_empty = body.iter().all(u8::is_ascii_whitespace);

    if status.is_success() && (status == hyper::StatusCode::NO_CONTENT || is_empty) {
        return Ok(serde_json::json!({ "result": "success" }));
    }

    let value = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => value,

        Err(_) if !status.is_success() => {
            let message = if is_empty {
                status.canonical_reason().unwrap_or("no response body").to_owned()
            } else {
                String::from_utf8_lossy(&body).trim().to_owned()
            };

            return Err(Error::Api {
                status,
                code: None,
                message,
                request_id: None,
            });
        }

        Err(err) => return Err(Error::malformed(err)),
    };

    if let Some(error) = value.get("error") {
        let details: ErrorDetails = serde_json::from_value(error.clone()).unwrap_or_default();

        return Err(Error::Api {
            status,
            code: details.code,
            message: details
                .message
                .unwrap_or_else(|| error.to_string()),
            request_id: details.request_id,
        });
    }

    if !status.is_success() {
        return Err(Error::Api {
            status,
            code: None,
            message: value.to_string(),
            request_id: None,
        });
    }

    Ok(value)
}

pub(crate) fn parse_model<T>(value: serde_json::Value) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value).map_err(Error::malformed)
}

/// Splits a list page into its items and the link to the next page.
pub(crate) fn split_page(
    mut page: serde_json::Value,
) -> Result<(Vec<serde_json::Value>, Option<String>), Error> {
    let next_link = match page.get("nextLink") {
        Some(serde_json::Value::String(next_link)) if !next_link.is_empty() => {
            Some(next_link.clone())
        }
        Some(serde_json::Value::Null | serde_json::Value::String(_)) | None => None,
        Some(other) => {
            return Err(Error::malformed(format!(
                "nextLink is not a string: {}",
                other
            )))
        }
    };

    match page.get_mut("value").map(serde_json::Value::take) {
        Some(serde_json::Value::Array(items)) => Ok((items, next_link)),
        Some(_) => Err(Error::malformed("value is not an array")),
        None => Err(Error::malformed("value is not present in body")),
    }
}
