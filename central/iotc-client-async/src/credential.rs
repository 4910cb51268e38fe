// Copyright (c) Microsoft. All rights reserved.

//! Sources of the `Authorization` header sent to IoT Central.

use std::io::{Error, ErrorKind};

#[async_trait::async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns the full header value, scheme included (`Bearer ...`, `SharedAccessSignature ...`).
    async fn authorization_header(&self, scopes: &[String]) -> Result<String, Error>;
}

/// A token supplied by the caller, e.g. an IoT Central API token.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

#[async_trait::async_trait]
impl TokenCredential for StaticToken {
    async fn authorization_header(&self, _scopes: &[String]) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}

/// Obtains an AAD access token from the signed-in Azure CLI.
pub struct AzureCliCredential {
    program: std::ffi::OsString,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        AzureCliCredential {
            program: "az".into(),
        }
    }

    /// Uses a different executable in place of `az`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<std::ffi::OsString>) -> Self {
        self.program = program.into();

        self
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

fn resource_for_scope(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

fn header_from_cli_output(stdout: &[u8]) -> Result<String, Error> {
    let token: AccessToken =
        serde_json::from_slice(stdout).map_err(|err| Error::new(ErrorKind::InvalidData, err))?;

    Ok(format!(
        "{} {}",
        token.token_type.as_deref().unwrap_or("Bearer"),
        token.access_token
    ))
}

#[async_trait::async_trait]
impl TokenCredential for AzureCliCredential {
    async fn authorization_header(&self, scopes: &[String]) -> Result<String, Error> {
        let scope = scopes
            .first()
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "no credential scope configured"))?;
        let resource = resource_for_scope(scope);

        log::debug!("Requesting access token for {} from the Azure CLI", resource);

        let output = tokio::process::Command::new(&self.program)
            .args([
                "account",
                "get-access-token",
                "--resource",
                resource,
                "--output",
                "json",
            ])
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::new(
                ErrorKind::Other,
                format!(
                    "az account get-access-token failed ({}): {}",
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        header_from_cli_output(&output.stdout)
    }
}
