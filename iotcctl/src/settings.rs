// Copyright (c) Microsoft. All rights reserved.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use iotc_common::ApiVersion;

const CONFIG_PATH_ENV_VAR: &str = "IOTCCTL_CONFIG";

/// Defaults read from the settings file. Command-line flags take precedence.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub central_dns_suffix: Option<String>,
    pub api_version: Option<ApiVersion>,
    pub cloud_timeout_sec: Option<u64>,
    pub cloud_retries: Option<u32>,
    pub max_pages: Option<u32>,
    pub https_proxy: Option<String>,
    pub token: Option<String>,
}

impl Settings {
    /// Loads `path`, or the default settings file if no path is given, along
    /// with its `.d` drop-ins. Missing files yield empty settings.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_owned).or_else(default_path) else {
            return Ok(Settings::default());
        };

        log::debug!("Reading settings from {}", path.display());

        let settings =
            config_common::read_config(&path, &config_common::drop_in_directory(&path))
                .with_context(|| format!("could not load settings from {}", path.display()))?;

        Ok(settings)
    }
}

fn default_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV_VAR).filter(|path| !path.is_empty()) {
        return Some(path.into());
    }

    let home = std::env::var_os("HOME").filter(|home| !home.is_empty())?;

    Some(
        Path::new(&home)
            .join(".config")
            .join("iotcctl")
            .join("config.toml"),
    )
}
