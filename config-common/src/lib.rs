// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod error;
pub use error::Error;

use std::path::{Path, PathBuf};

/// `<config_path>.d`, the directory holding drop-in patches for `config_path`.
pub fn drop_in_directory(config_path: &Path) -> PathBuf {
    let mut directory = config_path.as_os_str().to_owned();
    directory.push(".d");
    PathBuf::from(directory)
}

/// Reads `config_path` and merges every `*.toml` file of `config_directory_path`
/// over it in lexical order. Missing files count as empty tables.
pub fn read_config<TConfig>(
    config_path: &Path,
    config_directory_path: &Path,
) -> Result<TConfig, Error>
where
    TConfig: serde::de::DeserializeOwned,
{
    let mut config = match read_toml(config_path)? {
        Some(config) => config,
        None => toml::Value::Table(toml::map::Map::new()),
    };

    match std::fs::read_dir(config_directory_path) {
        Ok(entries) => {
            let mut patch_paths = vec![];
            for entry in entries {
                let entry = entry.map_err(|err| {
                    Error::ReadConfig(Some(config_directory_path.to_owned()), Box::new(err))
                })?;

                let entry_file_type = entry.file_type().map_err(|err| {
                    Error::ReadConfig(Some(config_directory_path.to_owned()), Box::new(err))
                })?;
                if !entry_file_type.is_file() {
                    continue;
                }

                let patch_path = entry.path();
                if patch_path.extension().and_then(std::ffi::OsStr::to_str) != Some("toml") {
                    continue;
                }

                patch_paths.push(patch_path);
            }
            patch_paths.sort();

            for patch_path in patch_paths {
                if let Some(patch) = read_toml(&patch_path)? {
                    merge_toml(&mut config, patch);
                }
            }
        }

        Err(err) if err.kind() == std::io::ErrorKind::NotFound => (),

        Err(err) => {
            return Err(Error::ReadConfig(
                Some(config_directory_path.to_owned()),
                Box::new(err),
            ))
        }
    }

    let config: TConfig = config
        .try_into()
        .map_err(|err| Error::ReadConfig(None, Box::new(err)))?;

    Ok(config)
}

fn read_toml(path: &Path) -> Result<Option<toml::Value>, Error> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::ReadConfig(Some(path.to_owned()), Box::new(err))),
    };

    let value = toml::from_str(&contents)
        .map_err(|err| Error::ReadConfig(Some(path.to_owned()), Box::new(err)))?;

    Ok(Some(value))
}

fn merge_toml(base: &mut toml::Value, patch: toml::Value) {
    // Tables are merged key by key. Arrays are concatenated. Anything else in
    // the patch replaces the base value.

    if let toml::Value::Table(base) = base {
        if let toml::Value::Table(patch) = patch {
            for (key, value) in patch {
                // Placeholder for keys the base lacks; overwritten by `value` below.
                let base_value = base.entry(key).or_insert(toml::Value::Boolean(false));
                merge_toml(base_value, value);
            }

            return;
        }
    }

    if let toml::Value::Array(base) = base {
        if let toml::Value::Array(patch) = patch {
            base.extend(patch);
            return;
        }
    }

    *base = patch;
}
