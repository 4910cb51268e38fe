// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod client;
pub use client::Client;

mod config;
pub use config::{
    Configuration, DEFAULT_API_VERSION, DEFAULT_BASE_DOMAIN, DEFAULT_CREDENTIAL_SCOPE,
};

pub mod credential;
pub use credential::{AzureCliCredential, StaticToken, TokenCredential};

mod device_group;

mod error;
pub use error::Error;

mod request;

mod scheduled_job;

const ENCODE_SET: &percent_encoding::AsciiSet = http_common::PATH_SEGMENT_ENCODE_SET;
