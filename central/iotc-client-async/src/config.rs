// Copyright (c) Microsoft. All rights reserved.

use std::sync::Arc;
use std::time::Duration;

use iotc_common::ApiVersion;

use crate::credential::TokenCredential;
use crate::Error;

pub const DEFAULT_BASE_DOMAIN: &str = "azureiotcentral.com";
pub const DEFAULT_API_VERSION: ApiVersion = ApiVersion::V2022_06_30Preview;
pub const DEFAULT_CREDENTIAL_SCOPE: &str = "https://apps.azureiotcentral.com/.default";

const USER_AGENT: &str = concat!("iotcentral/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_MAX_REDIRECTS: u32 = 30;

/// Settings shared by every request a [`crate::Client`] sends.
#[derive(Clone)]
pub struct Configuration {
    subdomain: String,
    base_domain: String,
    api_version: ApiVersion,
    credential: Arc<dyn TokenCredential>,
    credential_scopes: Vec<String>,
    user_agent: String,
    timeout: Duration,
    retries: u32,
    max_redirects: u32,
    proxy: Option<hyper::Uri>,
    endpoint: Option<String>,
}

impl Configuration {
    pub fn new(subdomain: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Configuration {
            subdomain: subdomain.into(),
            base_domain: DEFAULT_BASE_DOMAIN.to_owned(),
            api_version: DEFAULT_API_VERSION,
            credential,
            credential_scopes: vec![DEFAULT_CREDENTIAL_SCOPE.to_owned()],
            user_agent: USER_AGENT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            proxy: None,
            endpoint: None,
        }
    }

    #[must_use]
    pub fn with_base_domain(mut self, base_domain: impl Into<String>) -> Self {
        self.base_domain = base_domain.into();

        self
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;

        self
    }

    #[must_use]
    pub fn with_credential_scopes(mut self, credential_scopes: Vec<String>) -> Self {
        self.credential_scopes = credential_scopes;

        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();

        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;

        self
    }

    #[must_use]
    pub fn with_retry(mut self, retries: u32) -> Self {
        self.retries = retries;

        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;

        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<hyper::Uri>) -> Self {
        self.proxy = proxy;

        self
    }

    /// Sends requests to `endpoint` instead of `https://{subdomain}.{base_domain}`.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());

        self
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn credential(&self) -> &Arc<dyn TokenCredential> {
        &self.credential
    }

    pub fn credential_scopes(&self) -> &[String] {
        &self.credential_scopes
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    pub fn proxy(&self) -> Option<&hyper::Uri> {
        self.proxy.as_ref()
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.subdomain.trim().is_empty() {
            return Err(Error::invalid_parameter("subdomain", "must not be empty"));
        }

        if self.base_domain.trim().is_empty() {
            return Err(Error::invalid_parameter("base_domain", "must not be empty"));
        }

        Ok(())
    }

    /// Scheme and authority of the application, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_owned(),
            None => format!("https://{}.{}", self.subdomain, self.base_domain),
        }
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("subdomain", &self.subdomain)
            .field("base_domain", &self.base_domain)
            .field("api_version", &self.api_version)
            .field("credential_scopes", &self.credential_scopes)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("max_redirects", &self.max_redirects)
            .field("proxy", &self.proxy)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
