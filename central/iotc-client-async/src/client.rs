// Copyright (c) Microsoft. All rights reserved.

use http_common::{CloudConnector, HttpRequest};

use crate::request::{extract_result, split_page};
use crate::{Configuration, Error};

/// Client for the REST API of one IoT Central application.
#[derive(Clone)]
pub struct Client {
    pub(crate) config: Configuration,
    connector: CloudConnector,
}

impl Client {
    pub fn new(config: Configuration) -> Result<Self, Error> {
        config.validate()?;

        let connector = CloudConnector::new(config.proxy().cloned()).map_err(Error::Request)?;

        Ok(Client { config, connector })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub(crate) async fn authorization(&self) -> Result<String, Error> {
        self.config
            .credential()
            .authorization_header(self.config.credential_scopes())
            .await
            .map_err(Error::Credential)
    }

    /// `{base_url}/{base_path}/{segments...}?api-version={version}` with each segment percent-encoded.
    pub(crate) fn resource_url(&self, base_path: &str, segments: &[&str]) -> String {
        let mut url = format!("{}/{}", self.config.base_url(), base_path);

        for segment in segments {
            url.push('/');
            url.extend(percent_encoding::utf8_percent_encode(segment, crate::ENCODE_SET));
        }

        format!("{}?api-version={}", url, self.config.api_version())
    }

    /// Sends one request and unwraps the response envelope.
    pub(crate) async fn send<TBody>(
        &self,
        method: hyper::Method,
        uri: &str,
        body: Option<TBody>,
    ) -> Result<serde_json::Value, Error>
    where
        TBody: serde::Serialize,
    {
        let authorization = self.authorization().await?;

        self.send_with_authorization(method, uri, body, &authorization)
            .await
    }

    async fn send_with_authorization<TBody>(
        &self,
        method: hyper::Method,
        uri: &str,
        body: Option<TBody>,
        authorization: &str,
    ) -> Result<serde_json::Value, Error>
    where
        TBody: serde::Serialize,
    {
        let mut request = HttpRequest::new(self.connector.clone(), method, uri, body)
            .with_retry(self.config.retries())
            .with_timeout(self.config.timeout())
            .with_max_redirects(self.config.max_redirects());

        request
            .add_header(hyper::header::USER_AGENT, self.config.user_agent())
            .map_err(|err| Error::invalid_parameter("user_agent", err))?;
        request
            .add_header(hyper::header::AUTHORIZATION, authorization)
            .map_err(Error::Credential)?;

        let response = request.response().await?;

        extract_result(response)
    }

    /// Fetches `uri` and every page its `nextLink`s lead to, up to `max_pages`
    /// pages (0 for no limit), mapping each item of each page with `map`.
    pub(crate) async fn list_pages<T, F>(
        &self,
        uri: String,
        max_pages: u32,
        map: F,
    ) -> Result<Vec<T>, Error>
    where
        F: Fn(serde_json::Value) -> Result<T, Error>,
    {
        let authorization = self.authorization().await?;

        let mut result = vec![];
        let mut next_uri = Some(uri);
        let mut pages = 0;

        while let Some(uri) = next_uri.take() {
            if max_pages != 0 && pages >= max_pages {
                log::debug!("Stopping after {} pages", pages);
                break;
            }
            pages += 1;

            log::debug!("Fetching page {}: {}", pages, uri);

            let page = self
                .send_with_authorization(hyper::Method::GET, &uri, None::<()>, &authorization)
                .await?;
            let (items, next_link) = split_page(page)?;

            for item in items {
                result.push(map(item)?);
            }

            next_uri = match next_link {
                Some(next_link) => Some(self.next_page_url(&uri, &next_link)?),
                None => None,
            };
        }

        Ok(result)
    }

    /// Resolves `next_link` against the page that returned it and makes sure
    /// it carries an `api-version`.
    fn next_page_url(&self, current: &str, next_link: &str) -> Result<String, Error> {
        let current = url::Url::parse(current).map_err(Error::malformed)?;
        let mut next = current.join(next_link).map_err(|err| {
            Error::malformed(format!("invalid nextLink {:?}: {}", next_link, err))
        })?;

        if !next.query_pairs().any(|(key, _)| key == "api-version") {
            next.query_pairs_mut()
                .append_pair("api-version", self.config.api_version().as_str());
        }

        Ok(next.into())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
