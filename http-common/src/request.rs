// Copyright (c) Microsoft. All rights reserved.

use std::io::{Error, ErrorKind};
use std::time::Duration;

use crate::backoff::DEFAULT_BACKOFF;

const CONTENT_TYPE_JSON: &str = "application/json";

/// A single logical HTTP call: retried on transport failures and throttling,
/// and followed across redirects.
pub struct HttpRequest<TBody, TConnector> {
    connector: TConnector,
    method: hyper::Method,
    uri: String,
    headers: http::HeaderMap<http::HeaderValue>,
    body: Option<TBody>,
    timeout: Duration,
    retries: u32,
    max_redirects: u32,
}

impl<TBody, TConnector> HttpRequest<TBody, TConnector>
where
    TBody: serde::Serialize,
    TConnector: Clone + Send + Sync + hyper::client::connect::Connect + 'static,
{
    #[must_use]
    pub fn new(connector: TConnector, method: hyper::Method, uri: &str, body: Option<TBody>) -> Self {
        HttpRequest {
            connector,
            method,
            uri: uri.to_string(),
            headers: http::HeaderMap::default(),
            body,
            timeout: Duration::from_secs(30),
            retries: 0,
            max_redirects: 0,
        }
    }

    #[must_use]
    pub fn get(connector: TConnector, uri: &str) -> Self {
        Self::new(connector, hyper::Method::GET, uri, None)
    }

    #[must_use]
    pub fn put(connector: TConnector, uri: &str, body: TBody) -> Self {
        Self::new(connector, hyper::Method::PUT, uri, Some(body))
    }

    #[must_use]
    pub fn with_retry(mut self, retries: u32) -> Self {
        self.retries = retries;

        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;

        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;

        self
    }

    pub fn add_header(
        &mut self,
        name: hyper::header::HeaderName,
        value: &str,
    ) -> Result<(), Error> {
        let value = http::HeaderValue::from_str(value)
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

        self.headers.insert(name, value);

        Ok(())
    }

    /// Sends the request and downloads the whole response body.
    pub async fn response(self) -> Result<HttpResponse, Error> {
        let client: hyper::Client<_, hyper::Body> =
            hyper::Client::builder().build(self.connector.clone());

        let body = match &self.body {
            Some(body) => Some(hyper::body::Bytes::from(
                serde_json::to_vec(body).map_err(|err| Error::new(ErrorKind::InvalidInput, err))?,
            )),
            None => None,
        };

        let mut method = self.method.clone();
        let mut body = body;
        let mut headers = self.headers.clone();
        let mut uri = self
            .uri
            .parse::<hyper::Uri>()
            .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
        let mut redirects = 0;

        loop {
            log::debug!("{} {}", method, uri);

            let response = self
                .process_request(&client, &method, &uri, &headers, body.clone())
                .await?;

            log::debug!("{} {} -> {}", method, uri, response.status);

            let location = if is_redirect(response.status) {
                response.headers.get(hyper::header::LOCATION).cloned()
            } else {
                None
            };

            let Some(location) = location else {
                return Ok(response);
            };

            if redirects >= self.max_redirects {
                return Err(Error::new(
                    ErrorKind::Other,
                    format!("too many redirects (limit {})", self.max_redirects),
                ));
            }
            redirects += 1;

            let next_uri = resolve_location(&uri, &location)?;

            // Credentials are only meant for the origin they were issued for.
            if next_uri.scheme() != uri.scheme() || next_uri.authority() != uri.authority() {
                headers.remove(hyper::header::AUTHORIZATION);
            }

            if response.status == hyper::StatusCode::SEE_OTHER {
                method = hyper::Method::GET;
                body = None;
            }

            log::debug!("Following {} redirect to {}", response.status, next_uri);
            uri = next_uri;
        }
    }

    async fn process_request(
        &self,
        client: &hyper::Client<TConnector, hyper::Body>,
        method: &hyper::Method,
        uri: &hyper::Uri,
        headers: &http::HeaderMap<http::HeaderValue>,
        body: Option<hyper::body::Bytes>,
    ) -> Result<HttpResponse, Error> {
        let mut current_attempt = 1;

        loop {
            let mut request = hyper::Request::builder().method(method).uri(uri);

            let request_body = if let Some(body) = &body {
                request = request.header(hyper::header::CONTENT_TYPE, CONTENT_TYPE_JSON);

                hyper::Body::from(body.clone())
            } else {
                hyper::Body::empty()
            };

            for (header_name, header_value) in headers {
                request = request.header(header_name, header_value);
            }

            let request = request
                .body(request_body)
                .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

            let response_future = async {
                match client.request(request).await {
                    Ok(response) => {
                        let (
                            http::response::Parts {
                                status, headers, ..
                            },
                            body,
                        ) = response.into_parts();

                        // Make sure to download body inside the timeout
                        let body = hyper::body::to_bytes(body)
                            .await
                            .map_err(|err| Error::new(ErrorKind::Other, err))?;

                        Ok(HttpResponse {
                            status,
                            headers,
                            body,
                        })
                    }

                    Err(err) => {
                        if err.is_connect() {
                            // Network error.
                            Err(Error::new(ErrorKind::NotConnected, err))
                        } else {
                            Err(Error::new(ErrorKind::Other, err))
                        }
                    }
                }
            };

            let err = match tokio::time::timeout(self.timeout, response_future).await {
                Ok(Ok(response)) if is_throttled(response.status) => {
                    let max_attempts = self.retries.min(DEFAULT_BACKOFF.max_retries()) + 1;

                    let backoff_duration = if current_attempt < max_attempts {
                        DEFAULT_BACKOFF
                            .get_throttle_duration(current_attempt, retry_after(&response.headers))
                    } else {
                        None
                    };

                    // The last throttled response is handed back for the caller to report.
                    let Some(backoff_duration) = backoff_duration else {
                        log::warn!(
                            "Final HTTP request throttled (attempt {} of {}).",
                            current_attempt,
                            max_attempts,
                        );
                        return Ok(response);
                    };

                    log::warn!(
                        "HTTP request throttled (attempt {} of {}). Sleeping for {} seconds.",
                        current_attempt,
                        max_attempts,
                        backoff_duration.as_secs()
                    );
                    tokio::time::sleep(backoff_duration).await;

                    current_attempt += 1;
                    continue;
                }
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(err)) => err,
                Err(timeout) => timeout.into(),
            };

            log::warn!(
                "Failed to send HTTP request (attempt {} of {}): {}",
                current_attempt,
                self.retries + 1,
                err
            );

            if current_attempt > self.retries {
                return Err(err);
            }

            // Wait a short time between failed requests.
            tokio::time::sleep(Duration::from_secs(3)).await;

            current_attempt += 1;
        }
    }
}

fn is_throttled(status: hyper::StatusCode) -> bool {
    status == hyper::StatusCode::TOO_MANY_REQUESTS
        || status == hyper::StatusCode::SERVICE_UNAVAILABLE
}

fn is_redirect(status: hyper::StatusCode) -> bool {
    matches!(
        status,
        hyper::StatusCode::MOVED_PERMANENTLY
            | hyper::StatusCode::FOUND
            | hyper::StatusCode::SEE_OTHER
            | hyper::StatusCode::TEMPORARY_REDIRECT
            | hyper::StatusCode::PERMANENT_REDIRECT
    )
}

fn resolve_location(base: &hyper::Uri, location: &http::HeaderValue) -> Result<hyper::Uri, Error> {
    let location = location
        .to_str()
        .map_err(|err| Error::new(ErrorKind::InvalidData, err))?;

    let base = url::Url::parse(&base.to_string())
        .map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
    let next = base
        .join(location)
        .map_err(|err| Error::new(ErrorKind::InvalidData, err))?;

    next.as_str()
        .parse()
        .map_err(|err| Error::new(ErrorKind::InvalidData, err))
}

/// Parses a `Retry-After` header given in seconds. HTTP-date values are ignored.
fn retry_after(headers: &http::HeaderMap<http::HeaderValue>) -> Option<Duration> {
    let value = headers.get(hyper::header::RETRY_AFTER)?.to_str().ok()?;
    let seconds = value.trim().parse::<u64>().ok()?;

    Some(Duration::from_secs(seconds))
}

#[derive(Debug)]
pub struct HttpResponse {
    status: hyper::StatusCode,
    headers: http::HeaderMap<http::HeaderValue>,
    body: hyper::body::Bytes,
}

impl HttpResponse {
    pub fn into_parts(self) -> (hyper::StatusCode, hyper::body::Bytes) {
        (self.status, self.body)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_common::{MockServer, Response};

    use super::HttpRequest;

    fn connector() -> crate::CloudConnector {
        crate::CloudConnector::new(None).unwrap()
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = http::HeaderMap::new();
        assert_eq!(None, super::retry_after(&headers));

        headers.insert(
            hyper::header::RETRY_AFTER,
            http::HeaderValue::from_static("7"),
        );
        assert_eq!(Some(Duration::from_secs(7)), super::retry_after(&headers));

        headers.insert(
            hyper::header::RETRY_AFTER,
            http::HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(None, super::retry_after(&headers));
    }

    #[test]
    fn relative_location() {
        let base = "https://myapp.azureiotcentral.com/api/deviceGroups?api-version=2022-07-31"
            .parse::<hyper::Uri>()
            .unwrap();

        let next = super::resolve_location(
            &base,
            &http::HeaderValue::from_static("/api/v2/deviceGroups"),
        )
        .unwrap();
        assert_eq!(
            "https://myapp.azureiotcentral.com/api/v2/deviceGroups",
            next.to_string()
        );

        let next = super::resolve_location(
            &base,
            &http::HeaderValue::from_static("https://other.example.com/x"),
        )
        .unwrap();
        assert_eq!(Some("other.example.com"), next.host());
    }

    #[tokio::test]
    async fn json_body_sets_content_type() {
        let server = MockServer::start(|_| Response::json(200, serde_json::json!({}))).await;

        let uri = format!("{}/api/deviceGroups/group1", server.uri());
        let request = HttpRequest::put(connector(), &uri, serde_json::json!({ "displayName": "g" }));
        let (status, _) = request.response().await.unwrap().into_parts();
        assert_eq!(hyper::StatusCode::OK, status);

        let request: HttpRequest<(), _> = HttpRequest::get(connector(), &uri);
        request.response().await.unwrap();

        let requests = server.requests();
        assert_eq!(2, requests.len());
        assert_eq!(Some("application/json"), requests[0].header("content-type"));
        assert_eq!(
            Some(serde_json::json!({ "displayName": "g" })),
            requests[0].json_body()
        );
        assert_eq!(None, requests[1].header("content-type"));
        assert_eq!(None, requests[1].body);
    }

    #[tokio::test]
    async fn redirect_is_followed_with_headers() {
        let server = MockServer::start(|req| {
            if req.path == "/old" {
                Response::redirect(307, "/new")
            } else {
                Response::json(200, serde_json::json!({ "path": req.path }))
            }
        })
        .await;

        let mut request: HttpRequest<(), _> =
            HttpRequest::get(connector(), &format!("{}/old", server.uri())).with_max_redirects(1);
        request
            .add_header(hyper::header::AUTHORIZATION, "Bearer abc")
            .unwrap();

        let response = request.response().await.unwrap();
        let (status, body) = response.into_parts();
        assert_eq!(hyper::StatusCode::OK, status);
        assert_eq!(
            serde_json::json!({ "path": "/new" }),
            serde_json::from_slice::<serde_json::Value>(&body).unwrap()
        );

        let requests = server.requests();
        assert_eq!(2, requests.len());
        assert_eq!(Some("Bearer abc"), requests[1].header("authorization"));
    }

    #[tokio::test]
    async fn redirect_to_other_origin_drops_authorization() {
        let other = MockServer::start(|_| Response::json(200, serde_json::json!({}))).await;
        let location = format!("{}/new", other.uri());
        let server = MockServer::start(move |_| Response::redirect(307, location.clone())).await;

        let mut request: HttpRequest<(), _> =
            HttpRequest::get(connector(), &format!("{}/old", server.uri())).with_max_redirects(1);
        request
            .add_header(hyper::header::AUTHORIZATION, "Bearer abc")
            .unwrap();

        let (status, _) = request.response().await.unwrap().into_parts();
        assert_eq!(hyper::StatusCode::OK, status);

        // Same host, different port.
        assert_eq!(Some("Bearer abc"), server.requests()[0].header("authorization"));
        let requests = other.requests();
        assert_eq!(1, requests.len());
        assert_eq!("/new", requests[0].path);
        assert_eq!(None, requests[0].header("authorization"));
    }

    #[tokio::test]
    async fn throttled_request_is_retried() {
        let count = std::sync::atomic::AtomicUsize::new(0);
        let server = MockServer::start(move |_| {
            if count.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                Response::throttled(429, "0")
            } else {
                Response::json(200, serde_json::json!({ "ok": true }))
            }
        })
        .await;

        let request: HttpRequest<(), _> = HttpRequest::get(connector(), &server.uri()).with_retry(3);
        let (status, body) = request.response().await.unwrap().into_parts();
        assert_eq!(hyper::StatusCode::OK, status);
        assert_eq!(
            serde_json::json!({ "ok": true }),
            serde_json::from_slice::<serde_json::Value>(&body).unwrap()
        );
        assert_eq!(2, server.requests().len());
    }

    #[tokio::test]
    async fn throttling_is_bounded_by_retry_count() {
        let server = MockServer::start(|_| Response::throttled(503, "0")).await;

        let request: HttpRequest<(), _> = HttpRequest::get(connector(), &server.uri()).with_retry(1);
        let (status, body) = request.response().await.unwrap().into_parts();
        assert_eq!(hyper::StatusCode::SERVICE_UNAVAILABLE, status);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!("Too many requests", body["error"]["message"]);
        assert_eq!(2, server.requests().len());

        let request: HttpRequest<(), _> = HttpRequest::get(connector(), &server.uri()).with_retry(0);
        let (status, _) = request.response().await.unwrap().into_parts();
        assert_eq!(hyper::StatusCode::SERVICE_UNAVAILABLE, status);
        assert_eq!(3, server.requests().len());
    }

    #[tokio::test]
    async fn redirect_limit() {
        let server = MockServer::start(|_| Response::redirect(302, "/again")).await;

        let request: HttpRequest<(), _> =
            HttpRequest::get(connector(), &format!("{}/start", server.uri())).with_max_redirects(2);
        let err = request.response().await.unwrap_err();
        assert!(err.to_string().contains("too many redirects"));
        assert_eq!(3, server.requests().len());
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        let server = MockServer::start(|_| Response::no_content()).await;
        let uri = server.uri();
        drop(server);

        let request: HttpRequest<(), _> = HttpRequest::get(connector(), &uri)
            .with_timeout(Duration::from_secs(5));
        assert!(request.response().await.is_err());
    }
}
