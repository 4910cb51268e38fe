// Copyright (c) Microsoft. All rights reserved.

//! A local stand-in for an IoT Central application. Every request is recorded
//! and answered by a caller-supplied handler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Handler = Arc<dyn Fn(&RecordedRequest) -> Response + Send + Sync>;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: hyper::Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl RecordedRequest {
    async fn from_http(req: hyper::Request<hyper::Body>) -> Result<Self, Response> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req
            .uri()
            .query()
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        let mut headers = HashMap::with_capacity(req.headers().len());
        for (key, value) in req.headers() {
            let value = value
                .to_str()
                .map_err(|_| Response::error(400, "bad header value"))?;

            headers.insert(key.as_str().to_lowercase(), value.to_string());
        }

        let body = hyper::body::to_bytes(req.into_body())
            .await
            .map_err(|_| Response::error(400, "unable to get body"))?;

        let body = if body.is_empty() {
            None
        } else {
            let body = std::str::from_utf8(&body)
                .map_err(|_| Response::error(400, "unable to parse body"))?;

            Some(body.to_string())
        };

        Ok(RecordedRequest {
            method,
            path,
            query,
            headers,
            body,
        })
    }

    /// Header lookup by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn json_body(&self) -> Option<serde_json::Value> {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }

    /// `http://{host}` as seen by the client, for building absolute links.
    pub fn base_uri(&self) -> String {
        format!("http://{}", self.header("host").unwrap_or("localhost"))
    }
}

#[derive(Clone, Debug)]
pub enum Response {
    Json {
        status: hyper::StatusCode,
        body: String,
    },

    Raw {
        status: hyper::StatusCode,
        content_type: Option<&'static str>,
        body: String,
    },

    Redirect {
        status: hyper::StatusCode,
        location: String,
    },

    Throttled {
        status: hyper::StatusCode,
        retry_after: String,
        body: String,
    },
}

impl Response {
    pub fn json(status: u16, body: impl serde::Serialize) -> Self {
        Response::Json {
            status: status_code(status),
            body: serde_json::to_string(&body).unwrap(),
        }
    }

    pub fn ok(body: impl serde::Serialize) -> Self {
        Self::json(200, body)
    }

    pub fn no_content() -> Self {
        Response::Raw {
            status: hyper::StatusCode::NO_CONTENT,
            content_type: None,
            body: String::new(),
        }
    }

    pub fn raw(status: u16, content_type: Option<&'static str>, body: impl Into<String>) -> Self {
        Response::Raw {
            status: status_code(status),
            content_type,
            body: body.into(),
        }
    }

    /// An IoT Central style error envelope.
    pub fn error(status: u16, message: impl std::fmt::Display) -> Self {
        Self::json(
            status,
            serde_json::json!({
                "error": {
                    "code": status_code(status).canonical_reason().unwrap_or("Error").replace(' ', ""),
                    "message": message.to_string(),
                    "requestId": "00000000-0000-0000-0000-000000000000",
                }
            }),
        )
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Response::Redirect {
            status: status_code(status),
            location: location.into(),
        }
    }

    /// An error envelope carrying a `Retry-After` header.
    pub fn throttled(status: u16, retry_after: impl Into<String>) -> Self {
        let Response::Json { status, body } = Self::error(status, "Too many requests") else {
            unreachable!();
        };

        Response::Throttled {
            status,
            retry_after: retry_after.into(),
            body,
        }
    }

    fn into_http(self) -> hyper::Response<hyper::Body> {
        let response = hyper::Response::builder();

        let response = match self {
            Response::Json { status, body } => response
                .status(status)
                .header(hyper::header::CONTENT_TYPE, "application/json")
                .body(hyper::Body::from(body)),

            Response::Raw {
                status,
                content_type,
                body,
            } => {
                let mut response = response.status(status);
                if let Some(content_type) = content_type {
                    response = response.header(hyper::header::CONTENT_TYPE, content_type);
                }

                response.body(hyper::Body::from(body))
            }

            Response::Redirect { status, location } => response
                .status(status)
                .header(hyper::header::LOCATION, location)
                .body(hyper::Body::empty()),

            Response::Throttled {
                status,
                retry_after,
                body,
            } => response
                .status(status)
                .header(hyper::header::CONTENT_TYPE, "application/json")
                .header(hyper::header::RETRY_AFTER, retry_after)
                .body(hyper::Body::from(body)),
        };

        response.unwrap()
    }
}

fn status_code(status: u16) -> hyper::StatusCode {
    hyper::StatusCode::from_u16(status).unwrap()
}

pub struct MockServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
}

impl MockServer {
    /// Binds to an ephemeral port on the loopback interface and starts serving.
    /// Must be called from within a tokio runtime.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Response + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();

        let make_service = {
            let requests = requests.clone();

            hyper::service::make_service_fn(move |_| {
                let handler = handler.clone();
                let requests = requests.clone();

                let service = hyper::service::service_fn(move |req| {
                    serve_request(handler.clone(), requests.clone(), req)
                });

                async move { Ok::<_, std::convert::Infallible>(service) }
            })
        };

        let server = hyper::Server::bind(&([127, 0, 0, 1], 0).into()).serve(make_service);
        let addr = server.local_addr();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        tokio::spawn(server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        }));

        MockServer {
            addr,
            requests,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

async fn serve_request(
    handler: Handler,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    req: hyper::Request<hyper::Body>,
) -> Result<hyper::Response<hyper::Body>, std::convert::Infallible> {
    let req = match RecordedRequest::from_http(req).await {
        Ok(req) => req,
        Err(response) => return Ok(response.into_http()),
    };

    requests.lock().unwrap().push(req.clone());

    Ok(handler(&req).into_http())
}
