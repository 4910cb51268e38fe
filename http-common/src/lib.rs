// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

mod backoff;

mod proxy;
pub use proxy::{get_proxy_uri, MaybeProxyConnector, MaybeProxyStream};

mod request;
pub use request::{HttpRequest, HttpResponse};

/// Connector used for every request to the cloud: TLS, optionally tunneled through an HTTPS proxy.
pub type CloudConnector =
    MaybeProxyConnector<hyper_openssl::HttpsConnector<hyper::client::HttpConnector>>;

/// Ref <https://url.spec.whatwg.org/#path-percent-encode-set>, plus the characters that
/// would otherwise split or escape a single path segment.
pub const PATH_SEGMENT_ENCODE_SET: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`') // fragment percent-encode set
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}') // path percent-encode set
    .add(b'/')
    .add(b'%');
