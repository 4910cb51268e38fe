// Copyright (c) Microsoft. All rights reserved.

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::{io, io::IoSlice};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

pub enum MaybeProxyStream<S> {
    NoProxy(S),
    Proxy(hyper_proxy::ProxyStream<S>),
}

// Forwards a poll call to whichever stream is active.
macro_rules! forward {
    ($self:expr, $s:ident => $call:expr) => {
        match $self {
            MaybeProxyStream::NoProxy($s) => $call,
            MaybeProxyStream::Proxy($s) => $call,
        }
    };
}

impl<S> AsyncRead for MaybeProxyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        forward!(&mut *self, s => Pin::new(s).poll_read(cx, buf))
    }
}

impl<S> AsyncWrite for MaybeProxyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        forward!(&mut *self, s => Pin::new(s).poll_write(cx, buf))
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        forward!(&mut *self, s => Pin::new(s).poll_write_vectored(cx, bufs))
    }

    fn is_write_vectored(&self) -> bool {
        forward!(self, s => s.is_write_vectored())
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        forward!(&mut *self, s => Pin::new(s).poll_flush(cx))
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        forward!(&mut *self, s => Pin::new(s).poll_shutdown(cx))
    }
}

impl<S> hyper::client::connect::Connection for MaybeProxyStream<S>
where
    S: hyper::client::connect::Connection,
    hyper_proxy::ProxyStream<S>: hyper::client::connect::Connection,
{
    fn connected(&self) -> hyper::client::connect::Connected {
        forward!(self, s => s.connected())
    }
}

#[derive(Clone)]
pub enum MaybeProxyConnector<C> {
    NoProxy(C),
    Proxy(hyper_proxy::ProxyConnector<C>),
}

impl MaybeProxyConnector<hyper_openssl::HttpsConnector<hyper::client::HttpConnector>> {
    /// Builds a connector that speaks TLS to `https` URIs and plain TCP to `http` URIs,
    /// trusting the system certificate store.
    pub fn new(proxy_uri: Option<hyper::Uri>) -> io::Result<Self> {
        let mut http_connector = hyper::client::HttpConnector::new();
        http_connector.enforce_http(false);

        let tls_connector = openssl::ssl::SslConnector::builder(openssl::ssl::SslMethod::tls())?;

        let https_connector =
            hyper_openssl::HttpsConnector::with_connector(http_connector, tls_connector)?;

        let Some(proxy_uri) = proxy_uri else {
            return Ok(MaybeProxyConnector::NoProxy(https_connector));
        };

        let proxy = uri_to_proxy(proxy_uri)?;
        let mut proxy_connector = hyper_proxy::ProxyConnector::from_proxy(https_connector, proxy)?;

        // The connector above was consumed by the HTTPS connector, so the tunnel
        // to the proxied destination gets a fresh one with the same settings.
        let proxy_tls_connector =
            openssl::ssl::SslConnector::builder(openssl::ssl::SslMethod::tls())?;
        proxy_connector.set_tls(Some(proxy_tls_connector.build()));

        Ok(MaybeProxyConnector::Proxy(proxy_connector))
    }
}

impl<C> hyper::service::Service<http::uri::Uri> for MaybeProxyConnector<C>
where
    C: hyper::service::Service<http::uri::Uri> + Send + Unpin + Clone + 'static,
    C::Response:
        AsyncRead + AsyncWrite + hyper::client::connect::Connection + Send + Unpin + 'static,
    C::Future: Send + 'static,
    C::Error: Into<Box<dyn std::error::Error + Sync + Send>>,
{
    type Response = MaybeProxyStream<C::Response>;
    type Error = io::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self {
            MaybeProxyConnector::NoProxy(c) => c
                .poll_ready(cx)
                .map_err(|err| io::Error::new(io::ErrorKind::Other, err)),
            MaybeProxyConnector::Proxy(c) => c.poll_ready(cx),
        }
    }

    fn call(&mut self, req: http::uri::Uri) -> Self::Future {
        match self {
            MaybeProxyConnector::NoProxy(c) => {
                let stream = c.call(req);
                Box::pin(async {
                    let stream = stream
                        .await
                        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

                    Ok(MaybeProxyStream::NoProxy(stream))
                })
            }

            MaybeProxyConnector::Proxy(c) => {
                let stream = c.call(req);
                Box::pin(async { Ok(MaybeProxyStream::Proxy(stream.await?)) })
            }
        }
    }
}

fn uri_to_proxy(uri: hyper::Uri) -> io::Result<hyper_proxy::Proxy> {
    let proxy_url = url::Url::parse(&uri.to_string())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let mut proxy = hyper_proxy::Proxy::new(hyper_proxy::Intercept::All, uri);

    if !proxy_url.username().is_empty() {
        let decode = |s: &str| {
            percent_encoding::percent_decode_str(s)
                .decode_utf8()
                .map(std::borrow::Cow::into_owned)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
        };

        let username = decode(proxy_url.username())?;
        let password = proxy_url.password().map(decode).transpose()?;

        proxy.set_authorization(headers::Authorization::basic(
            &username,
            password.as_deref().unwrap_or_default(),
        ));
    }

    Ok(proxy)
}

/// Resolves the proxy to use: the explicit value if given, else `HTTPS_PROXY` / `https_proxy`.
pub fn get_proxy_uri(https_proxy: Option<String>) -> io::Result<Option<hyper::Uri>> {
    let Some(proxy) = https_proxy
        .or_else(|| env::var("HTTPS_PROXY").ok())
        .or_else(|| env::var("https_proxy").ok())
        .filter(|proxy| !proxy.is_empty())
    else {
        return Ok(None);
    };

    let proxy = proxy
        .parse::<hyper::Uri>()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    // Never log the proxy password.
    let mut sanitized_proxy = url::Url::parse(&proxy.to_string())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    if sanitized_proxy.password().is_some() {
        sanitized_proxy
            .set_password(Some("******"))
            .map_err(|()| io::Error::new(io::ErrorKind::Other, "could not mask proxy password"))?;
    }
    log::info!("Using HTTPS proxy server {}", sanitized_proxy);

    Ok(Some(proxy))
}
