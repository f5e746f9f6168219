//! [`reqwest`]-backed implementation of [`HttpClient`].

use std::io;

use futures::FutureExt;

use super::{HttpClient, HttpResponse, TransportError};
use crate::{error::ConfigError, options::PollOptions};

/// Error type for the reqwest-based HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("HTTP request failed: {0}")]
pub struct ReqwestHttpError(#[from] reqwest::Error);

impl TransportError for ReqwestHttpError {
    fn is_keep_alive_failure(&self) -> bool {
        let mut source: Option<&(dyn core::error::Error + 'static)> = Some(&self.0);
        while let Some(err) = source {
            if is_dropped_connection(err) {
                return true;
            }
            source = err.source();
        }
        false
    }
}

/// A pooled connection the server closed under us.
///
/// hyper reports a connection closed after the request went out but before
/// any response bytes as an incomplete message, with no I/O error beneath.
fn is_dropped_connection(err: &(dyn core::error::Error + 'static)) -> bool {
    if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
        return hyper_err.is_incomplete_message() || hyper_err.is_canceled();
    }

    err.downcast_ref::<io::Error>().is_some_and(|io_err| {
        matches!(
            io_err.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        )
    })
}

/// A [`reqwest`]-backed implementation of [`HttpClient`].
///
/// Cookies are kept in a per-client store, so the `ID` cookie travels back
/// to the server on every request.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client honouring the proxy and timeout in `options`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the proxy URL is rejected or the client
    /// cannot be built.
    pub fn from_options(options: &PollOptions) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);

        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ConfigError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        let inner = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl HttpClient for ReqwestHttpClient {
    type Error = ReqwestHttpError;

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> futures::future::BoxFuture<'_, Result<HttpResponse, Self::Error>> {
        let mut builder = self.inner.post(url);
        for &(name, value) in headers {
            builder = builder.header(name, value);
        }
        builder = builder.body(body);

        async move {
            let resp = builder.send().await?;
            let status = resp.status().as_u16();

            let resp_headers: Vec<(String, String)> = resp
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_lowercase(), v.to_string()))
                })
                .collect();

            let body = resp.bytes().await?.to_vec();

            Ok(HttpResponse {
                status,
                body,
                headers: resp_headers,
            })
        }
        .boxed()
    }
}
