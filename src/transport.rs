use std::{future::Future, sync::Arc, time::Duration};

use reqwest::{header::HeaderMap, Method, StatusCode, Url};
use serde_json::Value;

use crate::{AirtableError, ClientOptions, Result};

/// A fully composed request, rebuilt identically for every attempt.
#[derive(Clone, Debug)]
pub struct TransportRequest<'a> {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// JSON body; `None` means no body is sent.
    pub body: Option<&'a Value>,
    pub timeout: Duration,
}

/// Response handed back to callers after classification.
#[derive(Clone, Debug)]
pub struct ActionResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body. `None` for an empty body; non-JSON text is kept as
    /// [`Value::String`].
    pub body: Option<Value>,
}

impl ActionResponse {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }
}

/// Sends one HTTP request. Implementations must not retry on their own.
pub trait Transport {
    fn send(&self, request: TransportRequest<'_>) -> impl Future<Output = Result<ActionResponse>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: TransportRequest<'_>) -> impl Future<Output = Result<ActionResponse>> {
        (**self).send(request)
    }
}

/// [`Transport`] backed by an explicitly constructed `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client as-is.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Builds a client honoring the TLS policy in `options`.
    ///
    /// `allow_unauthorized_ssl` has no effect on `wasm32`, where the browser
    /// owns certificate validation.
    pub fn from_options(options: &ClientOptions) -> Result<Self> {
        let builder = reqwest::Client::builder();

        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.danger_accept_invalid_certs(options.allow_unauthorized_ssl);

        #[cfg(target_arch = "wasm32")]
        let _ = options;

        let http = builder.build().map_err(AirtableError::transport)?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest<'_>) -> Result<ActionResponse> {
        // On WASM, reqwest uses AbortController for timeout; the `.timeout()`
        // method is available on both targets.
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(AirtableError::transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(AirtableError::transport)?;

        Ok(ActionResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned())))
}
