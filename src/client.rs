use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;

// tokio::time::sleep is only available on non-WASM targets.
#[cfg(not(target_arch = "wasm32"))]
use tokio::time::sleep;

use crate::{
    request::{build_headers, build_url},
    ActionRequest, ActionResponse, AirtableStatusClassifier, ClientOptions, QueryParams,
    ReqwestTransport, Result, StatusClassifier, Transport, TransportRequest,
};

/// Airtable REST client: options, a transport and a status classifier.
///
/// Cloning is cheap as long as the transport is; every clone shares the
/// classifier.
#[derive(Clone)]
pub struct AirtableClient<T = ReqwestTransport> {
    transport: T,
    options: ClientOptions,
    classifier: Arc<dyn StatusClassifier>,
}

impl<T> fmt::Debug for AirtableClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl AirtableClient<ReqwestTransport> {
    /// Creates a client with a `reqwest` transport built from `options`.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let transport = ReqwestTransport::from_options(&options)?;
        Ok(Self::with_transport(options, transport))
    }

    /// Creates a client from `AIRTABLE_API_KEY` / `AIRTABLE_ENDPOINT_URL`.
    ///
    /// **Not available on `wasm32` targets** — see [`ClientOptions::from_env`].
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }
}

impl<T: Transport> AirtableClient<T> {
    /// Creates a client over any [`Transport`], e.g. a test double.
    pub fn with_transport(options: ClientOptions, transport: T) -> Self {
        Self {
            transport,
            options,
            classifier: Arc::new(AirtableStatusClassifier),
        }
    }

    /// Replaces the default [`AirtableStatusClassifier`].
    pub fn with_classifier<C>(mut self, classifier: C) -> Self
    where
        C: StatusClassifier + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a handle scoped to one base.
    pub fn base(&self, base_id: impl Into<String>) -> Base<'_, T> {
        Base {
            client: self,
            id: base_id.into(),
        }
    }

    /// Issues `request` against `base_id`, transparently retrying HTTP 429.
    ///
    /// Transport failures are returned immediately. A 429 is retried after a
    /// full-jitter delay, with no limit on the number of attempts, unless
    /// [`ClientOptions::no_retry_if_rate_limited`] is set. Every other response
    /// goes through the status classifier; a classified error keeps the
    /// response, see [`AirtableError::response`](crate::AirtableError::response).
    pub async fn dispatch(&self, base_id: &str, request: &ActionRequest) -> Result<ActionResponse> {
        let mut num_attempts = 0u32;
        loop {
            let outgoing = TransportRequest {
                method: request.method.clone(),
                url: build_url(&self.options, base_id, request)?,
                headers: build_headers(&self.options, base_id)?,
                body: request.body.as_ref(),
                timeout: self.options.request_timeout,
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                method = %outgoing.method,
                url = %outgoing.url,
                attempt = num_attempts,
                "dispatching request"
            );

            let response = self.transport.send(outgoing).await?;

            if response.status == StatusCode::TOO_MANY_REQUESTS
                && !self.options.no_retry_if_rate_limited
            {
                self.wait_before_retry(num_attempts).await;
                num_attempts = num_attempts.saturating_add(1);
                continue;
            }

            return match self
                .classifier
                .classify(response.status, response.body.as_ref())
            {
                Some(err) => Err(err.with_response(response)),
                None => Ok(response),
            };
        }
    }

    /// Callback form of [`dispatch`](Self::dispatch).
    ///
    /// `on_complete` runs exactly once, after any rate-limit retries.
    pub async fn dispatch_then<F>(&self, base_id: &str, request: &ActionRequest, on_complete: F)
    where
        F: FnOnce(Result<ActionResponse>),
    {
        on_complete(self.dispatch(base_id, request).await);
    }

    /// Waits out the full-jitter delay for `num_attempts`.
    async fn wait_before_retry(&self, num_attempts: u32) {
        let delay = self.options.rate_limit_backoff.delay_for(num_attempts);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            attempt = num_attempts,
            delay_ms = delay.as_millis() as u64,
            "rate limited, retrying after backoff"
        );

        pause(delay).await;
    }
}

/// An [`AirtableClient`] bound to one base id.
///
/// The id fills both the URL path segment and `x-airtable-application-id`.
#[derive(Clone, Debug)]
pub struct Base<'a, T = ReqwestTransport> {
    client: &'a AirtableClient<T>,
    id: String,
}

impl<T: Transport> Base<'_, T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn dispatch(&self, request: &ActionRequest) -> Result<ActionResponse> {
        self.client.dispatch(&self.id, request).await
    }

    pub async fn dispatch_then<F>(&self, request: &ActionRequest, on_complete: F)
    where
        F: FnOnce(Result<ActionResponse>),
    {
        self.client.dispatch_then(&self.id, request, on_complete).await;
    }

    /// Positional form: `method`, `path`, `query` and optional `body`.
    pub async fn run_action(
        &self,
        method: Method,
        path: &str,
        query: QueryParams,
        body: Option<Value>,
    ) -> Result<ActionResponse> {
        let request = ActionRequest {
            method,
            path: path.to_owned(),
            query,
            body,
        };
        self.dispatch(&request).await
    }
}

#[cfg(not(target_arch = "wasm32"))]
async fn pause(delay: Duration) {
    sleep(delay).await;
}

/// `setTimeout`-backed sleep for browser and edge runtimes.
#[cfg(target_arch = "wasm32")]
async fn pause(delay: Duration) {
    use wasm_bindgen::{JsCast, JsValue};

    let millis = delay.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let set_timeout = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("setTimeout"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok());
        let scheduled = set_timeout.is_some_and(|set_timeout| {
            set_timeout
                .call2(&JsValue::NULL, &resolve, &JsValue::from(millis))
                .is_ok()
        });
        // Without a timer, resolve now so the retry loop cannot stall.
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
