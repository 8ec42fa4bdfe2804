use std::error::Error as StdError;

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::ActionResponse;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AirtableError {
    /// Network, timeout or TLS failure reported by the transport.
    ///
    /// Never retried, including on timeouts.
    #[error("transport error: {0}")]
    Transport(Box<dyn StdError + Send + Sync>),
    /// Non-success HTTP status mapped by a status classifier.
    #[error("{kind}: {message} (status {status})")]
    Api {
        /// Upstream error type, e.g. `NOT_FOUND` or `INVALID_REQUEST_UNKNOWN`.
        kind: String,
        /// Human readable message, taken from the response body when present.
        message: String,
        /// HTTP status code of the response.
        status: u16,
        /// The response that was classified, attached by the dispatcher.
        response: Option<Box<ActionResponse>>,
    },
    /// Endpoint, base id or path did not compose into a valid URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    /// Missing or malformed client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AirtableError {
    /// Wraps any transport-level failure.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Transport(err.into())
    }

    /// Builds a classified API error.
    pub fn api(kind: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Api {
            kind: kind.into(),
            message: message.into(),
            status,
            response: None,
        }
    }

    /// Attaches the classified response to an [`AirtableError::Api`].
    /// Other variants are returned unchanged.
    pub fn with_response(mut self, response: ActionResponse) -> Self {
        if let Self::Api { response: slot, .. } = &mut self {
            *slot = Some(Box::new(response));
        }
        self
    }

    /// Full response behind a classified error.
    pub fn response(&self) -> Option<&ActionResponse> {
        match self {
            Self::Api { response, .. } => response.as_deref(),
            _ => None,
        }
    }

    /// Parsed body of the response behind a classified error.
    pub fn body(&self) -> Option<&Value> {
        self.response()?.body.as_ref()
    }

    /// Headers of the response behind a classified error, e.g. `Retry-After`.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.response().map(|response| &response.headers)
    }

    /// HTTP status for classified errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the transport reported a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(inner) => inner
                .downcast_ref::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout),
            _ => false,
        }
    }
}
