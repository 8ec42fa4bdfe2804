//! `airtable-http` is an async request dispatcher for the Airtable REST API.
//!
//! It composes `<endpoint>/v<major>/<base><path>?<query>` requests with the
//! bearer, version, application and user agent headers, and retries HTTP 429
//! responses with "full jitter" exponential backoff:
//! - [`AirtableClient::dispatch`]
//! - [`Base::run_action`]
//! - [`compute_backoff`]

mod backoff;
mod classify;
mod client;
mod error;
mod options;
mod query;
mod request;
mod transport;

pub use backoff::{
    compute_backoff, compute_backoff_with, BackoffParameters, INITIAL_RETRY_DELAY_IF_RATE_LIMITED,
    MAX_RETRY_DELAY_IF_RATE_LIMITED,
};
pub use classify::{AirtableStatusClassifier, StatusClassifier};
pub use client::{AirtableClient, Base};
pub use error::AirtableError;
pub use options::{
    ClientOptions, DEFAULT_API_VERSION, DEFAULT_ENDPOINT_URL, DEFAULT_REQUEST_TIMEOUT,
};
pub use query::{QueryParams, QueryValue};
pub use request::{user_agent, ActionRequest, BROWSER_USER_AGENT_HEADER};
pub use transport::{ActionResponse, ReqwestTransport, Transport, TransportRequest};

pub use reqwest::{Method, StatusCode};

pub type Result<T> = std::result::Result<T, AirtableError>;
