use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Method, Url,
};
use serde_json::Value;

use crate::{AirtableError, ClientOptions, QueryParams, Result};

/// Header carrying the user agent in browser-like runtimes.
pub const BROWSER_USER_AGENT_HEADER: &str = "x-airtable-user-agent";

const API_VERSION_HEADER: &str = "x-api-version";
const APPLICATION_ID_HEADER: &str = "x-airtable-application-id";

/// Value of the user agent header, `airtable-http/<version>`.
pub fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// One logical API call: method, base-relative path, query and optional JSON body.
///
/// The dispatcher only borrows it, so every retry sends exactly the same request.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    pub method: Method,
    /// Path below the base, starting with `/`, e.g. `/Tasks/rec123`.
    pub path: String,
    pub query: QueryParams,
    /// `None` sends no body at all; `Some(json!({}))` sends `{}`.
    pub body: Option<Value>,
}

impl ActionRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Composes `<endpoint>/v<major>/<base_id><path>?<query>`.
pub(crate) fn build_url(
    options: &ClientOptions,
    base_id: &str,
    request: &ActionRequest,
) -> Result<Url> {
    let raw = format!(
        "{}/v{}/{}{}",
        options.endpoint_url,
        options.api_version_major(),
        base_id,
        request.path
    );
    let mut url =
        Url::parse(&raw).map_err(|err| AirtableError::InvalidUrl(format!("{raw}: {err}")))?;
    request.query.append_to(&mut url);
    Ok(url)
}

/// Builds the auth, version, application and user agent headers.
pub(crate) fn build_headers(options: &ClientOptions, base_id: &str) -> Result<HeaderMap> {
    let mut authorization =
        header_value(&format!("Bearer {}", options.api_key), "authorization")?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(header::AUTHORIZATION, authorization);
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        header_value(&options.api_version, API_VERSION_HEADER)?,
    );
    headers.insert(
        HeaderName::from_static(APPLICATION_ID_HEADER),
        header_value(base_id, APPLICATION_ID_HEADER)?,
    );

    let agent_header = if options.browser_like {
        HeaderName::from_static(BROWSER_USER_AGENT_HEADER)
    } else {
        header::USER_AGENT
    };
    headers.insert(agent_header, header_value(&user_agent(), "user-agent")?);
    Ok(headers)
}

fn header_value(value: &str, name: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AirtableError::Config(format!("invalid characters in {name} header")))
}
