use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::AirtableError;

/// Maps a final (non-retried) response to an error, or `None` on success.
pub trait StatusClassifier: Send + Sync {
    fn classify(&self, status: StatusCode, body: Option<&Value>) -> Option<AirtableError>;
}

impl<F> StatusClassifier for F
where
    F: Fn(StatusCode, Option<&Value>) -> Option<AirtableError> + Send + Sync,
{
    fn classify(&self, status: StatusCode, body: Option<&Value>) -> Option<AirtableError> {
        self(status, body)
    }
}

/// Default mapping of Airtable REST status codes to error kinds and messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct AirtableStatusClassifier;

impl StatusClassifier for AirtableStatusClassifier {
    fn classify(&self, status: StatusCode, body: Option<&Value>) -> Option<AirtableError> {
        let code = status.as_u16();
        if code < 400 {
            return None;
        }
        let detail = ErrorDetail::from_body(body);
        let error = match code {
            401 => AirtableError::api(
                "AUTHENTICATION_REQUIRED",
                "You should provide valid api key to perform this operation",
                code,
            ),
            403 => AirtableError::api(
                "NOT_AUTHORIZED",
                "You are not authorized to perform this operation",
                code,
            ),
            404 => AirtableError::api(
                "NOT_FOUND",
                detail
                    .message
                    .unwrap_or_else(|| "Could not find what you are looking for".to_owned()),
                code,
            ),
            413 => AirtableError::api("REQUEST_TOO_LARGE", "Request body is too large", code),
            422 => AirtableError::api(
                detail
                    .kind
                    .unwrap_or_else(|| "UNPROCESSABLE_ENTITY".to_owned()),
                detail
                    .message
                    .unwrap_or_else(|| "The operation cannot be processed".to_owned()),
                code,
            ),
            429 => AirtableError::api(
                "TOO_MANY_REQUESTS",
                "You have made too many requests in a short period of time. \
                 Please retry your request later",
                code,
            ),
            500 => AirtableError::api(
                "SERVER_ERROR",
                "Try again. If the problem persists, contact support.",
                code,
            ),
            503 => AirtableError::api(
                "SERVICE_UNAVAILABLE",
                "The service is temporarily unavailable. Please retry shortly.",
                code,
            ),
            _ => AirtableError::api(
                detail.kind.unwrap_or_else(|| "UNEXPECTED_ERROR".to_owned()),
                detail
                    .message
                    .unwrap_or_else(|| "An unexpected error occurred".to_owned()),
                code,
            ),
        };
        Some(error)
    }
}

/// `{"error": {"type": "...", "message": "..."}}`, or `{"error": "NOT_FOUND"}`
/// on some endpoints.
#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorField,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Detailed(ErrorDetail),
    Code(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorDetail {
    /// Bodies that don't match either shape yield no detail.
    fn from_body(body: Option<&Value>) -> Self {
        let parsed = body.and_then(|body| ErrorBody::deserialize(body).ok());
        match parsed.map(|body| body.error) {
            Some(ErrorField::Detailed(detail)) => detail,
            Some(ErrorField::Code(code)) => Self {
                kind: Some(code),
                message: None,
            },
            None => Self::default(),
        }
    }
}
