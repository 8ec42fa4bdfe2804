use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use airtable_http::{
    ActionRequest, AirtableClient, AirtableError, BackoffParameters, ClientOptions, QueryParams,
};
use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value as JsonValue};

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: JsonValue,
    delay: Duration,
}

impl MockResponse {
    fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body,
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
struct RecordedRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    hits: Arc<AtomicUsize>,
}

async fn api_handler(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .requests
        .lock()
        .expect("request log mutex must not be poisoned")
        .push(RecordedRequest {
            method,
            uri,
            headers,
            body,
        });

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "no mock response available"}),
            )
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (response.status, Json(response.body))
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn options(&self) -> ClientOptions {
        ClientOptions::new("keyTEST")
            .with_endpoint_url(&self.base_url)
            .with_rate_limit_backoff(BackoffParameters {
                initial_delay_ms: 1,
                max_delay_ms: 5,
            })
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .clone()
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        requests: Arc::new(Mutex::new(Vec::new())),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new().fallback(api_handler).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        requests: state.requests,
        task,
    }
}

#[tokio::test]
async fn list_request_reaches_server_with_headers_and_query() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::OK,
        json!({"records": [{"id": "rec1", "fields": {"Name": "Kit"}}]}),
    )])
    .await;
    let client = AirtableClient::new(server.options()).expect("client must build");

    let response = client
        .base("appTEST")
        .dispatch(&ActionRequest::get("/Tasks").with_query(
            QueryParams::new()
                .with("view", "Grid view")
                .with("fields[]", ["Name", "Notes"]),
        ))
        .await
        .expect("list must succeed");

    assert_eq!(
        response.body,
        Some(json!({"records": [{"id": "rec1", "fields": {"Name": "Kit"}}]}))
    );

    let recorded = &server.requests()[0];
    assert_eq!(recorded.method, Method::GET);
    assert_eq!(recorded.uri.path(), "/v0/appTEST/Tasks");
    assert_eq!(
        recorded.uri.query(),
        Some("view=Grid+view&fields%5B%5D=Name&fields%5B%5D=Notes")
    );
    assert_eq!(recorded.headers["authorization"], "Bearer keyTEST");
    assert_eq!(recorded.headers["x-api-version"], "0.1.0");
    assert_eq!(recorded.headers["x-airtable-application-id"], "appTEST");
    assert_eq!(
        recorded.headers["user-agent"],
        airtable_http::user_agent().as_str()
    );
    assert!(recorded.body.is_empty());
}

#[tokio::test]
async fn json_body_is_sent_verbatim() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::OK,
        json!({"records": [{"id": "rec9"}]}),
    )])
    .await;
    let client = AirtableClient::new(server.options()).expect("client must build");
    let payload = json!({"records": [{"fields": {"Name": "Kit", "Done": false}}], "typecast": true});

    client
        .base("appTEST")
        .dispatch(&ActionRequest::post("/Tasks", payload.clone()))
        .await
        .expect("create must succeed");

    let recorded = &server.requests()[0];
    assert_eq!(recorded.method, Method::POST);
    assert_eq!(recorded.headers["content-type"], "application/json");
    let sent: JsonValue = serde_json::from_str(&recorded.body).expect("body must be json");
    assert_eq!(sent, payload);
}

#[tokio::test]
async fn retries_rate_limited_responses_until_success() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"errors": []})),
        MockResponse::json(StatusCode::TOO_MANY_REQUESTS, json!({"errors": []})),
        MockResponse::json(StatusCode::OK, json!({"id": "rec1", "deleted": true})),
    ])
    .await;
    let client = AirtableClient::new(server.options()).expect("client must build");

    let response = client
        .base("appTEST")
        .dispatch(&ActionRequest::delete("/Tasks/rec1"))
        .await
        .expect("request must succeed after retries");

    assert_eq!(response.body, Some(json!({"id": "rec1", "deleted": true})));
    assert_eq!(server.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::SERVICE_UNAVAILABLE, json!({})),
        MockResponse::json(StatusCode::OK, json!({})),
    ])
    .await;
    let client = AirtableClient::new(server.options()).expect("client must build");

    let err = client
        .base("appTEST")
        .dispatch(&ActionRequest::get("/Tasks"))
        .await
        .expect_err("503 must surface");

    match err {
        AirtableError::Api { kind, status, .. } => {
            assert_eq!(kind, "SERVICE_UNAVAILABLE");
            assert_eq!(status, 503);
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn request_timeout_surfaces_transport_error() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, json!({}))
        .with_delay(Duration::from_millis(150))])
    .await;
    let client = AirtableClient::new(server.options().with_request_timeout(Duration::from_millis(20)))
        .expect("client must build");

    let err = client
        .base("appTEST")
        .dispatch(&ActionRequest::get("/Tasks"))
        .await
        .expect_err("request must timeout");

    assert!(matches!(err, AirtableError::Transport(_)));
    assert!(err.is_timeout());
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn browser_like_clients_send_custom_user_agent_header() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, json!({}))]).await;
    let client = AirtableClient::new(server.options().with_browser_like(true))
        .expect("client must build");

    client
        .base("appTEST")
        .dispatch(&ActionRequest::get("/Tasks"))
        .await
        .expect("request must succeed");

    let recorded = &server.requests()[0];
    assert_eq!(
        recorded.headers["x-airtable-user-agent"],
        airtable_http::user_agent().as_str()
    );
    assert!(recorded.headers.get("user-agent").is_none());
}
