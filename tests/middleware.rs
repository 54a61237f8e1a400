//! Integration tests driving `DebugLayer` through axum routers and bare
//! tower services.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::json;
use tower::{service_fn, Layer, ServiceExt};

use request_debug::middleware::directive::parse_directive;
use request_debug::middleware::extract::SOURCE_IP_ERROR;
use request_debug::middleware::{
    DebugLayer, LogLevel, MemorySink, REQUEST_MESSAGE, RESPONSE_MESSAGE,
};

fn layer(directive: &str, sink: &MemorySink) -> DebugLayer {
    DebugLayer::new(parse_directive(directive).unwrap(), sink.clone())
}

fn request(method: &str, uri: &str) -> Request {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "localhost:9080")
        .header(header::USER_AGENT, "integration-test")
        .body(Body::empty())
        .unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo("127.0.0.1:51234".parse::<SocketAddr>().unwrap()));
    request
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn version_app(sink: &MemorySink, directive: &str) -> Router {
    Router::new()
        .route("/version", get(|| async { "1.0.0" }))
        .route("/admin/users", get(|| async { "[]" }))
        .layer(layer(directive, sink))
}

#[tokio::test]
async fn disabled_handler_delegates_once_and_emits_nothing() {
    let sink = MemorySink::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let inner = service_fn(move |_req: Request| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::convert::Infallible>("ok".into_response())
        }
    });

    let service = layer("disabled=yes response_debug=yes", &sink).layer(inner);
    let response = service.oneshot(request("GET", "/version")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn tagged_handler_logs_request_fields() {
    let sink = MemorySink::new();
    let app = version_app(&sink, r#"tag="foo" disabled=no log_level=debug"#);

    let response = app
        .oneshot(request("GET", "/version?user=greenpau&a=1&a=2"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "1.0.0");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.message, REQUEST_MESSAGE);
    assert_eq!(record.level, LogLevel::Debug);
    assert_eq!(record.str_field("tag"), "foo");
    assert_eq!(record.str_field("direction"), "incoming");
    assert_eq!(record.str_field("method"), "GET");
    assert_eq!(record.str_field("host"), "localhost:9080");
    assert_eq!(record.str_field("uri"), "/version?user=greenpau&a=1&a=2");
    assert_eq!(record.str_field("remote_addr"), "127.0.0.1");
    assert_eq!(record.field("remote_port"), Some(&json!(51234)));
    assert_eq!(record.str_field("user_agent"), "integration-test");
    assert_eq!(
        record.field("query_params"),
        Some(&json!({"a": ["1", "2"], "user": "greenpau"}))
    );
    assert_eq!(record.field("content_length"), Some(&json!(0)));
    assert!(!record.str_field("request_id").is_empty());
}

#[tokio::test]
async fn each_request_gets_its_own_correlation_id() {
    let sink = MemorySink::new();
    let app = version_app(&sink, "");

    for _ in 0..3 {
        app.clone()
            .oneshot(request("GET", "/version"))
            .await
            .unwrap();
    }

    let mut ids: Vec<String> = sink
        .records()
        .iter()
        .map(|r| r.str_field("request_id").to_string())
        .collect();
    assert_eq!(ids.len(), 3);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn uri_filter_limits_records_to_matching_requests() {
    let sink = MemorySink::new();
    let app = version_app(&sink, r#"uri_filter="^/admin" response_debug=yes"#);

    let response = app
        .clone()
        .oneshot(request("GET", "/version"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "1.0.0");
    assert!(sink.is_empty());

    let response = app
        .oneshot(request("GET", "/admin/users"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "[]");
    assert_eq!(sink.named(REQUEST_MESSAGE).len(), 1);
    assert_eq!(sink.named(RESPONSE_MESSAGE).len(), 1);
}

#[tokio::test]
async fn response_is_recorded_and_delivered_unchanged() {
    let sink = MemorySink::new();
    let app = Router::new()
        .route(
            "/login",
            get(|| async {
                (
                    StatusCode::CREATED,
                    [
                        (header::SET_COOKIE, "sid=abc123; Path=/; HttpOnly"),
                        (header::CONTENT_TYPE, "text/plain"),
                    ],
                    "hello",
                )
            }),
        )
        .layer(layer("tag=auth response_debug=yes log_level=info", &sink));

    let response = app.oneshot(request("GET", "/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::SET_COOKIE],
        "sid=abc123; Path=/; HttpOnly"
    );
    assert_eq!(body_text(response).await, "hello");

    assert_eq!(sink.len(), 2);
    let requests = sink.named(REQUEST_MESSAGE);
    let responses = sink.named(RESPONSE_MESSAGE);
    assert_eq!(responses.len(), 1);

    let record = &responses[0];
    assert_eq!(record.level, LogLevel::Info);
    assert_eq!(record.str_field("direction"), "outgoing");
    assert_eq!(record.str_field("tag"), "auth");
    assert_eq!(record.field("status_code"), Some(&json!(201)));
    assert_eq!(record.field("response_size"), Some(&json!(5)));
    assert_eq!(record.field("buffer_size"), Some(&json!(5)));
    assert_eq!(
        record.field("cookies"),
        Some(&json!([{"name": "sid", "value": "abc123"}]))
    );
    let headers = record.field("response_headers").unwrap();
    assert_eq!(headers["content-type"], "text/plain");
    assert!(headers.get("set-cookie").is_none());
    assert_eq!(
        record.str_field("request_id"),
        requests[0].str_field("request_id")
    );
}

#[tokio::test]
async fn chained_handlers_share_one_correlation_id() {
    let sink = MemorySink::new();
    let app = Router::new()
        .route("/version", get(|| async { "1.0.0" }))
        .layer(layer("tag=inner response_debug=yes", &sink))
        .layer(layer("tag=outer", &sink));

    app.oneshot(request("GET", "/version")).await.unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].str_field("tag"), "outer");
    assert_eq!(records[1].str_field("tag"), "inner");
    assert_eq!(records[2].message, RESPONSE_MESSAGE);
    let id = records[0].str_field("request_id");
    assert!(!id.is_empty());
    assert!(records.iter().all(|r| r.str_field("request_id") == id));
}

#[tokio::test]
async fn correlation_ids_can_be_turned_off() {
    let sink = MemorySink::new();
    let app = version_app(&sink, "enable_uuid=no response_debug=yes");

    app.oneshot(request("GET", "/version")).await.unwrap();

    assert_eq!(sink.len(), 2);
    assert!(sink.records().iter().all(|r| r.str_field("request_id").is_empty()));
}

#[tokio::test]
async fn downstream_error_propagates_without_response_record() {
    let sink = MemorySink::new();
    let inner = service_fn(|_req: Request| async {
        Err::<Response, _>(std::io::Error::other("upstream unavailable"))
    });

    let service = layer("response_debug=yes", &sink).layer(inner);
    let err = service
        .oneshot(request("GET", "/version"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "upstream unavailable");
    assert_eq!(sink.named(REQUEST_MESSAGE).len(), 1);
    assert!(sink.named(RESPONSE_MESSAGE).is_empty());
}

#[tokio::test]
async fn protocol_switch_passes_through_without_response_record() {
    let sink = MemorySink::new();
    let inner = service_fn(|_req: Request| async {
        let response = Response::builder()
            .status(StatusCode::SWITCHING_PROTOCOLS)
            .header(header::UPGRADE, "websocket")
            .body(Body::empty())
            .unwrap();
        Ok::<_, std::convert::Infallible>(response)
    });

    let service = layer("tag=ws response_debug=yes", &sink).layer(inner);
    let response = service.oneshot(request("GET", "/socket")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
    assert_eq!(response.headers()[header::UPGRADE], "websocket");
    assert_eq!(sink.named(REQUEST_MESSAGE).len(), 1);
    assert!(sink.named(RESPONSE_MESSAGE).is_empty());
}

#[tokio::test]
async fn failing_response_body_reaches_client_without_response_record() {
    let sink = MemorySink::new();
    let inner = service_fn(|_req: Request| async {
        let chunks = futures_util::stream::once(async {
            Err::<Bytes, _>(std::io::Error::other("connection reset by upstream"))
        });
        let response = Response::builder()
            .status(StatusCode::OK)
            .header("x-upstream", "cache-1")
            .body(Body::from_stream(chunks))
            .unwrap();
        Ok::<_, std::convert::Infallible>(response)
    });

    let service = layer("response_debug=yes", &sink).layer(inner);
    let response = service.oneshot(request("GET", "/version")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-upstream"], "cache-1");
    assert!(response.into_body().collect().await.is_err());
    assert_eq!(sink.named(REQUEST_MESSAGE).len(), 1);
    assert!(sink.named(RESPONSE_MESSAGE).is_empty());
}

#[tokio::test]
async fn missing_peer_address_is_reported_and_request_still_served() {
    let sink = MemorySink::new();
    let app = version_app(&sink, "tag=nopeer log_level=debug");

    let request = Request::builder()
        .uri("/version")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(body_text(response).await, "1.0.0");

    let diagnostics = sink.named(SOURCE_IP_ERROR);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, LogLevel::Error);
    assert_eq!(diagnostics[0].str_field("tag"), "nopeer");

    let requests = sink.named(REQUEST_MESSAGE);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].str_field("remote_addr"), "");
    assert_eq!(requests[0].field("remote_port"), Some(&json!(0)));
}

#[tokio::test]
async fn form_body_is_logged_and_preserved_for_the_handler() {
    let sink = MemorySink::new();
    let app = Router::new()
        .route("/submit", post(|body: String| async move { body }))
        .layer(layer("", &sink));

    let payload = "name=alice&role=admin&role=ops";
    let mut req = Request::builder()
        .method("POST")
        .uri("/submit")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::CONTENT_LENGTH, payload.len())
        .body(Body::from(payload))
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo("10.0.0.7:443".parse::<SocketAddr>().unwrap()));

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(body_text(response).await, payload);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].field("form"),
        Some(&json!({"name": ["alice"], "role": ["admin", "ops"]}))
    );
    assert_eq!(
        records[0].field("content_length"),
        Some(&json!(payload.len()))
    );
}

#[tokio::test]
async fn cookies_are_counted_and_excluded_from_headers() {
    let sink = MemorySink::new();
    let app = version_app(&sink, "");

    let mut req = request("GET", "/version");
    req.headers_mut()
        .insert(header::COOKIE, "a=1; b=2".parse().unwrap());
    app.oneshot(req).await.unwrap();

    let record = &sink.records()[0];
    assert_eq!(record.field("cookie_count"), Some(&json!(2)));
    assert!(record.field("headers").unwrap().get("cookie").is_none());
    assert_eq!(
        record.field("headers").unwrap()["user-agent"],
        "integration-test"
    );
}
