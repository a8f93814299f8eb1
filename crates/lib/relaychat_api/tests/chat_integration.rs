//! Integration tests — build the router against a mock completion API and call it.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use relaychat_api::config::{ApiConfig, Credential};
use relaychat_api::upstream::{DEFAULT_MODEL, SYSTEM_PROMPT};
use relaychat_api::{AppState, router};
use relaychat_core::wire::UNEXPECTED_ERROR_MESSAGE;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn app(completions_url: String, credential: Credential) -> Router {
    router(AppState::new(ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        completions_url,
        credential,
        ..ApiConfig::default()
    }))
}

fn app_for(server: &MockServer) -> Router {
    app(
        format!("{}{COMPLETIONS_PATH}", server.uri()),
        Credential::Static("test-key".into()),
    )
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).expect("parse JSON");
    (status, json)
}

#[tokio::test]
async fn relays_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header_eq("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "model": DEFAULT_MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": "2+2?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "role": "assistant", "content": "4" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = send(app_for(&server), chat_request(r#"{"message":"2+2?"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "response": "4" }));
}

#[tokio::test]
async fn upstream_error_body_is_forwarded() {
    let server = MockServer::start().await;
    let upstream_error = json!({
        "error": { "message": "Rate limit reached", "type": "requests", "code": "rate_limit_exceeded" }
    });
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(upstream_error.clone()))
        .mount(&server)
        .await;

    let (status, json) = send(app_for(&server), chat_request(r#"{"message":"Hello"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": upstream_error }));
}

#[tokio::test]
async fn upstream_text_error_is_forwarded_as_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let (status, json) = send(app_for(&server), chat_request(r#"{"message":"Hello"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Bad Gateway" }));
}

#[tokio::test]
async fn transport_failure_reports_message() {
    // Nothing listens on the discard port.
    let app = app(
        format!("http://127.0.0.1:9{COMPLETIONS_PATH}"),
        Credential::Static("test-key".into()),
    );

    let (status, json) = send(app, chat_request(r#"{"message":"Hello"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["error"].as_str().expect("error is a string");
    assert!(!message.is_empty());
    assert_ne!(message, UNEXPECTED_ERROR_MESSAGE);
}

#[tokio::test]
async fn reply_without_choices_is_masked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let (status, json) = send(app_for(&server), chat_request(r#"{"message":"Hello"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": UNEXPECTED_ERROR_MESSAGE }));
}

#[tokio::test]
async fn malformed_bodies_are_masked_without_calling_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for body in ["not json", "{}", r#"{"message":42}"#, r#"{"message":"   "}"#] {
        let (status, json) = send(app_for(&server), chat_request(body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "body: {body}");
        assert_eq!(json, json!({ "error": UNEXPECTED_ERROR_MESSAGE }), "body: {body}");
    }
}

#[tokio::test]
async fn missing_credential_is_masked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(
        format!("{}{COMPLETIONS_PATH}", server.uri()),
        Credential::Env("RELAYCHAT_TEST_NEVER_SET_KEY".into()),
    );

    let (status, json) = send(app, chat_request(r#"{"message":"Hello"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": UNEXPECTED_ERROR_MESSAGE }));
}

#[tokio::test]
async fn health_reports_version() {
    let server = MockServer::start().await;
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let (status, json) = send(app_for(&server), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], relaychat_core::version());
}

#[tokio::test]
async fn index_serves_page_shell() {
    let server = MockServer::start().await;
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();

    let resp = app_for(&server).oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let html = String::from_utf8(body.to_vec()).expect("utf-8");
    assert!(html.contains("/app.js"));
    assert!(html.contains(r#"id="draft""#));
}

#[tokio::test]
async fn wasm_bundle_served_from_static_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("relaychat_wasm.js"), "export default 1;").expect("write");

    let app = router(AppState::new(ApiConfig {
        static_dir: Some(dir.path().to_path_buf()),
        credential: Credential::Static("test-key".into()),
        ..ApiConfig::default()
    }));
    let req = Request::builder()
        .uri("/pkg/relaychat_wasm.js")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
}
