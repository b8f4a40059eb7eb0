//! Integration tests for the HTTP API
//!
//! Builds the real router over a real pipeline and query engine in a temp
//! directory, then sends requests via tower::ServiceExt.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use hlte::config::PipelineConfig;
use hlte::daemon::http::auth::{AuthState, PASSPHRASE_HEADER};
use hlte::daemon::http::{create_router, AppState};
use hlte::pipeline::Pipeline;
use hlte::query::QueryEngine;
use hlte::types::Checksum;

struct TestApp {
    router: axum::Router,
    pipeline: Arc<Pipeline>,
    _dir: TempDir,
}

/// Create a test app with every format enabled
async fn test_app(passphrase: Option<&str>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let pipeline = Arc::new(Pipeline::start(&PipelineConfig::default(), dir.path()));
    pipeline.enable_all().await.unwrap();
    let query = QueryEngine::open(dir.path()).await.unwrap();

    let state = AppState {
        pipeline: pipeline.clone(),
        query,
    };
    TestApp {
        router: create_router(state, AuthState::new(passphrase)),
        pipeline,
        _dir: dir,
    }
}

/// Helper to read response body as bytes
async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(body: Body) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn method(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

const PAYLOAD: &str = r#"{"data":"foo bar","uri":"https://example.com/a","annotation":"keep"}"#;

// ---------------------------------------------------------------
// System endpoints
// ---------------------------------------------------------------

#[tokio::test]
async fn test_health_and_version() {
    let app = test_app(None).await;

    let resp = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["healthy"], true);
    assert_eq!(json["formats"], serde_json::json!(["json", "csv", "sqlite"]));

    let resp = app.router.clone().oneshot(get("/version")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(resp.into_body()).await,
        env!("CARGO_PKG_VERSION").as_bytes()
    );

    app.pipeline.shutdown().await;
}

// ---------------------------------------------------------------
// Auth
// ---------------------------------------------------------------

#[tokio::test]
async fn test_passphrase_required_when_configured() {
    let app = test_app(Some("secret-digest")).await;

    let resp = app.router.clone().oneshot(get("/version")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/version")
        .header(PASSPHRASE_HEADER, "secret-digest")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Health stays open
    let resp = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    app.pipeline.shutdown().await;
}

#[tokio::test]
async fn test_header_rejected_when_no_passphrase() {
    let app = test_app(None).await;

    let request = Request::builder()
        .uri("/formats")
        .header(PASSPHRASE_HEADER, "anything")
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    app.pipeline.shutdown().await;
}

// ---------------------------------------------------------------
// Ingest + search
// ---------------------------------------------------------------

#[tokio::test]
async fn test_ingest_then_search() {
    let app = test_app(None).await;

    let checksum = Checksum::compute(PAYLOAD.as_bytes());
    let uri = format!("/?formats=sqlite,csv&checksum={}", checksum);
    let resp = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::from(PAYLOAD))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["checksum"], checksum.as_str());

    // Disabling waits for the sink to drain
    let resp = app
        .router
        .clone()
        .oneshot(method("DELETE", "/formats/sqlite"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["outcome"], "disabled");
    assert_eq!(json["stats"]["written"], 1);

    let resp = app
        .router
        .clone()
        .oneshot(get("/search?q=bar&l=5&d=false"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let hits = body_json(resp.into_body()).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["hilite"], "foo bar");
    assert_eq!(hits[0]["primaryURI"], "https://example.com/a");
    assert_eq!(hits[0]["secondaryURI"], "");

    app.pipeline.shutdown().await;
}

#[tokio::test]
async fn test_ingest_rejections() {
    let app = test_app(None).await;

    let cases = [
        ("/", PAYLOAD, StatusCode::BAD_REQUEST),
        ("/?formats=", PAYLOAD, StatusCode::BAD_REQUEST),
        ("/?formats=json", "", StatusCode::BAD_REQUEST),
        ("/?formats=json", "{not json", StatusCode::BAD_REQUEST),
        (
            "/?formats=json&checksum=0000000000000000000000000000000000000000000000000000000000000000",
            PAYLOAD,
            StatusCode::FORBIDDEN,
        ),
    ];

    for (uri, body, expected) in cases {
        let resp = app.router.clone().oneshot(post(uri, body)).await.unwrap();
        assert_eq!(resp.status(), expected, "POST {} {:?}", uri, body);
    }

    // Unknown formats are skipped, not rejected
    let resp = app
        .router
        .clone()
        .oneshot(post("/?formats=xml", PAYLOAD))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let report = app.pipeline.shutdown().await;
    assert!(report.iter().all(|(_, stats)| stats.written == 0));
}

#[tokio::test]
async fn test_ingest_after_shutdown_is_unavailable() {
    let app = test_app(None).await;
    app.pipeline.shutdown().await;

    let resp = app
        .router
        .clone()
        .oneshot(post("/?formats=json", PAYLOAD))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_search_bad_params() {
    let app = test_app(None).await;

    for uri in ["/search", "/search?q=x&l=0", "/search?q=x&l=9000", "/search?q=x&d=perhaps"] {
        let resp = app.router.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "GET {}", uri);
    }

    let resp = app.router.clone().oneshot(get("/search?q=")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp.into_body()).await, serde_json::json!([]));

    app.pipeline.shutdown().await;
}

// ---------------------------------------------------------------
// Format registration
// ---------------------------------------------------------------

#[tokio::test]
async fn test_format_registration() {
    let app = test_app(None).await;

    let resp = app
        .router
        .clone()
        .oneshot(method("PUT", "/formats/json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp.into_body()).await["outcome"], "already_enabled");

    let resp = app
        .router
        .clone()
        .oneshot(method("DELETE", "/formats/json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .router
        .clone()
        .oneshot(method("DELETE", "/formats/json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp.into_body()).await["outcome"], "not_registered");

    let resp = app.router.clone().oneshot(get("/formats")).await.unwrap();
    assert_eq!(
        body_json(resp.into_body()).await,
        serde_json::json!(["csv", "sqlite"])
    );

    let resp = app
        .router
        .clone()
        .oneshot(method("PUT", "/formats/json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .router
        .clone()
        .oneshot(method("PUT", "/formats/xml"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    app.pipeline.shutdown().await;
}
