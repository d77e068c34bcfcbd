use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::Service;

// Helper to create test app
fn create_test_app(development: bool) -> axum::Router {
    use error_envelope::{api, config::Environment, translator::ErrorTranslator};
    use std::sync::Arc;

    let environment = if development {
        Environment::Development
    } else {
        Environment::Production
    };

    let state = Arc::new(api::handlers::AppStateInner {
        environment,
        instance_id: "test-instance".to_string(),
    });

    api::routes::create_router(state, ErrorTranslator::new(development))
}

// Helper to send request and parse JSON response
async fn send_json_request(
    app: &mut axum::Router,
    uri: &str,
    request_id: Option<&str>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(id) = request_id {
        builder = builder.header("x-request-id", id);
    }
    let request = builder.body(Body::empty()).unwrap();

    let response = app.call(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, content_type, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut app = create_test_app(false);
    let (status, _, body) = send_json_request(&mut app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "error-envelope");
    assert_eq!(body["environment"], "production");
}

#[tokio::test]
async fn test_successful_stage_is_untouched() {
    let mut app = create_test_app(true);
    let (status, _, body) = send_json_request(&mut app, "/demo/ok", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_application_error_production() {
    let mut app = create_test_app(false);
    let (status, content_type, body) =
        send_json_request(&mut app, "/demo/application", Some("req-1")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        body,
        json!({
            "statusCode": 404,
            "clwStatusCode": 4004,
            "requestId": "req-1",
            "message": "Widget not found",
        })
    );
}

#[tokio::test]
async fn test_application_error_development_has_diagnostics() {
    let mut app = create_test_app(true);
    let (status, _, body) = send_json_request(&mut app, "/demo/application", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["clwStatusCode"], 4004);
    assert_eq!(body["data"]["exception"]["type"], "ApplicationError");
    assert_eq!(body["data"]["additionalData"]["widgetId"], 42);
    assert!(body["data"].get("stackTrace").is_some());
}

#[tokio::test]
async fn test_token_expired_modes() {
    let mut dev = create_test_app(true);
    let (status, _, body) = send_json_request(&mut dev, "/demo/token-expired", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["clwStatusCode"], 500);
    assert!(body["data"]["expiresAt"].is_string());

    let mut prod = create_test_app(false);
    let (status, _, body) = send_json_request(&mut prod, "/demo/token-expired", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("data").is_none());
    assert!(!body.to_string().contains("expiresAt"));
}

#[tokio::test]
async fn test_unauthorized_both_modes() {
    for development in [true, false] {
        let mut app = create_test_app(development);
        let (status, _, body) = send_json_request(&mut app, "/demo/unauthorized", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["clwStatusCode"], 500);
        assert!(!body.to_string().contains("expiresAt"));
    }
}

#[tokio::test]
async fn test_wrapped_application_error_delegates_to_cause() {
    let mut app = create_test_app(false);
    let (status, _, body) = send_json_request(&mut app, "/demo/wrapped", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["clwStatusCode"], 4090);
    assert_eq!(body["message"], "Widget 7 is already reserved");
}

#[tokio::test]
async fn test_unknown_error_is_500() {
    let mut app = create_test_app(false);
    let (status, _, body) = send_json_request(&mut app, "/demo/unknown", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["clwStatusCode"], 500);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_panic_is_translated() {
    let mut app = create_test_app(true);
    let (status, _, body) = send_json_request(&mut app, "/demo/panic", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["clwStatusCode"], 500);
    assert_eq!(body["data"]["exception"]["type"], "GenericError");
}

#[tokio::test]
async fn test_request_id_generated_when_absent() {
    let mut app = create_test_app(false);
    let (_, _, first) = send_json_request(&mut app, "/demo/unknown", None).await;
    let (_, _, second) = send_json_request(&mut app, "/demo/unknown", None).await;

    let first = first["requestId"].as_str().unwrap().to_owned();
    let second = second["requestId"].as_str().unwrap().to_owned();
    assert!(!first.is_empty());
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_modes_differ_only_by_data() {
    for uri in [
        "/demo/application",
        "/demo/token-expired",
        "/demo/unauthorized",
        "/demo/wrapped",
        "/demo/unknown",
    ] {
        let (dev_status, _, mut dev) =
            send_json_request(&mut create_test_app(true), uri, Some("same-id")).await;
        let (prod_status, _, prod) =
            send_json_request(&mut create_test_app(false), uri, Some("same-id")).await;

        assert_eq!(dev_status, prod_status, "{}", uri);
        assert!(dev.get("data").is_some(), "{}", uri);
        assert!(prod.get("data").is_none(), "{}", uri);

        dev.as_object_mut().unwrap().remove("data");
        assert_eq!(dev, prod, "{}", uri);
    }
}

#[tokio::test]
async fn test_metrics_count_error_envelopes() {
    let mut app = create_test_app(false);
    send_json_request(&mut app, "/demo/unauthorized", None).await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("error_envelopes_total"));
    assert!(text.contains("UNAUTHORIZED"));
}
