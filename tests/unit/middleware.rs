//! CORS and logging middleware tests

use analytics_gateway::middleware::{create_cors_layer, logging_middleware};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    routing::get,
};
use tower::ServiceExt;

use super::helpers::create_test_config;

fn probe_router() -> Router {
    Router::new().route("/", get(|| async { "ok" }))
}

#[tokio::test]
async fn wildcard_config_allows_any_origin() {
    crate::init_test_env();
    let config = create_test_config();
    let cors = create_cors_layer(&config.cors)
        .unwrap()
        .expect("CORS should be enabled");

    let response = probe_router()
        .layer(cors)
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn explicit_origins_echo_only_allowed_origins() {
    let mut config = create_test_config();
    config.cors.allowed_origins = vec!["https://dashboards.example.com".to_string()];

    let allowed = probe_router()
        .layer(create_cors_layer(&config.cors).unwrap().unwrap())
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://dashboards.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("https://dashboards.example.com")
    );

    let denied = probe_router()
        .layer(create_cors_layer(&config.cors).unwrap().unwrap())
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(
        denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn preflight_reports_methods_and_max_age() {
    let config = create_test_config();
    let cors = create_cors_layer(&config.cors).unwrap().unwrap();

    let response = probe_router()
        .layer(cors)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let methods = response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(methods.contains("POST"));
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_MAX_AGE)
            .is_some()
    );
}

#[test]
fn disabled_cors_produces_no_layer() {
    let mut config = create_test_config();
    config.cors.enabled = false;
    assert!(create_cors_layer(&config.cors).unwrap().is_none());
}

#[test]
fn invalid_origin_is_a_configuration_error() {
    let mut config = create_test_config();
    config.cors.allowed_origins = vec!["https://bad\u{0}origin".to_string()];
    assert!(create_cors_layer(&config.cors).is_err());
}

#[test]
fn invalid_method_is_a_configuration_error() {
    let mut config = create_test_config();
    config.cors.allowed_methods = vec!["NOT A METHOD".to_string()];
    assert!(create_cors_layer(&config.cors).is_err());
}

#[tokio::test]
async fn logging_middleware_passes_responses_through() {
    crate::init_test_env();
    let app = probe_router().layer(axum::middleware::from_fn(logging_middleware));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
