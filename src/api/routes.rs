use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    demo_application, demo_ok, demo_panic, demo_token_expired, demo_unauthorized, demo_unknown,
    demo_wrapped, health, AppState,
};
use super::middleware::{logging_middleware, RouterExt};
use super::openapi::ApiDoc;
use crate::metrics;
use crate::translator::ErrorTranslator;

pub fn create_router(state: AppState, translator: ErrorTranslator) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health))
        // Endpoints raising each failure kind
        .route("/demo/ok", get(demo_ok))
        .route("/demo/application", get(demo_application))
        .route("/demo/token-expired", get(demo_token_expired))
        .route("/demo/unauthorized", get(demo_unauthorized))
        .route("/demo/wrapped", get(demo_wrapped))
        .route("/demo/unknown", get(demo_unknown))
        .route("/demo/panic", get(demo_panic))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler))
        // OpenAPI documentation
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware, inner to outer: catch panic -> translate -> logging -> metrics
        // -> cors -> request id -> trace
        .use_error_translator(translator)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .use_request_id()
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
