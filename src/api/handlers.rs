use anyhow::Context;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use utoipa::ToSchema;

use crate::config::Environment;
use crate::errors::{ApplicationError, Failure, TokenExpiredError, UnauthorizedError};

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub environment: Environment,
    pub instance_id: String,
}

/// Body returned by the demo endpoint that succeeds
#[derive(Debug, Serialize, ToSchema)]
pub struct DemoResponse {
    /// Always "ok"
    pub status: String,
}

/// Liveness and build information
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "error-envelope",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.environment.to_string(),
        "instance_id": state.instance_id,
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// Completes normally; the translator leaves the response untouched
#[utoipa::path(
    get,
    path = "/demo/ok",
    tag = "demo",
    responses(
        (status = 200, description = "Untouched success response", body = DemoResponse)
    )
)]
pub async fn demo_ok() -> Result<Json<DemoResponse>, Failure> {
    Ok(Json(DemoResponse {
        status: "ok".to_string(),
    }))
}

/// Raises an application error carrying its own status codes
#[utoipa::path(
    get,
    path = "/demo/application",
    tag = "demo",
    responses(
        (status = 404, description = "Application error envelope", body = crate::errors::ProductionEnvelope)
    )
)]
pub async fn demo_application() -> Result<Json<DemoResponse>, Failure> {
    Err(ApplicationError::not_found("Widget not found", 4004)
        .with_additional_data(json!({ "widgetId": 42 }))
        .into())
}

/// Raises an expired-token failure
#[utoipa::path(
    get,
    path = "/demo/token-expired",
    tag = "demo",
    responses(
        (status = 401, description = "Authorization error envelope", body = crate::errors::ProductionEnvelope)
    )
)]
pub async fn demo_token_expired() -> Result<Json<DemoResponse>, Failure> {
    Err(TokenExpiredError::new(Utc::now() - Duration::minutes(5)).into())
}

/// Raises an unauthorized failure
#[utoipa::path(
    get,
    path = "/demo/unauthorized",
    tag = "demo",
    responses(
        (status = 401, description = "Authorization error envelope", body = crate::errors::ProductionEnvelope)
    )
)]
pub async fn demo_unauthorized() -> Result<Json<DemoResponse>, Failure> {
    Err(UnauthorizedError::default().into())
}

fn reserve_widget(widget_id: u64) -> Result<(), ApplicationError> {
    Err(ApplicationError::conflict(
        format!("Widget {} is already reserved", widget_id),
        4090,
    ))
}

/// Raises a generic failure whose cause is an application error
#[utoipa::path(
    get,
    path = "/demo/wrapped",
    tag = "demo",
    responses(
        (status = 409, description = "Envelope built from the wrapped cause", body = crate::errors::ProductionEnvelope)
    )
)]
pub async fn demo_wrapped() -> Result<Json<DemoResponse>, Failure> {
    info!("Reserving widget");
    reserve_widget(7).context("Reservation workflow failed")?;
    Ok(Json(DemoResponse {
        status: "ok".to_string(),
    }))
}

/// Raises a failure outside the known kinds
#[utoipa::path(
    get,
    path = "/demo/unknown",
    tag = "demo",
    responses(
        (status = 500, description = "Unknown error envelope", body = crate::errors::ProductionEnvelope)
    )
)]
pub async fn demo_unknown() -> Result<Json<DemoResponse>, Failure> {
    let port = "not-a-port"
        .parse::<u16>()
        .context("Upstream returned an invalid port")?;
    Ok(Json(DemoResponse {
        status: port.to_string(),
    }))
}

/// Panics inside the handler
#[utoipa::path(
    get,
    path = "/demo/panic",
    tag = "demo",
    responses(
        (status = 500, description = "Unknown error envelope", body = crate::errors::ProductionEnvelope)
    )
)]
pub async fn demo_panic() -> Json<DemoResponse> {
    panic!("demo handler panicked")
}
