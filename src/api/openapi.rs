use utoipa::OpenApi;

use crate::api::handlers::DemoResponse;
use crate::errors::{DevelopmentEnvelope, FailureKind, ProductionEnvelope};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Error Envelope",
        version = "0.1.0",
        description = "Request pipeline component that converts unhandled failures into structured JSON error envelopes. Development envelopes carry a diagnostic `data` payload; production envelopes never do.",
    ),
    paths(
        crate::api::handlers::health,
        crate::api::handlers::demo_ok,
        crate::api::handlers::demo_application,
        crate::api::handlers::demo_token_expired,
        crate::api::handlers::demo_unauthorized,
        crate::api::handlers::demo_wrapped,
        crate::api::handlers::demo_unknown,
        crate::api::handlers::demo_panic,
    ),
    components(
        schemas(
            DevelopmentEnvelope,
            ProductionEnvelope,
            FailureKind,
            DemoResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "demo", description = "Endpoints raising each failure kind"),
    )
)]
pub struct ApiDoc;
