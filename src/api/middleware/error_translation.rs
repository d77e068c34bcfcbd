use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::any::Any;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
};
use tracing::error;

use crate::errors::{Failure, FailureExtension, GenericError};
use crate::translator::{BufferedResponse, ErrorTranslator, RequestContext};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id assigned by `SetRequestIdLayer`, or the raw header when the
/// layer is not installed
pub fn request_context(request: &Request) -> RequestContext {
    let trace_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
        })
        .map(str::to_owned);

    RequestContext::new(trace_id)
}

/// Runs the rest of the stack and replaces any failure it raised with an
/// error envelope. Successful responses pass through unchanged.
pub async fn error_translation_middleware(
    State(translator): State<ErrorTranslator>,
    request: Request,
    next: Next,
) -> Response {
    let context = request_context(&request);
    let mut envelope = BufferedResponse::new();
    let mut passthrough = None;
    let slot = &mut passthrough;

    let outcome = translator
        .intercept(
            async move {
                let mut response = next.run(request).await;
                match response.extensions_mut().remove::<FailureExtension>() {
                    Some(FailureExtension(failure)) => Err(failure),
                    None => {
                        *slot = Some(response);
                        Ok(())
                    }
                }
            },
            &context,
            &mut envelope,
        )
        .await;

    match outcome {
        Ok(()) => passthrough.unwrap_or_else(|| envelope.into_response()),
        // A broken pipeline, never a caller-facing condition
        Err(violation) => {
            error!(error = %violation, "Error translation invariant violated");
            panic!("{violation}");
        }
    }
}

/// `CatchPanicLayer` handler turning a handler panic into an unknown failure
pub fn panic_to_failure(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    error!(details = %details, "Handler panicked");

    Failure::from(GenericError::new(format!("Request handler panicked: {}", details)))
        .into_response()
}

/// Pipeline registration for the error translator
pub trait RouterExt {
    /// Translate failures and panics raised by the routes added so far
    fn use_error_translator(self, translator: ErrorTranslator) -> Self;

    /// Assign an `x-request-id` to every request and echo it on the response
    fn use_request_id(self) -> Self;
}

impl<S> RouterExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn use_error_translator(self, translator: ErrorTranslator) -> Self {
        self.layer(CatchPanicLayer::custom(panic_to_failure))
            .layer(middleware::from_fn_with_state(
                translator,
                error_translation_middleware,
            ))
    }

    fn use_request_id(self) -> Self {
        self.layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }
}
