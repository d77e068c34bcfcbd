//! Translates unhandled request failures into JSON error envelopes.
//!
//! The flow for a failed request is fixed: classify the failure, log it,
//! derive a [`Decision`], render it into an [`Envelope`] and write that
//! envelope exactly once.

pub mod writer;

use axum::http::StatusCode;
use serde_json::{json, Map, Value};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{
    ApplicationError, DevelopmentEnvelope, Envelope, Failure, FailureKind, GenericError,
    ProductionEnvelope, TokenExpiredError, UnauthorizedError, DEFAULT_ERROR_MESSAGE,
    ENVELOPE_CONTENT_TYPE,
};
use crate::metrics::ERROR_ENVELOPES_TOTAL;

pub use writer::{BufferedResponse, ResponseWriter};

/// Internal status code paired with HTTP 401 for authorization failures
pub const AUTHORIZATION_CLW_STATUS_CODE: i64 = 500;

/// Internal status code for failures without their own code
pub const UNKNOWN_CLW_STATUS_CODE: i64 = 500;

/// Errors that escape the translator. Both indicate a bug in the
/// surrounding pipeline rather than a caller-facing condition.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error(
        "The response has already started, the error translator will not write an envelope (request {request_id})"
    )]
    ResponseAlreadyStarted { request_id: String },

    #[error("Failed to encode error envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Per-request data the translator reads
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub trace_id: Option<String>,
}

impl RequestContext {
    pub fn new(trace_id: Option<String>) -> Self {
        Self { trace_id }
    }

    /// Trace id of the request, or a fresh UUID when none was assigned
    pub fn request_id(&self) -> String {
        match self.trace_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => Uuid::new_v4().to_string(),
        }
    }
}

/// Outcome of classifying a failure
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: FailureKind,
    pub http_status: StatusCode,
    pub clw_status_code: i64,
    pub message: String,
    /// Exposed only in development envelopes
    pub diagnostic: Option<Value>,
}

/// A failure matched against the closed set of kinds
enum Classified<'a> {
    Application(&'a ApplicationError),
    TokenExpired(&'a TokenExpiredError),
    Unauthorized(&'a UnauthorizedError),
    WrappedApplication(&'a ApplicationError),
    Unknown(&'a GenericError),
}

impl<'a> Classified<'a> {
    fn of(failure: &'a Failure) -> Self {
        match failure {
            Failure::Application(e) => Self::Application(e),
            Failure::TokenExpired(e) => Self::TokenExpired(e),
            Failure::Unauthorized(e) => Self::Unauthorized(e),
            Failure::Generic(GenericError {
                cause: Some(cause), ..
            }) => Self::WrappedApplication(cause),
            Failure::Generic(e) => Self::Unknown(e),
        }
    }

    fn kind(&self) -> FailureKind {
        match self {
            Self::Application(_) => FailureKind::ApplicationError,
            Self::TokenExpired(_) => FailureKind::TokenExpired,
            Self::Unauthorized(_) => FailureKind::Unauthorized,
            Self::WrappedApplication(_) => FailureKind::WrappedApplicationError,
            Self::Unknown(_) => FailureKind::UnknownError,
        }
    }

    fn decide(self) -> Decision {
        let kind = self.kind();
        match self {
            Self::Application(e) => {
                let mut diagnostic = Map::new();
                diagnostic.insert("exception".into(), e.describe());
                diagnostic.insert("stackTrace".into(), json!(e.stack.render()));
                if let Some(data) = &e.additional_data {
                    diagnostic.insert("additionalData".into(), data.clone());
                }

                Decision {
                    kind,
                    http_status: e.http_status,
                    clw_status_code: e.clw_status_code,
                    message: e.message.clone(),
                    diagnostic: Some(Value::Object(diagnostic)),
                }
            }
            Self::TokenExpired(e) => Decision {
                kind,
                http_status: StatusCode::UNAUTHORIZED,
                clw_status_code: AUTHORIZATION_CLW_STATUS_CODE,
                message: DEFAULT_ERROR_MESSAGE.to_string(),
                diagnostic: Some(json!({
                    "message": e.message,
                    "stackTrace": e.stack.render(),
                    "expiresAt": e.expires_at,
                })),
            },
            Self::Unauthorized(e) => Decision {
                kind,
                http_status: StatusCode::UNAUTHORIZED,
                clw_status_code: AUTHORIZATION_CLW_STATUS_CODE,
                message: DEFAULT_ERROR_MESSAGE.to_string(),
                diagnostic: Some(json!({
                    "message": e.message,
                    "stackTrace": e.stack.render(),
                })),
            },
            Self::WrappedApplication(cause) => Decision {
                kind,
                http_status: cause.http_status,
                clw_status_code: cause.clw_status_code,
                message: cause.message.clone(),
                diagnostic: Some(json!({
                    "exception": cause.describe(),
                    "stackTrace": cause.stack.render(),
                })),
            },
            Self::Unknown(e) => Decision {
                kind,
                http_status: StatusCode::INTERNAL_SERVER_ERROR,
                clw_status_code: UNKNOWN_CLW_STATUS_CODE,
                message: e.message.clone(),
                diagnostic: Some(json!({
                    "exception": e.describe(),
                    "stackTrace": e.stack.render(),
                })),
            },
        }
    }
}

/// Converts unhandled failures into a single JSON envelope per request
#[derive(Debug, Clone, Copy)]
pub struct ErrorTranslator {
    development: bool,
}

impl ErrorTranslator {
    pub fn new(development: bool) -> Self {
        Self { development }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.environment.is_development())
    }

    /// Kind of a failure; first match wins
    pub fn classify(failure: &Failure) -> FailureKind {
        Classified::of(failure).kind()
    }

    /// Status codes, message and diagnostics for a failure
    pub fn decide(failure: &Failure) -> Decision {
        Classified::of(failure).decide()
    }

    /// Render a decision; production envelopes never carry diagnostics
    pub fn render(&self, decision: Decision, request_id: String) -> Envelope {
        if self.development {
            Envelope::Development(DevelopmentEnvelope {
                status_code: decision.http_status.as_u16(),
                clw_status_code: decision.clw_status_code,
                request_id,
                data: decision.diagnostic,
                message: decision.message,
            })
        } else {
            Envelope::Production(ProductionEnvelope {
                status_code: decision.http_status.as_u16(),
                clw_status_code: decision.clw_status_code,
                request_id,
                message: decision.message,
            })
        }
    }

    /// Run the next stage once and translate its failure, if any
    pub async fn intercept<Fut, W>(
        &self,
        next: Fut,
        context: &RequestContext,
        response: &mut W,
    ) -> Result<(), InterceptError>
    where
        Fut: Future<Output = Result<(), Failure>>,
        W: ResponseWriter + ?Sized,
    {
        match next.await {
            Ok(()) => Ok(()),
            Err(failure) => self.translate(&failure, context, response).await,
        }
    }

    /// Log a failure and write its envelope
    pub async fn translate<W>(
        &self,
        failure: &Failure,
        context: &RequestContext,
        response: &mut W,
    ) -> Result<(), InterceptError>
    where
        W: ResponseWriter + ?Sized,
    {
        let request_id = context.request_id();
        let classified = Classified::of(failure);
        let kind = classified.kind();

        error!(
            request_id = %request_id,
            kind = %kind,
            error = %failure,
            "Unhandled failure while processing request"
        );

        let decision = classified.decide();
        let status = decision.http_status;
        let envelope = self.render(decision, request_id);

        if response.has_started() {
            return Err(InterceptError::ResponseAlreadyStarted {
                request_id: envelope.request_id().to_owned(),
            });
        }

        let body = envelope.to_json()?;
        response.set_status(status);
        response.set_content_type(ENVELOPE_CONTENT_TYPE);
        response.write_body(body.into()).await;

        ERROR_ENVELOPES_TOTAL
            .with_label_values(&[kind.as_str(), status.as_str()])
            .inc();

        debug!(
            request_id = %envelope.request_id(),
            status = %status.as_u16(),
            development = self.development,
            "Error envelope written"
        );

        Ok(())
    }
}
