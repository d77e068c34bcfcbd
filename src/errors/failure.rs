use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Stack trace captured when a failure is constructed.
///
/// Capture follows `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`; when disabled the
/// trace renders as `None`.
#[derive(Debug, Clone)]
pub struct StackTrace(Arc<Backtrace>);

impl StackTrace {
    pub fn capture() -> Self {
        Self(Arc::new(Backtrace::capture()))
    }

    pub fn render(&self) -> Option<String> {
        match self.0.status() {
            BacktraceStatus::Captured => Some(self.0.to_string()),
            _ => None,
        }
    }
}

impl Default for StackTrace {
    fn default() -> Self {
        Self::capture()
    }
}

/// Business-raised failure with explicit HTTP and internal status codes
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApplicationError {
    pub http_status: StatusCode,
    /// Application-specific code, independent of the HTTP status
    pub clw_status_code: i64,
    pub message: String,
    pub additional_data: Option<Value>,
    pub stack: StackTrace,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>, http_status: StatusCode, clw_status_code: i64) -> Self {
        Self {
            http_status,
            clw_status_code,
            message: message.into(),
            additional_data: None,
            stack: StackTrace::capture(),
        }
    }

    /// Attach structured data exposed in development diagnostics
    pub fn with_additional_data(mut self, data: Value) -> Self {
        self.additional_data = Some(data);
        self
    }

    pub fn not_found(message: impl Into<String>, clw_status_code: i64) -> Self {
        Self::new(message, StatusCode::NOT_FOUND, clw_status_code)
    }

    pub fn bad_request(message: impl Into<String>, clw_status_code: i64) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST, clw_status_code)
    }

    pub fn forbidden(message: impl Into<String>, clw_status_code: i64) -> Self {
        Self::new(message, StatusCode::FORBIDDEN, clw_status_code)
    }

    pub fn conflict(message: impl Into<String>, clw_status_code: i64) -> Self {
        Self::new(message, StatusCode::CONFLICT, clw_status_code)
    }

    pub fn describe(&self) -> Value {
        json!({
            "type": "ApplicationError",
            "message": self.message,
            "httpStatusCode": self.http_status.as_u16(),
            "clwStatusCode": self.clw_status_code,
            "additionalData": self.additional_data,
        })
    }
}

/// Authentication token has expired
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TokenExpiredError {
    pub message: String,
    pub expires_at: DateTime<Utc>,
    pub stack: StackTrace,
}

impl TokenExpiredError {
    pub fn new(expires_at: DateTime<Utc>) -> Self {
        Self::with_message(
            format!(
                "The token is expired. Expired at '{}'",
                expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            expires_at,
        )
    }

    pub fn with_message(message: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            expires_at,
            stack: StackTrace::capture(),
        }
    }

    pub fn describe(&self) -> Value {
        json!({
            "type": "TokenExpiredError",
            "message": self.message,
            "expiresAt": self.expires_at,
        })
    }
}

/// Missing or invalid authorization
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UnauthorizedError {
    pub message: String,
    pub stack: StackTrace,
}

impl UnauthorizedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: StackTrace::capture(),
        }
    }

    pub fn describe(&self) -> Value {
        json!({
            "type": "UnauthorizedError",
            "message": self.message,
        })
    }
}

impl Default for UnauthorizedError {
    fn default() -> Self {
        Self::new("Attempted to perform an unauthorized operation.")
    }
}

/// Any other failure, optionally wrapping an application error
#[derive(Debug, Clone)]
pub struct GenericError {
    pub message: String,
    pub cause: Option<ApplicationError>,
    pub stack: StackTrace,
}

impl GenericError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            stack: StackTrace::capture(),
        }
    }

    pub fn wrapping(message: impl Into<String>, cause: ApplicationError) -> Self {
        Self {
            cause: Some(cause),
            ..Self::new(message)
        }
    }

    pub fn describe(&self) -> Value {
        json!({
            "type": "GenericError",
            "message": self.message,
            "cause": self.cause.as_ref().map(ApplicationError::describe),
        })
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for GenericError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// A failure raised while processing a request
#[derive(Debug, Clone, Error)]
pub enum Failure {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    TokenExpired(#[from] TokenExpiredError),

    #[error(transparent)]
    Unauthorized(#[from] UnauthorizedError),

    #[error(transparent)]
    Generic(#[from] GenericError),
}

impl Failure {
    /// Raw representation exposed in development diagnostics
    pub fn describe(&self) -> Value {
        match self {
            Self::Application(e) => e.describe(),
            Self::TokenExpired(e) => e.describe(),
            Self::Unauthorized(e) => e.describe(),
            Self::Generic(e) => e.describe(),
        }
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        // Only the outermost error decides the kind; context-wrapped
        // application errors become the cause of a generic failure.
        let outer: &(dyn StdError + 'static) = err.as_ref();
        if let Some(failure) = outer.downcast_ref::<Failure>() {
            return failure.clone();
        }
        if let Some(e) = outer.downcast_ref::<ApplicationError>() {
            return Self::Application(e.clone());
        }
        if let Some(e) = outer.downcast_ref::<TokenExpiredError>() {
            return Self::TokenExpired(e.clone());
        }
        if let Some(e) = outer.downcast_ref::<UnauthorizedError>() {
            return Self::Unauthorized(e.clone());
        }
        if let Some(e) = outer.downcast_ref::<GenericError>() {
            return Self::Generic(e.clone());
        }

        let cause = err
            .chain()
            .skip(1)
            .find_map(application_cause)
            .cloned();

        Self::Generic(GenericError {
            message: err.to_string(),
            cause,
            stack: StackTrace::capture(),
        })
    }
}

/// Application error carried by one link of an error chain
fn application_cause<'a>(source: &'a (dyn StdError + 'static)) -> Option<&'a ApplicationError> {
    if let Some(e) = source.downcast_ref::<ApplicationError>() {
        return Some(e);
    }
    match source.downcast_ref::<Failure>() {
        Some(Failure::Application(e))
        | Some(Failure::Generic(GenericError {
            cause: Some(e), ..
        })) => Some(e),
        _ => None,
    }
}

/// Carries a failure from a handler to the translation middleware
#[derive(Debug, Clone)]
pub(crate) struct FailureExtension(pub(crate) Failure);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        // Placeholder; the translation middleware replaces it with an envelope
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(FailureExtension(self));
        response
    }
}
