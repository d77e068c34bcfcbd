use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Closed set of failure kinds recognised by the error translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Business failure carrying its own status codes
    ApplicationError,

    /// Authentication token has expired
    TokenExpired,

    /// Missing or invalid authorization
    Unauthorized,

    /// Generic failure whose cause is an application error
    WrappedApplicationError,

    /// Anything else
    UnknownError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    /// Stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationError => "APPLICATION_ERROR",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::WrappedApplicationError => "WRAPPED_APPLICATION_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}
