// Library exports for testing
pub mod api;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod translator;

pub use errors::{
    ApplicationError, Envelope, Failure, FailureKind, GenericError, TokenExpiredError,
    UnauthorizedError,
};
pub use translator::{Decision, ErrorTranslator, InterceptError, RequestContext, ResponseWriter};
