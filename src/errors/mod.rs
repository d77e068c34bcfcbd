//! Failure taxonomy and structured error envelopes

pub mod codes;
pub mod failure;
pub mod response;

pub use codes::FailureKind;
pub(crate) use failure::FailureExtension;
pub use failure::{
    ApplicationError, Failure, GenericError, StackTrace, TokenExpiredError, UnauthorizedError,
};
pub use response::{
    DevelopmentEnvelope, Envelope, ProductionEnvelope, DEFAULT_ERROR_MESSAGE,
    ENVELOPE_CONTENT_TYPE,
};
