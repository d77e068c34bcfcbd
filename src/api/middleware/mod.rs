pub mod error_translation;
pub mod logging;

pub use error_translation::{
    error_translation_middleware, panic_to_failure, request_context, RouterExt, REQUEST_ID_HEADER,
};
pub use logging::logging_middleware;
