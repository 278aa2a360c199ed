//! Request and response types shared by the HTTP surfaces

pub mod error;
pub mod json;
pub mod stream;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use stream::sse_response;
