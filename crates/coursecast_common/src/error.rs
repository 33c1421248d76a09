// --- File: crates/coursecast_common/src/error.rs ---
use serde::{Deserialize, Serialize};

/// A trait for converting errors to HTTP status codes.
///
/// Implemented by every domain error that can reach an HTTP handler, so the
/// mapping from error kind to status lives next to the error definition.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

/// JSON body returned for every failed request.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Human readable description of the failure
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}
