use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use coursecast_common::{HttpStatusCode, IntoHttpResponse};
use coursecast_db::DbError;
use thiserror::Error;

/// Failures of the push and token registration operations.
#[derive(Error, Debug)]
pub enum PushError {
    /// A required field is missing or empty
    #[error("Missing required fields: {0}")]
    InvalidRequest(String),

    /// The body is not JSON or a field has the wrong type
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// The targeted identity is not in the registry
    #[error("Student {0} not found")]
    NotFound(String),

    /// A course or version selection matched no registered device
    #[error("No registered devices found for {0}")]
    NoRecipients(String),

    /// The identity is registered with a different app version
    #[error("Student {student} is on version {actual}, not {requested}")]
    VersionMismatch {
        student: String,
        requested: String,
        actual: String,
    },

    /// The identity exists but never registered a device token
    #[error("Student {0} has no registered device token")]
    EmptyToken(String),

    /// No delivery credentials are configured for the partner
    #[error("Invalid partner '{partner}'. Use one of: {known}")]
    InvalidPartner { partner: String, known: String },

    /// The delivery gateway rejected or failed the call
    #[error("Push delivery failed: {0}")]
    Gateway(String),

    /// The delivery gateway did not answer in time
    #[error("Push delivery timed out after {0} seconds")]
    GatewayTimeout(u64),

    /// The device registry could not be read or written
    #[error("Device registry error: {0}")]
    Registry(String),
}

impl From<DbError> for PushError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(id) => PushError::NotFound(id),
            other => PushError::Registry(other.to_string()),
        }
    }
}

impl From<JsonRejection> for PushError {
    fn from(rejection: JsonRejection) -> Self {
        PushError::MalformedBody(rejection.body_text())
    }
}

impl HttpStatusCode for PushError {
    fn status_code(&self) -> u16 {
        match self {
            PushError::InvalidRequest(_) => 400,
            PushError::MalformedBody(_) => 400,
            PushError::VersionMismatch { .. } => 400,
            PushError::NotFound(_) => 404,
            PushError::NoRecipients(_) => 404,
            PushError::EmptyToken(_) => 404,
            PushError::InvalidPartner { .. } => 500,
            PushError::Gateway(_) => 500,
            PushError::GatewayTimeout(_) => 500,
            PushError::Registry(_) => 500,
        }
    }
}

impl IntoResponse for PushError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
