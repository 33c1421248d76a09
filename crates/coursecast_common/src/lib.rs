// --- File: crates/coursecast_common/src/lib.rs ---

pub mod error; // Status-code mapping for domain errors
pub mod http; // HTTP error responses
pub mod logging; // Logging utilities
pub mod models; // Shared data structures
pub mod services; // Delivery gateway contract

// Re-export error and HTTP utilities for easier access
pub use error::{ErrorBody, HttpStatusCode};
pub use http::{error_response, IntoHttpResponse};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_result};

pub use models::DeviceRecord;
pub use services::{
    BoxFuture, BoxedError, BoxedGateway, CredentialContext, MulticastReport, PushGateway,
    PushMessage, PushNotification, SendTarget, TokenOutcome,
};
