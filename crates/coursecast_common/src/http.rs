// --- File: crates/coursecast_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt::Display;

use crate::error::{ErrorBody, HttpStatusCode};

/// Extension trait converting a status-aware error into an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl<E> IntoHttpResponse for E
where
    E: HttpStatusCode + Display,
{
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        error_response(status_code, self.to_string())
    }
}

/// Builds a `{ "success": false, "error": message }` response with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Teapot;

    impl Display for Teapot {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "short and stout")
        }
    }

    impl HttpStatusCode for Teapot {
        fn status_code(&self) -> u16 {
            418
        }
    }

    #[test]
    fn test_status_code_is_carried_into_response() {
        let response = Teapot.into_http_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_invalid_status_falls_back_to_500() {
        struct Broken;
        impl Display for Broken {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "broken")
            }
        }
        impl HttpStatusCode for Broken {
            fn status_code(&self) -> u16 {
                1000
            }
        }

        let response = Broken.into_http_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
