//! HTTP handlers for push dispatch and token registration

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::{IntoResponse, Response},
};
use coursecast_common::HttpStatusCode;
use coursecast_db::DeviceRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PushError;
use crate::models::{PushRequest, RegisterTokenRequest, RegisterTokenResponse};
use crate::service::PushService;

/// Shared state of the push routes
pub type PushState<R> = Arc<PushService<R>>;

fn log_rejection(operation: &str, err: &PushError) {
    // 5xx outcomes are logged where they arise.
    if err.status_code() < 500 {
        warn!("{} rejected: {}", operation, err);
    }
}

fn reject(operation: &str, err: PushError) -> Response {
    log_rejection(operation, &err);
    err.into_response()
}

/// Handler for `POST /push`
pub async fn push_handler<R: DeviceRegistry + 'static>(
    State(service): State<PushState<R>>,
    payload: Result<Json<PushRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return reject("Push", rejection.into()),
    };
    let (targeting, title, body) = payload.into_parts();
    debug!("Push request: {:?}", targeting);

    match service.dispatch(&targeting, &title, &body).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => reject("Push", err),
    }
}

/// Handler for `POST /api/token`
pub async fn register_token_handler<R: DeviceRegistry + 'static>(
    State(service): State<PushState<R>>,
    payload: Result<Json<RegisterTokenRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return reject("Token registration", rejection.into()),
    };
    let field = |value: &Option<String>| value.clone().unwrap_or_default();

    let result = service
        .register(
            &field(&payload.student_id),
            &field(&payload.token),
            &field(&payload.partner),
            &field(&payload.environment),
            &field(&payload.version),
        )
        .await;

    match result {
        Ok(student) => Json(RegisterTokenResponse {
            success: true,
            student,
        })
        .into_response(),
        Err(err) => reject("Token registration", err),
    }
}
