#![allow(dead_code)]
use utoipa::OpenApi;

use crate::models::{
    DeliveryOutcome, DeliveryReport, PushRequest, RegisterTokenRequest, RegisterTokenResponse,
    SingleDelivery, TargetKind,
};
use coursecast_common::{DeviceRecord, ErrorBody, MulticastReport, TokenOutcome};

#[utoipa::path(
    post,
    path = "/push",
    request_body(content = PushRequest, example = json!({
        "partner": "poc1",
        "environment": "qa",
        "title": "Nova aula",
        "message": "A aula 3 já está disponível",
        "course": "123"
    })),
    responses(
        (status = 200, description = "Notification handed to the push provider", body = DeliveryReport,
         example = json!({
             "success": true,
             "type": "course",
             "course": "123",
             "quantity": 2,
             "response": {
                 "sent": 1,
                 "failed": 1,
                 "responses": [
                     {"token": "token-a", "success": true, "message_id": "projects/poc1/messages/1"},
                     {"token": "token-b", "success": false, "error": "UNREGISTERED: Requested entity was not found."}
                 ]
             }
         })
        ),
        (status = 400, description = "Missing required fields or version mismatch", body = ErrorBody,
         example = json!({"success": false, "error": "Missing required fields: title"})
        ),
        (status = 404, description = "No matching recipient", body = ErrorBody,
         example = json!({"success": false, "error": "No registered devices found for course 123"})
        ),
        (status = 500, description = "Unknown partner or push provider failure", body = ErrorBody,
         example = json!({"success": false, "error": "Push delivery failed: Authentication error"})
        )
    ),
    tag = "Push"
)]
fn doc_push_handler() {}

#[utoipa::path(
    post,
    path = "/api/token",
    request_body(content = RegisterTokenRequest, example = json!({
        "studentId": "poc1qa123456",
        "token": "fcm-registration-token",
        "partner": "poc1",
        "environment": "qa",
        "version": "1.4.0"
    })),
    responses(
        (status = 200, description = "Token registered", body = RegisterTokenResponse),
        (status = 400, description = "Missing required fields", body = ErrorBody,
         example = json!({"success": false, "error": "Missing required fields: token"})
        ),
        (status = 404, description = "Unknown student", body = ErrorBody,
         example = json!({"success": false, "error": "Student ghost not found"})
        )
    ),
    tag = "Push"
)]
fn doc_register_token_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(doc_push_handler, doc_register_token_handler),
    components(schemas(
        PushRequest,
        RegisterTokenRequest,
        RegisterTokenResponse,
        DeliveryReport,
        DeliveryOutcome,
        SingleDelivery,
        TargetKind,
        MulticastReport,
        TokenOutcome,
        DeviceRecord,
        ErrorBody
    )),
    tags((name = "Push", description = "Push notification dispatch and device registration"))
)]
pub struct PushApiDoc;
