//! Firebase Cloud Messaging client module
//!
//! Thin client for the FCM HTTP v1 `messages:send` endpoint, plus the wire
//! types of the request and response bodies.

use crate::auth::{AccessTokenProvider, FcmAuthorization, ServiceAccountTokenProvider};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Production endpoint of the FCM HTTP v1 API
pub const FCM_BASE_URL: &str = "https://fcm.googleapis.com";

/// Errors that can occur when interacting with the Firebase Cloud Messaging API
#[derive(Error, Debug)]
pub enum FirebaseError {
    /// Error during authentication with Firebase
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to Firebase API
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing required configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// Error returned by the Firebase API
    #[error("Firebase API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

/// A message to be sent via Firebase Cloud Messaging
#[derive(Debug, Clone, Serialize)]
pub struct FcmMessage {
    pub message: Message,
}

/// The message payload for Firebase Cloud Messaging
///
/// Exactly one of `token` and `topic` is set.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Registration token of the target device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Topic the target devices are subscribed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    pub notification: Option<Notification>,

    /// Custom key-value data delivered to the client app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
}

/// The notification to be displayed on the user's device
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Response from the Firebase Cloud Messaging API
#[derive(Debug, Deserialize)]
pub struct FcmResponse {
    /// Message id in the format "projects/{project_id}/messages/{message_id}"
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FcmErrorEnvelope {
    error: FcmErrorBody,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<FcmErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// Turns an FCM error body into a short "CODE: message" string, e.g.
/// `UNREGISTERED: Requested entity was not found.`
fn describe_api_error(raw: &str) -> String {
    match serde_json::from_str::<FcmErrorEnvelope>(raw) {
        Ok(envelope) => {
            let code = envelope
                .error
                .details
                .iter()
                .find_map(|d| d.error_code.clone())
                .or(envelope.error.status);
            match code {
                Some(code) => format!("{}: {}", code, envelope.error.message),
                None => envelope.error.message,
            }
        }
        Err(_) => raw.to_string(),
    }
}

/// Client for the Firebase Cloud Messaging API
///
/// Cheap to clone: the HTTP client and token provider are shared.
#[derive(Clone)]
pub struct FirebaseClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl FirebaseClient {
    /// Creates a client authenticating through service accounts.
    ///
    /// `timeout` bounds every HTTP request made by this client.
    pub fn new(timeout: Duration) -> Result<Self, FirebaseError> {
        Self::with_provider(FCM_BASE_URL, Arc::new(ServiceAccountTokenProvider), timeout)
    }

    /// Creates a client against another endpoint (emulator, mock server) with a
    /// custom token provider.
    pub fn with_provider(
        base_url: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
        timeout: Duration,
    ) -> Result<Self, FirebaseError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn token_provider(&self) -> &Arc<dyn AccessTokenProvider> {
        &self.tokens
    }

    fn send_url(&self, project_id: &str) -> String {
        format!("{}/v1/projects/{}/messages:send", self.base_url, project_id)
    }

    /// Sends one message with an already obtained authorization.
    ///
    /// Returns the message id on success.
    ///
    /// # Errors
    ///
    /// * The HTTP request fails or times out
    /// * The FCM API returns an error response
    pub async fn send_message(
        &self,
        authorization: &FcmAuthorization,
        message: &FcmMessage,
    ) -> Result<String, FirebaseError> {
        let url = self.send_url(&authorization.project_id);

        let response = self
            .client
            .post(&url)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", authorization.access_token),
            )
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(FirebaseError::ApiError {
                status: status.as_u16(),
                message: describe_api_error(&error_text),
            });
        }

        let fcm_response: FcmResponse = response.json().await?;
        Ok(fcm_response.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use wiremock::matchers::{body_partial_json, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> FirebaseClient {
        FirebaseClient::with_provider(
            server.uri(),
            Arc::new(StaticTokenProvider::new("test-token")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn authorization() -> FcmAuthorization {
        FcmAuthorization {
            project_id: "poc1-project".to_string(),
            access_token: "test-token".to_string(),
        }
    }

    fn topic_message(topic: &str) -> FcmMessage {
        FcmMessage {
            message: Message {
                token: None,
                topic: Some(topic.to_string()),
                notification: Some(Notification {
                    title: "Hello".to_string(),
                    body: "World".to_string(),
                }),
                data: None,
            },
        }
    }

    #[test]
    fn test_describe_api_error_prefers_fcm_error_code() {
        let raw = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND",
            "details":[{"@type":"type.googleapis.com/google.firebase.fcm.v1.FcmError","errorCode":"UNREGISTERED"}]}}"#;
        assert_eq!(
            describe_api_error(raw),
            "UNREGISTERED: Requested entity was not found."
        );
        assert_eq!(describe_api_error("gateway exploded"), "gateway exploded");
    }

    #[test]
    fn test_message_omits_absent_target() {
        let json = serde_json::to_value(topic_message("poc1-qa")).unwrap();
        assert_eq!(json["message"]["topic"], "poc1-qa");
        assert!(json["message"].get("token").is_none());
        assert!(json["message"].get("data").is_none());
    }

    #[tokio::test]
    async fn test_send_message_returns_message_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/poc1-project/messages:send"))
            .and(header_is("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "message": {"topic": "poc1-release", "notification": {"title": "Hello"}}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "projects/poc1-project/messages/42"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server)
            .send_message(&authorization(), &topic_message("poc1-release"))
            .await
            .unwrap();
        assert_eq!(id, "projects/poc1-project/messages/42");
    }

    #[tokio::test]
    async fn test_send_message_maps_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "SenderId mismatch", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .send_message(&authorization(), &topic_message("poc1-qa"))
            .await
            .unwrap_err();
        match err {
            FirebaseError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "PERMISSION_DENIED: SenderId mismatch");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
