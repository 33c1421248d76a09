//! [`PushGateway`] implementation on top of FCM.
//!
//! FCM v1 has no batch endpoint, so a multicast is one `messages:send` per
//! token, issued concurrently. Authorization happens once per call; if it
//! fails the whole call fails, while rejections of single tokens end up in the
//! report.

use crate::client::{FcmMessage, FirebaseClient, FirebaseError, Message, Notification};
use coursecast_common::services::{
    BoxFuture, CredentialContext, MulticastReport, PushGateway, PushMessage, SendTarget,
    TokenOutcome,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

fn to_fcm(target: SendTarget, message: &PushMessage) -> FcmMessage {
    let (token, topic) = match target {
        SendTarget::Token(token) => (Some(token), None),
        SendTarget::Topic(topic) => (None, Some(topic)),
    };
    FcmMessage {
        message: Message {
            token,
            topic,
            notification: Some(Notification {
                title: message.notification.title.clone(),
                body: message.notification.body.clone(),
            }),
            data: if message.data.is_empty() {
                None
            } else {
                Some(message.data.clone())
            },
        },
    }
}

/// Delivery gateway sending through Firebase Cloud Messaging
#[derive(Clone)]
pub struct FirebaseGateway {
    client: FirebaseClient,
}

impl FirebaseGateway {
    pub fn new(client: FirebaseClient) -> Self {
        Self { client }
    }
}

impl PushGateway for FirebaseGateway {
    type Error = FirebaseError;

    fn send_one(
        &self,
        target: SendTarget,
        message: PushMessage,
        credentials: Arc<CredentialContext>,
    ) -> BoxFuture<'_, String, Self::Error> {
        Box::pin(async move {
            let authorization = self.client.token_provider().authorize(&credentials).await?;
            debug!(
                "Sending FCM message for partner {} via project {}",
                credentials.partner, authorization.project_id
            );
            self.client
                .send_message(&authorization, &to_fcm(target, &message))
                .await
        })
    }

    fn send_multicast(
        &self,
        tokens: Vec<String>,
        message: PushMessage,
        credentials: Arc<CredentialContext>,
    ) -> BoxFuture<'_, MulticastReport, Self::Error> {
        Box::pin(async move {
            if tokens.is_empty() {
                return Ok(MulticastReport::default());
            }

            let authorization = self.client.token_provider().authorize(&credentials).await?;
            debug!(
                "Sending FCM multicast to {} tokens for partner {}",
                tokens.len(),
                credentials.partner
            );

            let mut tasks = JoinSet::new();
            for (index, token) in tokens.iter().enumerate() {
                let client = self.client.clone();
                let authorization = authorization.clone();
                let fcm = to_fcm(SendTarget::Token(token.clone()), &message);
                tasks.spawn(async move {
                    let result = client.send_message(&authorization, &fcm).await;
                    (index, result)
                });
            }

            let mut outcomes: Vec<Option<TokenOutcome>> = vec![None; tokens.len()];
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, Ok(message_id))) => {
                        outcomes[index] = Some(TokenOutcome::delivered(&tokens[index], message_id));
                    }
                    Ok((index, Err(err))) => {
                        outcomes[index] = Some(TokenOutcome::failed(&tokens[index], err.to_string()));
                    }
                    Err(err) => warn!("FCM delivery task aborted: {}", err),
                }
            }

            let outcomes = outcomes
                .into_iter()
                .zip(tokens.iter())
                .map(|(outcome, token)| {
                    outcome.unwrap_or_else(|| TokenOutcome::failed(token, "delivery task aborted"))
                })
                .collect();
            Ok(MulticastReport::from_outcomes(outcomes))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;
    use coursecast_common::services::PushNotification;
    use std::collections::HashMap;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> FirebaseGateway {
        FirebaseGateway::new(
            FirebaseClient::with_provider(
                server.uri(),
                Arc::new(StaticTokenProvider::new("test-token")),
                Duration::from_secs(5),
            )
            .unwrap(),
        )
    }

    fn credentials() -> Arc<CredentialContext> {
        Arc::new(CredentialContext {
            partner: "poc1".to_string(),
            project_id: Some("poc1-project".to_string()),
            ..CredentialContext::default()
        })
    }

    fn message() -> PushMessage {
        PushMessage {
            notification: PushNotification {
                title: "Aula".to_string(),
                body: "Nova aula disponível".to_string(),
            },
            data: HashMap::from([("partner".to_string(), "poc1".to_string())]),
        }
    }

    async fn mount_token(server: &MockServer, token: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/v1/projects/poc1-project/messages:send"))
            .and(body_partial_json(serde_json::json!({"message": {"token": token}})))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_send_one_to_topic_carries_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "message": {"topic": "poc1-qa", "data": {"partner": "poc1"}}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"name": "projects/poc1-project/messages/1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = gateway(&server)
            .send_one(SendTarget::Topic("poc1-qa".to_string()), message(), credentials())
            .await
            .unwrap();
        assert_eq!(id, "projects/poc1-project/messages/1");
    }

    #[tokio::test]
    async fn test_multicast_reports_partial_failures_in_token_order() {
        let server = MockServer::start().await;
        mount_token(
            &server,
            "good-1",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"name": "projects/poc1-project/messages/a"})),
        )
        .await;
        mount_token(
            &server,
            "stale",
            ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND",
                          "details": [{"errorCode": "UNREGISTERED"}]}
            })),
        )
        .await;
        mount_token(
            &server,
            "good-2",
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"name": "projects/poc1-project/messages/b"})),
        )
        .await;

        let tokens = vec!["good-1".to_string(), "stale".to_string(), "good-2".to_string()];
        let report = gateway(&server)
            .send_multicast(tokens, message(), credentials())
            .await
            .unwrap();

        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        let order: Vec<&str> = report.responses.iter().map(|o| o.token.as_str()).collect();
        assert_eq!(order, vec!["good-1", "stale", "good-2"]);
        let stale = &report.responses[1];
        assert!(!stale.success);
        assert!(stale
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("UNREGISTERED"));
    }

    #[tokio::test]
    async fn test_multicast_fails_hard_without_credentials() {
        let server = MockServer::start().await;
        let no_project = Arc::new(CredentialContext {
            partner: "poc1".to_string(),
            ..CredentialContext::default()
        });

        let err = gateway(&server)
            .send_multicast(vec!["t".to_string()], message(), no_project)
            .await
            .unwrap_err();
        assert!(matches!(err, FirebaseError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_empty_multicast_sends_nothing() {
        let server = MockServer::start().await;
        let report = gateway(&server)
            .send_multicast(Vec::new(), message(), credentials())
            .await
            .unwrap();
        assert_eq!(report, MulticastReport::default());
    }
}
