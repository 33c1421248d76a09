//! Delivery dispatch and token ingestion.

use crate::credentials::CredentialSelector;
use crate::error::PushError;
use crate::logic::{message_data, resolve_recipients, RecipientTarget, TargetingRule};
use crate::models::{DeliveryOutcome, DeliveryReport, SingleDelivery, Targeting};
use chrono::Utc;
use coursecast_common::{
    BoxFuture, BoxedError, DeviceRecord, PushGateway, PushMessage, PushNotification, SendTarget,
};
use coursecast_db::{DeviceRegistry, DeviceUpdate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub type SharedGateway = Arc<dyn PushGateway<Error = BoxedError>>;

/// Routes pushes to the gateway and registrations to the registry
pub struct PushService<R> {
    registry: Arc<R>,
    credentials: Arc<CredentialSelector>,
    gateway: SharedGateway,
    gateway_timeout: Duration,
}

impl<R> Clone for PushService<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            credentials: Arc::clone(&self.credentials),
            gateway: Arc::clone(&self.gateway),
            gateway_timeout: self.gateway_timeout,
        }
    }
}

fn missing_fields(fields: &[(&'static str, &str)]) -> Result<(), PushError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PushError::InvalidRequest(missing.join(", ")))
    }
}

impl<R: DeviceRegistry> PushService<R> {
    pub fn new(
        registry: Arc<R>,
        credentials: Arc<CredentialSelector>,
        gateway: SharedGateway,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            credentials,
            gateway,
            gateway_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Resolve the recipients of a push and hand it to the gateway.
    ///
    /// Per-token failures of a multicast are reported inside the returned
    /// report; only a gateway call that cannot be issued fails the dispatch.
    pub async fn dispatch(
        &self,
        targeting: &Targeting,
        title: &str,
        body: &str,
    ) -> Result<DeliveryReport, PushError> {
        missing_fields(&[
            ("partner", targeting.partner.as_str()),
            ("environment", targeting.environment.as_str()),
            ("title", title),
            ("message", body),
        ])?;

        let credentials = self.credentials.resolve(&targeting.partner)?;
        let (rule, target) = resolve_recipients(self.registry.as_ref(), targeting).await?;

        let message = PushMessage {
            notification: PushNotification {
                title: title.to_string(),
                body: body.to_string(),
            },
            data: message_data(targeting, &target),
        };

        let mut report = match target {
            RecipientTarget::Single { student, token, .. } => {
                let message_id = self
                    .bounded(self.gateway.send_one(
                        SendTarget::Token(token.clone()),
                        message,
                        credentials,
                    ))
                    .await?;
                info!("Push sent to student {}", student);
                let mut report = DeliveryReport::new(
                    rule.kind(),
                    DeliveryOutcome::Single(SingleDelivery { message_id }),
                );
                report.sent_to = Some(student);
                report.token = Some(token);
                report
            }
            RecipientTarget::Multiple { tokens } => {
                let quantity = tokens.len();
                let multicast = self
                    .bounded(self.gateway.send_multicast(tokens, message, credentials))
                    .await?;
                if multicast.failed > 0 {
                    warn!(
                        "Multicast to {} tokens: {} sent, {} failed",
                        quantity, multicast.sent, multicast.failed
                    );
                } else {
                    info!("Multicast sent to {} tokens", quantity);
                }
                let mut report =
                    DeliveryReport::new(rule.kind(), DeliveryOutcome::Multicast(multicast));
                report.quantity = Some(quantity);
                report
            }
            RecipientTarget::Topic(topic) => {
                let message_id = self
                    .bounded(
                        self.gateway
                            .send_one(SendTarget::Topic(topic.clone()), message, credentials),
                    )
                    .await?;
                info!("Push sent to topic {}", topic);
                let mut report = DeliveryReport::new(
                    rule.kind(),
                    DeliveryOutcome::Single(SingleDelivery { message_id }),
                );
                report.sent_to = Some(topic);
                report
            }
        };

        match rule {
            TargetingRule::Course => report.course = targeting.course.clone(),
            TargetingRule::Version => report.version = targeting.version.clone(),
            TargetingRule::Individual | TargetingRule::Topic => {}
        }
        Ok(report)
    }

    /// Record the device token of a roster identity.
    ///
    /// Never creates an identity; an unknown id fails with `NotFound`.
    pub async fn register(
        &self,
        id: &str,
        token: &str,
        partner: &str,
        environment: &str,
        version: &str,
    ) -> Result<DeviceRecord, PushError> {
        missing_fields(&[
            ("studentId", id),
            ("token", token),
            ("partner", partner),
            ("environment", environment),
            ("version", version),
        ])?;

        debug!("Registering token for student {}", id);
        let record = self
            .registry
            .update(
                id,
                DeviceUpdate {
                    token: token.to_string(),
                    partner: partner.to_string(),
                    environment: environment.to_string(),
                    version: version.to_string(),
                    updated_at: Utc::now(),
                },
            )
            .await?;
        info!(
            "Token registered for student {} ({}/{}, version {})",
            record.id, record.partner, record.environment, record.version
        );
        Ok(record)
    }

    async fn bounded<T>(&self, call: BoxFuture<'_, T, BoxedError>) -> Result<T, PushError> {
        match tokio::time::timeout(self.gateway_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                error!("Push gateway failed: {}", err);
                Err(PushError::Gateway(err.to_string()))
            }
            Err(_) => {
                error!(
                    "Push gateway did not answer within {:?}",
                    self.gateway_timeout
                );
                Err(PushError::GatewayTimeout(self.gateway_timeout.as_secs()))
            }
        }
    }
}
