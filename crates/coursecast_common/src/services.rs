// --- File: crates/coursecast_common/src/services.rs ---
//! Delivery gateway contract.
//!
//! The push provider is an external collaborator. The dispatcher only talks to
//! it through [`PushGateway`], which keeps the provider client swappable and
//! lets tests record what would have been sent.

use coursecast_config::FirebaseConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

/// Upstream delivery context of one partner: which provider project to send
/// through and how to authenticate against it.
#[derive(Clone, Default)]
pub struct CredentialContext {
    /// Partner tag this context was configured for
    pub partner: String,
    pub project_id: Option<String>,
    pub key_path: Option<String>,
    pub service_account_json: Option<String>,
}

impl CredentialContext {
    pub fn from_config(partner: &str, config: &FirebaseConfig) -> Self {
        Self {
            partner: partner.to_string(),
            project_id: config.project_id.clone(),
            key_path: config.key_path.clone(),
            service_account_json: config.service_account_json.clone(),
        }
    }
}

// Key material must never end up in logs or error bodies.
impl fmt::Debug for CredentialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialContext")
            .field("partner", &self.partner)
            .field("project_id", &self.project_id)
            .field("key_path", &self.key_path)
            .field(
                "service_account_json",
                &self.service_account_json.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// The user-visible part of a push message
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Notification plus the key/value metadata delivered alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub notification: PushNotification,
    pub data: HashMap<String, String>,
}

/// Destination of a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget {
    /// One device registration token
    Token(String),
    /// A provider-side topic the clients subscribe to out-of-band
    Topic(String),
}

/// Result of delivering to one token of a multicast
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenOutcome {
    pub token: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenOutcome {
    pub fn delivered(token: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(token: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregated per-token outcomes of a multicast send
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MulticastReport {
    pub sent: usize,
    pub failed: usize,
    pub responses: Vec<TokenOutcome>,
}

impl MulticastReport {
    pub fn from_outcomes(responses: Vec<TokenOutcome>) -> Self {
        let sent = responses.iter().filter(|o| o.success).count();
        Self {
            sent,
            failed: responses.len() - sent,
            responses,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &TokenOutcome> {
        self.responses.iter().filter(|o| !o.success)
    }
}

/// A trait for push delivery providers.
///
/// Implementations fail only when the call itself could not be issued
/// (credentials, configuration, transport). Individual token rejections inside
/// a multicast are reported in the [`MulticastReport`].
pub trait PushGateway: Send + Sync {
    /// Error type returned by gateway operations.
    type Error: StdError + Send + Sync + 'static;

    /// Send one message to a single token or to a topic. Returns the provider message id.
    fn send_one(
        &self,
        target: SendTarget,
        message: PushMessage,
        credentials: Arc<CredentialContext>,
    ) -> BoxFuture<'_, String, Self::Error>;

    /// Send the same message to many tokens.
    fn send_multicast(
        &self,
        tokens: Vec<String>,
        message: PushMessage,
        credentials: Arc<CredentialContext>,
    ) -> BoxFuture<'_, MulticastReport, Self::Error>;
}

/// Adapter erasing a gateway's concrete error type so it can be stored as
/// `Arc<dyn PushGateway<Error = BoxedError>>`.
pub struct BoxedGateway<G>(pub G);

impl<G: PushGateway> PushGateway for BoxedGateway<G> {
    type Error = BoxedError;

    fn send_one(
        &self,
        target: SendTarget,
        message: PushMessage,
        credentials: Arc<CredentialContext>,
    ) -> BoxFuture<'_, String, Self::Error> {
        Box::pin(async move {
            self.0
                .send_one(target, message, credentials)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }

    fn send_multicast(
        &self,
        tokens: Vec<String>,
        message: PushMessage,
        credentials: Arc<CredentialContext>,
    ) -> BoxFuture<'_, MulticastReport, Self::Error> {
        Box::pin(async move {
            self.0
                .send_multicast(tokens, message, credentials)
                .await
                .map_err(|e| BoxedError(Box::new(e)))
        })
    }
}
