//! Authentication module for Firebase Cloud Messaging
//!
//! Access tokens are minted from the service account of the partner's Firebase
//! project. The key is taken from the inline JSON of the credential context if
//! present, otherwise from the key file.

use crate::client::FirebaseError;
use coursecast_common::services::{BoxFuture, CredentialContext};
use std::path::Path;
use yup_oauth2::{
    parse_service_account_key, read_service_account_key, ServiceAccountAuthenticator,
    ServiceAccountKey,
};

/// OAuth2 scope required by the FCM HTTP v1 API
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// What a send needs to address the FCM API on behalf of one partner
#[derive(Clone, PartialEq, Eq)]
pub struct FcmAuthorization {
    pub project_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for FcmAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FcmAuthorization")
            .field("project_id", &self.project_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Source of bearer tokens for the FCM API.
pub trait AccessTokenProvider: Send + Sync {
    fn authorize<'a>(
        &'a self,
        credentials: &'a CredentialContext,
    ) -> BoxFuture<'a, FcmAuthorization, FirebaseError>;
}

/// Production provider: OAuth2 service account flow through yup-oauth2.
#[derive(Debug, Clone, Default)]
pub struct ServiceAccountTokenProvider;

impl AccessTokenProvider for ServiceAccountTokenProvider {
    fn authorize<'a>(
        &'a self,
        credentials: &'a CredentialContext,
    ) -> BoxFuture<'a, FcmAuthorization, FirebaseError> {
        Box::pin(async move {
            let sa_key = load_service_account_key(credentials).await?;
            let project_id = credentials
                .project_id
                .clone()
                .or_else(|| sa_key.project_id.clone())
                .ok_or_else(|| {
                    FirebaseError::ConfigError(format!(
                        "No project_id configured for partner {}",
                        credentials.partner
                    ))
                })?;
            let access_token = get_firebase_auth_token(sa_key).await?;
            Ok(FcmAuthorization {
                project_id,
                access_token,
            })
        })
    }
}

/// Provider handing out a fixed token, for local emulators and tests.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    access_token: String,
}

impl StaticTokenProvider {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl AccessTokenProvider for StaticTokenProvider {
    fn authorize<'a>(
        &'a self,
        credentials: &'a CredentialContext,
    ) -> BoxFuture<'a, FcmAuthorization, FirebaseError> {
        Box::pin(async move {
            let project_id = credentials.project_id.clone().ok_or_else(|| {
                FirebaseError::ConfigError(format!(
                    "No project_id configured for partner {}",
                    credentials.partner
                ))
            })?;
            Ok(FcmAuthorization {
                project_id,
                access_token: self.access_token.clone(),
            })
        })
    }
}

/// Reads the service account key referenced by the credential context.
///
/// # Errors
///
/// * Neither inline JSON nor a key path is configured
/// * The key cannot be read or parsed
pub async fn load_service_account_key(
    credentials: &CredentialContext,
) -> Result<ServiceAccountKey, FirebaseError> {
    // Error messages name the partner only; the key material stays out of them.
    if let Some(json) = credentials.service_account_json.as_deref() {
        return parse_service_account_key(json).map_err(|e| {
            FirebaseError::ConfigError(format!(
                "Invalid service account JSON for partner {}: {}",
                credentials.partner,
                e.kind()
            ))
        });
    }

    let key_path = credentials.key_path.as_deref().ok_or_else(|| {
        FirebaseError::ConfigError(format!(
            "Missing service account for partner {}",
            credentials.partner
        ))
    })?;

    read_service_account_key(Path::new(key_path))
        .await
        .map_err(|e| FirebaseError::ConfigError(format!("Cannot read {}: {}", key_path, e)))
}

/// Obtains an OAuth2 access token for Firebase Cloud Messaging
///
/// # Errors
///
/// * Authentication with Google's OAuth2 service fails
/// * No token is returned from the authentication service
pub async fn get_firebase_auth_token(sa_key: ServiceAccountKey) -> Result<String, FirebaseError> {
    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

    let auth_token = auth
        .token(&[FCM_SCOPE])
        .await
        .map_err(|e| FirebaseError::AuthError(e.to_string()))?;

    match auth_token.token() {
        Some(token) => Ok(token.to_string()),
        None => Err(FirebaseError::AuthError("No token available".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_service_account_is_config_error() {
        let ctx = CredentialContext {
            partner: "poc1".to_string(),
            ..CredentialContext::default()
        };
        let err = load_service_account_key(&ctx).await.unwrap_err();
        assert!(matches!(err, FirebaseError::ConfigError(msg) if msg.contains("poc1")));
    }

    #[tokio::test]
    async fn test_invalid_inline_json_does_not_leak_content() {
        let ctx = CredentialContext {
            partner: "poc2".to_string(),
            service_account_json: Some("{not json but secret-ish".to_string()),
            ..CredentialContext::default()
        };
        let err = load_service_account_key(&ctx).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("poc2"));
        assert!(!message.contains("secret-ish"));
    }

    #[tokio::test]
    async fn test_static_provider_requires_project_id() {
        let provider = StaticTokenProvider::new("token");
        let ctx = CredentialContext {
            partner: "poc1".to_string(),
            ..CredentialContext::default()
        };
        assert!(provider.authorize(&ctx).await.is_err());

        let ctx = CredentialContext {
            partner: "poc1".to_string(),
            project_id: Some("poc1-project".to_string()),
            ..CredentialContext::default()
        };
        let auth = provider.authorize(&ctx).await.unwrap();
        assert_eq!(auth.project_id, "poc1-project");
        assert_eq!(auth.access_token, "token");
    }
}
