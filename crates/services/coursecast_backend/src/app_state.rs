use coursecast_common::{log_result, BoxedGateway};
use coursecast_config::AppConfig;
use coursecast_db::RegistryBackend;
use coursecast_firebase::{FirebaseClient, FirebaseGateway};
use coursecast_push::{CredentialSelector, PushService, SharedGateway};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything the routes share, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub push: Arc<PushService<RegistryBackend>>,
}

impl AppState {
    /// Provision the registry and wire it to the FCM gateway.
    ///
    /// # Errors
    ///
    /// Fails if the registry cannot be provisioned or the HTTP client cannot be built.
    pub async fn build(config: AppConfig) -> Result<Self, Box<dyn Error>> {
        let registry = log_result(
            RegistryBackend::from_app_config(&config).await,
            "Device registry ready",
            "Failed to provision device registry",
        )?;

        let timeout = Duration::from_secs(config.push.gateway_timeout_secs);
        let client = FirebaseClient::new(timeout)?;
        let gateway: SharedGateway = Arc::new(BoxedGateway(FirebaseGateway::new(client)));

        let credentials = CredentialSelector::from_config(&config);
        info!(
            "Push service using {} registry, partners: {}",
            registry.kind(),
            credentials.partners().join(", ")
        );

        let push = PushService::new(
            Arc::new(registry),
            Arc::new(credentials),
            gateway,
            timeout,
        );

        Ok(Self {
            config: Arc::new(config),
            push: Arc::new(push),
        })
    }
}
