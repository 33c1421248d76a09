//! Registry backend selection
//!
//! The backend is chosen once at startup from the application configuration:
//! a configured database means SQL, otherwise the in-memory map.

use crate::client::DbClient;
use crate::error::DbError;
use crate::repositories::{
    DeviceRecord, DeviceRegistry, DeviceUpdate, InMemoryDeviceRegistry, SqlDeviceRegistry,
};
use coursecast_config::AppConfig;
use tracing::{debug, info};

/// The registry the service runs with
#[derive(Debug, Clone)]
pub enum RegistryBackend {
    Memory(InMemoryDeviceRegistry),
    Sql(SqlDeviceRegistry),
}

impl RegistryBackend {
    /// Build and provision the registry described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if a database is configured but cannot be reached or migrated.
    pub async fn from_app_config(config: &AppConfig) -> Result<Self, DbError> {
        let roster = config.effective_roster();

        match &config.database {
            Some(db_config) => {
                debug!("Using SQL device registry");
                let client = DbClient::from_config(db_config).await?;
                debug!("Database connection healthy: {}", client.is_healthy().await);
                let registry = SqlDeviceRegistry::new(client);
                registry.init_schema().await?;
                registry.seed_roster(&roster).await?;
                Ok(Self::Sql(registry))
            }
            None => {
                info!(
                    "No database configured, using in-memory device registry with {} students",
                    roster.len()
                );
                Ok(Self::Memory(InMemoryDeviceRegistry::from_roster(&roster)))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sql(_) => "sql",
        }
    }
}

impl DeviceRegistry for RegistryBackend {
    async fn get(&self, id: &str) -> Result<DeviceRecord, DbError> {
        match self {
            Self::Memory(registry) => registry.get(id).await,
            Self::Sql(registry) => registry.get(id).await,
        }
    }

    async fn list(&self) -> Result<Vec<DeviceRecord>, DbError> {
        match self {
            Self::Memory(registry) => registry.list().await,
            Self::Sql(registry) => registry.list().await,
        }
    }

    async fn update(&self, id: &str, update: DeviceUpdate) -> Result<DeviceRecord, DbError> {
        match self {
            Self::Memory(registry) => registry.update(id, update).await,
            Self::Sql(registry) => registry.update(id, update).await,
        }
    }
}
