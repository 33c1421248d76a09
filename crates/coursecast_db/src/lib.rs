//! Device registry for Coursecast
//!
//! The registry is the keyed store of per-student device records. It is the
//! only shared mutable resource of the service and is exposed exclusively
//! through the [`DeviceRegistry`] trait, so callers never see whether records
//! live in memory or in a SQL database.
//!
//! # Backends
//!
//! - [`InMemoryDeviceRegistry`]: a `RwLock`-guarded map, used when no database is configured
//! - [`SqlDeviceRegistry`]: SQLx `Any` pool (SQLite by default, PostgreSQL behind the `postgres` feature)
//!
//! [`RegistryBackend::from_app_config`] picks one at startup and provisions the roster.
//!
//! # Example
//!
//! ```rust,no_run
//! use coursecast_config::AppConfig;
//! use coursecast_db::{DeviceRegistry, RegistryBackend};
//!
//! async fn lookup() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = RegistryBackend::from_app_config(&AppConfig::default()).await?;
//!     let record = registry.get("poc1qa123456").await?;
//!     println!("{} is enrolled in {:?}", record.id, record.courses);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use factory::RegistryBackend;
pub use repositories::{
    DeviceRegistry, DeviceUpdate, InMemoryDeviceRegistry, SqlDeviceRegistry,
};
