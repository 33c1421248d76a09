//! Recipient resolution and push dispatch for Coursecast
//!
//! Pushes are addressed by partner and environment and narrowed by at most one
//! of student, course or app version. The crate resolves the addressed devices
//! against the device registry, picks the partner's delivery credentials and
//! hands the notification to a [`coursecast_common::PushGateway`].
//!
//! # API Endpoints
//!
//! - `POST /push` - Send a notification to a student, a course, a version or the
//!   partner/environment topic
//! - `POST /api/token` - Register or refresh the device token of a student
//!
//! # Example
//!
//! ```rust,no_run
//! use coursecast_common::{BoxedGateway, PushGateway};
//! use coursecast_config::AppConfig;
//! use coursecast_db::RegistryBackend;
//! use coursecast_push::{routes, CredentialSelector, PushService, SharedGateway};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! async fn setup_app<G: PushGateway + 'static>(gateway: G) -> Result<axum::Router, Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let registry = RegistryBackend::from_app_config(&config).await?;
//!     let gateway: SharedGateway = Arc::new(BoxedGateway(gateway));
//!     let service = PushService::new(
//!         Arc::new(registry),
//!         Arc::new(CredentialSelector::from_config(&config)),
//!         gateway,
//!         Duration::from_secs(config.push.gateway_timeout_secs),
//!     );
//!     Ok(routes(Arc::new(service)))
//! }
//! ```

pub mod credentials;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
pub mod logic;
pub mod models;
pub mod routes;
pub mod service;


pub use credentials::CredentialSelector;
pub use error::PushError;
pub use logic::{resolve_recipients, topic_name, RecipientTarget, TargetingRule};
pub use models::{DeliveryReport, PushRequest, RegisterTokenRequest, TargetKind, Targeting};
pub use routes::routes;
pub use service::{PushService, SharedGateway};

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::PushApiDoc;
}
