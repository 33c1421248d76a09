use axum::{routing::post, Router};
use coursecast_db::DeviceRegistry;
use std::sync::Arc;
use tracing::info;

use crate::handlers::{push_handler, register_token_handler};
use crate::service::PushService;

/// Create the push routes
///
/// * `POST /push` resolves recipients and sends a notification
/// * `POST /api/token` registers the device token of a student
pub fn routes<R: DeviceRegistry + 'static>(service: Arc<PushService<R>>) -> Router {
    info!("Push routes initialized");

    Router::new()
        .route("/push", post(push_handler::<R>))
        .route("/api/token", post(register_token_handler::<R>))
        .with_state(service)
}
