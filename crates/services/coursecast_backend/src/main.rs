use axum::{routing::get, Router};
use coursecast_config::{ensure_dotenv_loaded, load_config};
use std::error::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

mod app_state;

use app_state::AppState;

fn app(state: &AppState) -> Router {
    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new()
        .route("/", get(|| async { "Coursecast push service is running" }))
        .merge(coursecast_push::routes(state.push.clone()));

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use coursecast_push::openapi::PushApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Coursecast API",
                version = "0.1.0",
                description = "Push notifications for course apps",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            tags((name = "Coursecast", description = "Core service endpoints"))
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(PushApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    app.layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG may come from .env
    ensure_dotenv_loaded();
    coursecast_common::logging::init();

    let config = load_config()?;
    let state = AppState::build(config).await?;

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);

    axum::serve(listener, app(&state).into_make_service()).await?;
    Ok(())
}
