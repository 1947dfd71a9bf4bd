use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{openapi::ApiDoc, state::AppState};

pub mod accounts;
pub mod auth;
pub mod health;
pub mod portfolio;
pub mod session;

pub fn routes(state: Arc<AppState>) -> Router {
    let config = state.config().values().clone();

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::google::routes(state.clone()))
        .merge(session::routes(state.clone()))
        .merge(accounts::routes(state.clone()))
        .merge(portfolio::routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Blobs are only served locally when their public URL points back at this server.
    if config.blob_public_base_url.starts_with('/') {
        router = router.nest_service(
            &config.blob_public_base_url,
            ServeDir::new(&config.blob_dir),
        );
    }

    router
}
