mod config;
mod db;
mod entities;
mod error;
mod handler;
mod openapi;
mod repo;
mod schema;
mod service;
mod state;
#[cfg(test)]
mod test_support;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::{
    error::AppError,
    service::config::{ConfigService, ConfigServiceImpl},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("portfolio_api=debug,tower_http=info")),
        )
        .init();

    let config = ConfigServiceImpl::new();
    let bind_addr = format!("0.0.0.0:{}", config.port());
    let state = AppState::new(config).await?;

    let app = handler::routes(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "portfolio-api listening");

    axum::serve(listener, app).await?;
    Ok(())
}
