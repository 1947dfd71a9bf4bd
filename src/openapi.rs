use utoipa::OpenApi;

use crate::{
    error::ErrorResponse,
    handler,
    handler::{
        accounts::UpdateTheme,
        auth::google::GoogleAuthResponse,
        health::Health,
        portfolio::{PortfolioForm, PortfolioRecordResponse},
        session::MeResponse,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handler::health::health,
        handler::auth::google::start_google_auth,
        handler::auth::google::google_callback,
        handler::session::me,
        handler::session::logout,
        handler::accounts::update_theme,
        handler::portfolio::get_portfolio,
        handler::portfolio::submit_portfolio
    ),
    components(schemas(
        Health,
        GoogleAuthResponse,
        MeResponse,
        UpdateTheme,
        PortfolioForm,
        PortfolioRecordResponse,
        ErrorResponse
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "auth", description = "Google sign-in"),
        (name = "session", description = "Current session"),
        (name = "accounts", description = "Account preferences"),
        (name = "portfolio", description = "Portfolio record")
    )
)]
pub struct ApiDoc;
