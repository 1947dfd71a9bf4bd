use axum::{extract::State, routing::put, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    handler::session::{session_caller, MeResponse},
    state::AppState,
};

#[derive(Deserialize, ToSchema)]
pub struct UpdateTheme {
    pub theme: String,
}

#[utoipa::path(
    put,
    path = "/api/v1/me/theme",
    request_body = UpdateTheme,
    responses(
        (status = 200, description = "Updated", body = MeResponse),
        (status = 303, description = "Not signed in; redirect to sign-in")
    ),
    tag = "accounts"
)]
pub async fn update_theme(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<UpdateTheme>,
) -> AppResult<Json<MeResponse>> {
    let caller = session_caller(&state, &jar).await?;
    let account = state.accounts().set_theme(caller, &payload.theme).await?;
    Ok(Json(account.into()))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/me/theme", put(update_theme))
        .with_state(state)
}
