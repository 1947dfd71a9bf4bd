use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{config::Config, entities::accounts, error::AppResult, state::AppState};

pub const SESSION_COOKIE: &str = "sid";

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub account_uid: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: String,
    pub selected_theme: Option<String>,
    pub has_portfolio: bool,
}

impl From<accounts::Model> for MeResponse {
    fn from(model: accounts::Model) -> Self {
        Self {
            account_uid: model.uid,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            avatar_url: model.avatar_url,
            provider: model.provider,
            selected_theme: model.selected_theme,
            has_portfolio: model.active_record_id.is_some(),
        }
    }
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/me", get(me))
        .route("/api/v1/auth/logout", post(logout))
        .with_state(state)
}

/// Account uid bound to the request's session cookie, if any. A missing, unknown or
/// expired session is `None`; only a failing session store is an error.
pub async fn session_caller(state: &AppState, jar: &CookieJar) -> AppResult<Option<Uuid>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let session = state.sessions().get(cookie.value()).await?;
    Ok(session.map(|session| session.account_uid))
}

fn base_cookie(config: &Config, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    if config.cookie_secure {
        cookie.set_secure(true);
    }
    if let Some(domain) = &config.cookie_domain {
        cookie.set_domain(domain.to_string());
    }
    cookie
}

pub fn session_cookie(config: &Config, session_id: String) -> Cookie<'static> {
    let mut cookie = base_cookie(config, session_id);
    let max_age = i64::try_from(config.session_ttl_seconds).unwrap_or(i64::MAX);
    cookie.set_max_age(Duration::seconds(max_age));
    cookie
}

pub fn expired_session_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = base_cookie(config, String::new());
    cookie.set_max_age(Duration::ZERO);
    cookie
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Signed-in account", body = MeResponse),
        (status = 303, description = "Not signed in; redirect to sign-in")
    ),
    tag = "session"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Json<MeResponse>> {
    let caller = session_caller(&state, &jar).await?;
    let account = state.accounts().current(caller).await?;
    Ok(Json(account.into()))
}

/// Ends the session. Account and portfolio data are left untouched.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "Session ended")
    ),
    tag = "session"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<(StatusCode, CookieJar)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions().delete(cookie.value()).await?;
        tracing::info!("session ended");
    }
    let jar = jar.add(expired_session_cookie(state.config().values()));
    Ok((StatusCode::NO_CONTENT, jar))
}
