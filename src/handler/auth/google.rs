use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use cookie::time::Duration;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    handler::session::{session_cookie, SESSION_COOKIE},
    state::AppState,
};

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_PATH: &str = "/api/v1/auth/google";
const OAUTH_STATE_TTL_SECONDS: i64 = 10 * 60;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoogleCallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct GoogleAuthResponse {
    pub account_uid: Uuid,
    pub email: String,
    pub provider: String,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/auth/google", get(start_google_auth))
        .route("/api/v1/auth/google/callback", get(google_callback))
        .with_state(state)
}

fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn state_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(OAUTH_STATE_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_path(OAUTH_STATE_PATH);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(OAUTH_STATE_TTL_SECONDS));
    if secure {
        cookie.set_secure(true);
    }
    cookie
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/google",
    responses(
        (status = 307, description = "Redirect to Google sign-in")
    ),
    tag = "auth"
)]
pub async fn start_google_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Redirect)> {
    let oauth_state = generate_state();
    let url = state.identity_provider().authorize_url(&oauth_state)?;
    let secure = state.config().values().cookie_secure;
    Ok((
        jar.add(state_cookie(oauth_state, secure)),
        Redirect::temporary(&url),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/google/callback",
    params(GoogleCallbackQuery),
    responses(
        (status = 200, description = "Signed in", body = GoogleAuthResponse),
        (status = 303, description = "Signed in; redirect to the configured page"),
        (status = 400, description = "Provider error or state mismatch", body = crate::error::ErrorResponse),
        (status = 409, description = "Email registered with another provider", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<GoogleCallbackQuery>,
) -> AppResult<Response> {
    if let Some(error) = query.error {
        return Err(AppError::Validation(format!("google oauth error: {}", error)));
    }
    let Some(code) = query.code else {
        return Err(AppError::Validation("missing code".to_string()));
    };
    let expected = jar.get(OAUTH_STATE_COOKIE).map(|cookie| cookie.value().to_string());
    if expected.is_none() || expected != query.state {
        return Err(AppError::Validation("oauth state mismatch".to_string()));
    }

    let assertion = state.identity_provider().exchange(&code).await?;
    // Resolution fails before any session exists, so a conflicting sign-in stays anonymous.
    let account = state.identity().resolve(assertion).await?;

    if let Some(previous) = jar.get(SESSION_COOKIE) {
        if let Err(err) = state.sessions().delete(previous.value()).await {
            tracing::warn!(error = %err, "failed to drop previous session");
        }
    }
    let session_id = state.sessions().create(account.uid).await?;
    tracing::info!(account_uid = %account.uid, provider = %account.provider, "signed in");

    let config = state.config().values();
    let mut expired_state = Cookie::from(OAUTH_STATE_COOKIE);
    expired_state.set_path(OAUTH_STATE_PATH);
    let jar = jar
        .remove(expired_state)
        .add(session_cookie(config, session_id));

    if let Some(target) = &config.post_login_redirect {
        return Ok((jar, Redirect::to(target)).into_response());
    }

    let response = GoogleAuthResponse {
        account_uid: account.uid,
        email: account.email,
        provider: account.provider,
    };
    Ok((StatusCode::OK, jar, Json(response)).into_response())
}
