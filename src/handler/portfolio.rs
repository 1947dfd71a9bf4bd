use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::Config,
    entities::portfolio_records,
    error::{AppError, AppResult},
    handler::session::session_caller,
    service::portfolio::{ImageUpload, RecordFields},
    state::AppState,
};

// Room for the text fields and multipart framing on top of the image itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Multipart form accepted by `POST /api/v1/portfolio`. Documentation only; the
/// handler reads the parts one by one.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct PortfolioForm {
    pub name: String,
    pub description: String,
    pub phone_number: String,
    pub email: String,
    /// JPEG or PNG image.
    #[schema(value_type = String, format = Binary)]
    pub photo: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct PortfolioRecordResponse {
    pub uid: Uuid,
    pub image_url: String,
    pub name: String,
    pub description: String,
    pub phone_number: String,
    pub contact_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<portfolio_records::Model> for PortfolioRecordResponse {
    fn from(model: portfolio_records::Model) -> Self {
        Self {
            uid: model.uid,
            image_url: model.image_url,
            name: model.display_name,
            description: model.description,
            phone_number: model.phone_number,
            contact_email: model.contact_email,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Default)]
struct SubmissionParts {
    name: Option<String>,
    description: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
    photo: Option<ImageUpload>,
}

impl SubmissionParts {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut parts = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "name" => parts.name = Some(text(field).await?),
                "description" => parts.description = Some(text(field).await?),
                "phoneNumber" => parts.phone_number = Some(text(field).await?),
                "email" => parts.email = Some(text(field).await?),
                "photo" => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(invalid_form)?;
                    if !data.is_empty() {
                        parts.photo = Some(ImageUpload {
                            data: data.to_vec(),
                            content_type,
                        });
                    }
                }
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(parts)
    }

    /// Text fields must be present (possibly empty); the photo is mandatory.
    fn into_submission(self) -> AppResult<(RecordFields, ImageUpload)> {
        let fields = RecordFields {
            display_name: required(self.name, "name")?,
            description: required(self.description, "description")?,
            phone_number: required(self.phone_number, "phoneNumber")?,
            contact_email: required(self.email, "email")?,
        };
        let photo = self
            .photo
            .ok_or_else(|| AppError::Validation("photo is required".to_string()))?;
        Ok((fields, photo))
    }
}

fn invalid_form(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("invalid form: {}", err.body_text()))
}

async fn text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(invalid_form)
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value.ok_or_else(|| AppError::Validation(format!("missing field `{}`", name)))
}

/// Returns the signed-in account's current record. There is no anonymous view;
/// visitors without a session are sent to sign in.
#[utoipa::path(
    get,
    path = "/api/v1/portfolio",
    responses(
        (status = 200, description = "Current portfolio record", body = PortfolioRecordResponse),
        (status = 303, description = "Not signed in; redirect to sign-in"),
        (status = 404, description = "Nothing submitted yet", body = crate::error::ErrorResponse)
    ),
    tag = "portfolio"
)]
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Json<PortfolioRecordResponse>> {
    let caller = session_caller(&state, &jar).await?;
    let record = state.portfolio().current_record(caller).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/portfolio",
    request_body(content = PortfolioForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Record stored and made current", body = PortfolioRecordResponse),
        (status = 303, description = "Not signed in; redirect to sign-in"),
        (status = 400, description = "Missing field or unsupported image", body = crate::error::ErrorResponse),
        (status = 413, description = "Image too large", body = crate::error::ErrorResponse)
    ),
    tag = "portfolio"
)]
pub async fn submit_portfolio(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PortfolioRecordResponse>)> {
    let Some(caller) = session_caller(&state, &jar).await? else {
        return Err(AppError::Unauthenticated);
    };
    let (fields, photo) = SubmissionParts::read(multipart).await?.into_submission()?;
    let record = state
        .portfolio()
        .publish(Some(caller), fields, photo)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

fn body_limit(config: &Config) -> usize {
    config.blob_max_bytes.saturating_add(FORM_OVERHEAD_BYTES)
}

pub fn routes(state: Arc<AppState>) -> Router {
    let limit = body_limit(state.config().values());
    Router::new()
        .route("/api/v1/portfolio", get(get_portfolio).post(submit_portfolio))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}
