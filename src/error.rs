use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::service::{
    blob_store::BlobStoreError, identity_provider::ProviderError, session::SessionError,
};

/// Where unauthenticated callers are sent.
pub const SIGN_IN_PATH: &str = "/api/v1/auth/google";

#[derive(Error, Debug)]
pub enum AppError {
    /// The email is already bound to an account created through another provider.
    #[error("email already registered with provider {registered}")]
    IdentityConflict { registered: String },

    #[error("sign-in required")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("store failure: {0}")]
    Store(#[from] sea_orm::DbErr),

    #[error(transparent)]
    BlobStore(#[from] BlobStoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::IdentityConflict { .. } => "identity_conflict",
            AppError::Unauthenticated => "unauthenticated",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "invalid_request",
            AppError::Store(_) => "store_failure",
            AppError::BlobStore(_) => "blob_store_failure",
            AppError::Session(_) => "session_failure",
            AppError::Provider(_) => "provider_failure",
            AppError::Io(_) => "io_failure",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::IdentityConflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BlobStore(BlobStoreError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BlobStore(BlobStoreError::Empty)
            | AppError::BlobStore(BlobStoreError::UnsupportedFormat(_)) => StatusCode::BAD_REQUEST,
            AppError::Provider(ProviderError::NotConfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Provider(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) | AppError::BlobStore(_) | AppError::Session(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Unauthenticated) {
            return Redirect::to(SIGN_IN_PATH).into_response();
        }

        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = self.code(), error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                code: self.code().to_string(),
                message,
            }),
        )
            .into_response()
    }
}
