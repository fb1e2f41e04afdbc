use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

use crate::dispatch::DispatchError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Dispatch(err) => match err {
                DispatchError::AddressNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DispatchError::InvalidTier(_) | DispatchError::InvalidCoordinate { .. } => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::NoAvailableCab(_) => StatusCode::CONFLICT,
                DispatchError::GeolocationUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DispatchError::GeocoderUnavailable(_) => StatusCode::BAD_GATEWAY,
                DispatchError::NoActiveSession => StatusCode::NOT_FOUND,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full and reported generically
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            match self {
                AppError::Dispatch(DispatchError::GeocoderUnavailable(_)) => {
                    "Geocoding service unavailable".to_string()
                }
                _ => "An error occurred while processing your request".to_string(),
            }
        } else {
            tracing::debug!(error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
