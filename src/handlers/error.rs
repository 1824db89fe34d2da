//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::spreadsheet::DecodeError;

/// Request-level failure. Per-contact problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("Only one Excel file is allowed.")]
    DuplicateExcelFile,
    #[error("Too many image files.")]
    TooManyImages,
    #[error("Malformed multipart body: {detail}")]
    Multipart { status: StatusCode, detail: String },
    #[error("Spreadsheet could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::DuplicateExcelFile | Self::TooManyImages => {
                StatusCode::BAD_REQUEST
            }
            Self::Multipart { status, .. } => *status,
            Self::Decode(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    pub fn public_message(&self) -> String {
        match self {
            Self::Multipart { .. } => "Malformed multipart body.".to_string(),
            Self::Decode(_) | Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart {
            status: e.status(),
            detail: e.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }

        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
