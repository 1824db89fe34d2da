//! Liveness and template download

use axum::{http::header, response::IntoResponse};

use crate::handlers::ApiError;
use crate::services::spreadsheet;

pub const LIVENESS_TEXT: &str = "Email Backend Server is running!";
pub const TEMPLATE_FILENAME: &str = "contacts.xlsx";

/// `GET /`
pub async fn health() -> &'static str {
    LIVENESS_TEXT
}

/// `GET /download-excel`
pub async fn download_template() -> Result<impl IntoResponse, ApiError> {
    let bytes = spreadsheet::contacts_template().map_err(|e| ApiError::Internal(e.to_string()))?;

    let content_type = mime_guess::from_ext("xlsx").first_or_octet_stream().to_string();
    let disposition = format!("attachment; filename=\"{}\"", TEMPLATE_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
