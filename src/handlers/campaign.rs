//! Campaign Handler

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use crate::handlers::ApiError;
use crate::models::{CampaignInput, CampaignResult, ImageAsset};
use crate::server::AppState;
use crate::services::{spreadsheet, CampaignService};

pub const EXCEL_FIELD: &str = "excelFile";
pub const IMAGES_FIELD: &str = "imageFiles";
pub const SUBJECT_FIELD: &str = "subject";
pub const MESSAGE_FIELD: &str = "message";

/// Fields of a `POST /send-emails` form
#[derive(Debug, Clone)]
pub struct SendCampaignRequest {
    pub excel_file: Vec<u8>,
    pub images: Vec<ImageAsset>,
    pub subject: String,
    pub message: String,
}

impl SendCampaignRequest {
    /// Read the whole multipart body. Unknown fields are ignored, and so are
    /// file fields that carry no upload (a text part or an empty file input).
    pub async fn from_multipart(mut multipart: Multipart, max_images: usize) -> Result<Self, ApiError> {
        let mut excel_file: Option<Vec<u8>> = None;
        let mut images = Vec::new();
        let mut subject = None;
        let mut message = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field
                .file_name()
                .filter(|f| !f.is_empty())
                .map(str::to_string);

            match (name.as_str(), filename) {
                (EXCEL_FIELD | IMAGES_FIELD, None) => {
                    tracing::debug!(field = %name, "Ignoring file field without an upload");
                }
                (EXCEL_FIELD, Some(_)) => {
                    if excel_file.is_some() {
                        return Err(ApiError::DuplicateExcelFile);
                    }
                    excel_file = Some(field.bytes().await?.to_vec());
                }
                (IMAGES_FIELD, Some(filename)) => {
                    let bytes = field.bytes().await?.to_vec();
                    images.push(ImageAsset::new(&filename, bytes));
                }
                (SUBJECT_FIELD, _) => subject = Some(field.text().await?),
                (MESSAGE_FIELD, _) => message = Some(field.text().await?),
                (other, _) => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        let excel_file = excel_file.ok_or(ApiError::MissingField("Excel file"))?;
        if images.len() > max_images {
            return Err(ApiError::TooManyImages);
        }
        let subject = subject
            .filter(|s| !s.trim().is_empty())
            .ok_or(ApiError::MissingField("Subject"))?;
        let message = message
            .filter(|m| !m.trim().is_empty())
            .ok_or(ApiError::MissingField("Message"))?;

        Ok(Self {
            excel_file,
            images,
            subject,
            message,
        })
    }
}

/// Campaign handler
pub struct CampaignHandler {
    service: Arc<CampaignService>,
}

impl CampaignHandler {
    pub fn new(service: Arc<CampaignService>) -> Self {
        Self { service }
    }

    /// Decode the spreadsheet and run the campaign
    pub async fn send(&self, request: SendCampaignRequest) -> Result<CampaignResult, ApiError> {
        let SendCampaignRequest {
            excel_file,
            images,
            subject,
            message,
        } = request;

        let contacts = tokio::task::spawn_blocking(move || spreadsheet::load_contacts(&excel_file))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;

        tracing::debug!(contacts = ?contacts, "Parsed contacts");

        let result = self
            .service
            .run(CampaignInput {
                subject,
                message_template: message,
                contacts,
                images,
            })
            .await;

        Ok(result)
    }
}

/// `POST /send-emails`
///
/// A body that is not multipart at all carries no spreadsheet, so it is
/// answered like a missing `excelFile`.
pub async fn send_emails(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CampaignResult>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Request is not multipart");
        ApiError::MissingField("Excel file")
    })?;

    let request = SendCampaignRequest::from_multipart(multipart, state.max_images).await?;
    let result = state.campaigns.send(request).await?;
    Ok(Json(result))
}
