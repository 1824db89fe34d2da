//! Campaign Models

use serde::Serialize;

use crate::models::NormalizedContact;

/// Reported in place of a blank or missing address.
pub const UNKNOWN_EMAIL: &str = "Unknown";

/// An uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    pub fn new(original_filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            original_filename: original_filename.to_string(),
            bytes,
        }
    }
}

/// Everything one bulk send needs
#[derive(Debug, Clone)]
pub struct CampaignInput {
    pub subject: String,
    pub message_template: String,
    pub contacts: Vec<NormalizedContact>,
    pub images: Vec<ImageAsset>,
}

/// Final classification of one contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryStatus {
    Sent,
    Failed,
    #[serde(rename = "Invalid Email")]
    InvalidEmail,
}

/// Outcome of one contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub email: String,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn sent(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: DeliveryStatus::Sent,
        }
    }

    pub fn failed(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: DeliveryStatus::Failed,
        }
    }

    pub fn invalid(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            status: DeliveryStatus::InvalidEmail,
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Summary returned to the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResult {
    /// Every outcome, in processing order
    pub results: Vec<DeliveryOutcome>,
    /// Addresses with a `Sent` outcome
    pub success_emails: Vec<String>,
    /// Addresses with any other outcome
    pub failed_emails: Vec<String>,
}

impl CampaignResult {
    pub fn from_outcomes(results: Vec<DeliveryOutcome>) -> Self {
        let (sent, not_sent): (Vec<&DeliveryOutcome>, Vec<&DeliveryOutcome>) =
            results.iter().partition(|outcome| outcome.is_sent());

        let success_emails = sent.into_iter().map(|o| o.email.clone()).collect();
        let failed_emails = not_sent.into_iter().map(|o| o.email.clone()).collect();

        Self {
            results,
            success_emails,
            failed_emails,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn sent_count(&self) -> usize {
        self.success_emails.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed_emails.len()
    }
}
