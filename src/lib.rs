//! Bulkmail - Spreadsheet-driven bulk email
//!
//! Bulkmail takes an uploaded contacts spreadsheet, a subject, a message
//! template and optional images, then sends one personalized HTML email per
//! contact and reports what happened to each address:
//!
//! - **Decoding**: first sheet of an xlsx/xls/ods workbook, header row as keys
//! - **Validation**: address shape, then MX records for the domain
//! - **Rendering**: `{{name}}`, `{{number}}` and `{{image}}` placeholders
//! - **Delivery**: SMTP with inline `cid:` images
//! - **Reporting**: `Sent`, `Failed` or `Invalid Email` for every row
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulkmail::{AppConfig, BulkMailServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     BulkMailServer::new(config)?.serve().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Running a campaign directly
//!
//! ```rust,ignore
//! use bulkmail::services::spreadsheet;
//! use bulkmail::{CampaignInput, CampaignService};
//!
//! async fn send(service: &CampaignService, xlsx: &[u8]) -> anyhow::Result<()> {
//!     let contacts = spreadsheet::load_contacts(xlsx)?;
//!     let result = service.run(CampaignInput {
//!         subject: "Hello".into(),
//!         message_template: "Hi {{name}}".into(),
//!         contacts,
//!         images: vec![],
//!     }).await;
//!     println!("Sent: {}, Failed: {}", result.sent_count(), result.failed_count());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handlers;
pub mod models;
pub mod server;
pub mod services;

// Re-exports
pub use models::{
    Attachment, CampaignInput, CampaignResult, CellValue, DeliveryOutcome, DeliveryStatus, Email,
    EmailAddress, EmailBuilder, EmailError, ImageAsset, NormalizedContact, RawContactRecord,
};

pub use services::{
    CampaignService, DecodeError, DnsMxLookup, EmailValidator, SmtpConfig, SmtpError,
    SmtpTransport, TlsMode,
};

pub use handlers::{ApiError, CampaignHandler};

pub use config::{AppConfig, ConfigError};
pub use server::{AppState, BulkMailServer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::services::campaign::CampaignConfig;
    use crate::services::spreadsheet::{self, tests::workbook_bytes};
    use crate::services::testing::{RecordingTransport, StaticMxLookup};

    #[tokio::test]
    async fn test_spreadsheet_to_report() {
        let bytes = workbook_bytes(&[
            &["name", "Email", "NUMBER"],
            &["Sam", "sam@example.com", "42"],
            &["Jo", "jo@example.com", "9"],
            &["", "", "3"],
            &["Kim", "kim@nowhere.test", "5"],
        ]);

        let contacts = spreadsheet::load_contacts(&bytes).unwrap();
        assert_eq!(contacts.len(), 4);

        let transport = Arc::new(RecordingTransport::rejecting(&["jo@example.com"]));
        let service = CampaignService::new(
            CampaignConfig::new(EmailAddress::new("sender@example.com")),
            transport.clone(),
            EmailValidator::new(
                Arc::new(StaticMxLookup::with_domains(&["example.com"])),
                Duration::from_secs(1),
            ),
        );

        let result = service
            .run(CampaignInput {
                subject: "Codes".to_string(),
                message_template: "Hi {{name}}, your code is {{number}}".to_string(),
                contacts,
                images: vec![],
            })
            .await;

        assert_eq!(result.total(), 4);
        assert_eq!(result.success_emails, vec!["sam@example.com"]);
        assert_eq!(
            result.failed_emails,
            vec!["jo@example.com", "Unknown", "kim@nowhere.test"]
        );

        let sent = transport.sent().await;
        assert!(sent[0].html_body.ends_with("<p>Hi Sam, your code is 42</p>"));
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
