//! Bulkmail Services

pub mod attachments;
pub mod campaign;
pub mod renderer;
pub mod smtp;
pub mod spreadsheet;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use campaign::CampaignService;
pub use smtp::{SmtpConfig, SmtpError, SmtpTransport, TlsMode};
pub use spreadsheet::DecodeError;
pub use validator::{DnsMxLookup, EmailValidator};
