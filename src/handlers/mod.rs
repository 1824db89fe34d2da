//! Bulkmail HTTP Handlers

pub mod campaign;
pub mod error;
pub mod meta;

pub use campaign::{CampaignHandler, SendCampaignRequest};
pub use error::ApiError;
