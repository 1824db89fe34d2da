//! Bulkmail Models

pub mod campaign;
pub mod contact;
pub mod email;

pub use campaign::*;
pub use contact::*;
pub use email::*;
