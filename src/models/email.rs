//! Outgoing message model

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Mailbox with an optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Everything after the last `@`
    pub fn domain(&self) -> Option<&str> {
        self.email.rsplit_once('@').map(|(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl From<&str> for EmailAddress {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for EmailAddress {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

/// Image carried inside the message and referenced from the HTML as
/// `cid:<content_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content_id: String,
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn inline(
        content_id: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        }
    }

    /// `cid:` URL for use in an `src` attribute
    pub fn cid_url(&self) -> String {
        format!("cid:{}", self.content_id)
    }
}

/// One personalized HTML message for one contact.
///
/// `attachments` is shared by every message of a run.
#[derive(Debug, Clone)]
pub struct Email {
    pub id: Uuid,
    pub from: EmailAddress,
    pub to: EmailAddress,
    pub subject: String,
    pub html_body: String,
    pub attachments: Arc<[Attachment]>,
}

impl Email {
    /// `Message-ID` header value, scoped to the sender's domain
    pub fn message_id(&self) -> String {
        format!("<{}@{}>", self.id, self.from.domain().unwrap_or("localhost"))
    }
}

/// Missing part of an `Email`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmailError {
    #[error("sender is required")]
    MissingSender,
    #[error("recipient is required")]
    MissingRecipient,
    #[error("subject is required")]
    MissingSubject,
    #[error("HTML body is required")]
    MissingBody,
}

#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<EmailAddress>,
    to: Option<EmailAddress>,
    subject: Option<String>,
    html_body: Option<String>,
    attachments: Option<Arc<[Attachment]>>,
}

impl EmailBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(mut self, address: impl Into<EmailAddress>) -> Self {
        self.from = Some(address.into());
        self
    }

    pub fn to(mut self, address: impl Into<EmailAddress>) -> Self {
        self.to = Some(address.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    pub fn attachments(mut self, attachments: Arc<[Attachment]>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    pub fn build(self) -> Result<Email, EmailError> {
        Ok(Email {
            id: Uuid::now_v7(),
            from: self.from.ok_or(EmailError::MissingSender)?,
            to: self.to.ok_or(EmailError::MissingRecipient)?,
            subject: self.subject.ok_or(EmailError::MissingSubject)?,
            html_body: self.html_body.ok_or(EmailError::MissingBody)?,
            attachments: self.attachments.unwrap_or_else(|| Arc::from(Vec::new())),
        })
    }
}
