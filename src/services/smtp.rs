//! SMTP delivery
//!
//! [`MailTransport`] is the seam the campaign runner sends through;
//! [`SmtpTransport`] is the production implementation over a pooled lettre
//! relay connection.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment as InlinePart, Mailbox, MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, PoolConfig},
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::models::{Email, EmailAddress};

/// SMTP transport error
#[derive(Debug, thiserror::Error)]
pub enum SmtpError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Send error: {0}")]
    Send(String),
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Plain text, for local relays only
    None,
    /// Upgrade with STARTTLS
    StartTls,
    /// Implicit TLS
    Tls,
}

impl FromStr for TlsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(Self::None),
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            other => Err(format!("unknown TLS mode '{}'", other)),
        }
    }
}

/// Relay login
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Outgoing relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub auth: Option<SmtpAuth>,
    /// Socket timeout for each SMTP command
    pub timeout: Duration,
    pub max_connections: u32,
}

impl SmtpConfig {
    pub fn relay(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            tls: TlsMode::StartTls,
            auth: None,
            timeout: Duration::from_secs(30),
            max_connections: 4,
        }
    }

    /// Gmail submission port with an app password
    pub fn gmail(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::relay("smtp.gmail.com", 587).with_auth(username, password)
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(SmtpAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.auth.as_ref().map(|auth| auth.username.as_str())
    }
}

/// Mail-sending capability. Implementations must be safe to share between
/// concurrent requests.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &Email) -> Result<SendResult, SmtpError>;

    /// Probe the relay without sending anything
    async fn test_connection(&self) -> Result<bool, SmtpError> {
        Ok(true)
    }
}

/// Relay reply to an accepted message
#[derive(Debug, Clone)]
pub struct SendResult {
    pub code: String,
    pub message: Option<String>,
}

impl SendResult {
    pub fn is_success(&self) -> bool {
        self.code.starts_with('2')
    }
}

pub struct SmtpTransport {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// Build the pooled transport. Nothing is dialed until the first send or
    /// `test_connection`.
    pub fn new(config: SmtpConfig) -> Result<Self, SmtpError> {
        let builder = match config.tls {
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| SmtpError::Configuration(e.to_string()))?,
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| SmtpError::Configuration(e.to_string()))?,
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(config.timeout))
            .pool_config(PoolConfig::new().max_size(config.max_connections));

        if let Some(auth) = &config.auth {
            builder = builder.credentials(Credentials::new(
                auth.username.clone(),
                auth.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: &Email) -> Result<SendResult, SmtpError> {
        let message = build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| SmtpError::Send(e.to_string()))?;

        let lines: Vec<&str> = response.message().collect();

        Ok(SendResult {
            code: response.code().to_string(),
            message: (!lines.is_empty()).then(|| lines.join(" ")),
        })
    }

    async fn test_connection(&self) -> Result<bool, SmtpError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| SmtpError::Connection(e.to_string()))
    }
}

fn mailbox(address: &EmailAddress) -> Result<Mailbox, SmtpError> {
    let parsed: Address = address
        .email
        .parse()
        .map_err(|e| SmtpError::InvalidEmail(format!("{}: {}", address.email, e)))?;

    Ok(Mailbox::new(address.name.clone(), parsed))
}

/// Assemble the MIME message.
///
/// Without images the body is a single `text/html` part. With images it is
/// `multipart/related`: the HTML first, then one inline part per image
/// carrying the `Content-ID` the HTML refers to.
pub fn build_message(email: &Email) -> Result<Message, SmtpError> {
    let builder = Message::builder()
        .message_id(Some(email.message_id()))
        .from(mailbox(&email.from)?)
        .to(mailbox(&email.to)?)
        .subject(email.subject.as_str());

    let html = SinglePart::html(email.html_body.clone());

    let message = if email.attachments.is_empty() {
        builder.singlepart(html)
    } else {
        let mut related = MultiPart::related().singlepart(html);

        for image in email.attachments.iter() {
            let content_type = ContentType::parse(&image.content_type)
                .map_err(|e| SmtpError::InvalidEmail(format!("{}: {}", image.filename, e)))?;

            related = related.singlepart(
                InlinePart::new_inline_with_name(image.content_id.clone(), image.filename.clone())
                    .body(image.content.clone(), content_type),
            );
        }

        builder.multipart(related)
    };

    message.map_err(|e| SmtpError::InvalidEmail(e.to_string()))
}
