//! In-memory capabilities for tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::Email;
use crate::services::smtp::{MailTransport, SendResult, SmtpError};
use crate::services::validator::{LookupError, MxLookup};

/// Answers MX lookups from a fixed domain set
pub struct StaticMxLookup {
    domains: HashSet<String>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticMxLookup {
    pub fn with_domains(domains: &[&str]) -> Self {
        Self {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_domains(&[])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MxLookup for StaticMxLookup {
    async fn has_mx_records(&self, domain: &str) -> Result<bool, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(LookupError::Resolve("SERVFAIL".to_string()));
        }

        Ok(self.domains.contains(domain))
    }
}

/// Records every message and rejects a configured set of recipients
#[derive(Default)]
pub struct RecordingTransport {
    rejected: HashSet<String>,
    reply_code: Option<String>,
    delay: Option<Duration>,
    sent: Mutex<Vec<Email>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(recipients: &[&str]) -> Self {
        Self {
            rejected: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer every send with `code` instead of `250`
    pub fn replying(mut self, code: &str) -> Self {
        self.reply_code = Some(code.to_string());
        self
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.lock().await.clone()
    }

    pub async fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|email| email.to.email.clone())
            .collect()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &Email) -> Result<SendResult, SmtpError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.rejected.contains(&email.to.email) {
            return Err(SmtpError::Send("550 mailbox unavailable".to_string()));
        }

        self.sent.lock().await.push(email.clone());

        Ok(SendResult {
            code: self.reply_code.clone().unwrap_or_else(|| "250".to_string()),
            message: Some("OK".to_string()),
        })
    }
}
