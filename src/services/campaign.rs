//! Campaign Service - runs one bulk send from decoded contacts to a report

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::models::{
    Attachment, CampaignInput, CampaignResult, DeliveryOutcome, EmailAddress, EmailBuilder,
    ImageAsset, NormalizedContact, UNKNOWN_EMAIL,
};
use crate::services::{
    attachments::build_inline_attachments,
    renderer::{image_tags, render_message},
    smtp::{MailTransport, SmtpError},
    validator::{EmailValidator, Validation},
};

/// Campaign configuration
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Sender used for every message
    pub sender: EmailAddress,
    /// Upper bound on a single send
    pub send_timeout: Duration,
}

impl CampaignConfig {
    pub fn new(sender: EmailAddress) -> Self {
        Self {
            sender,
            send_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }
}

/// State shared by every contact of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub subject: String,
    pub template: String,
    pub attachments: Arc<[Attachment]>,
    pub images_html: String,
}

impl RunContext {
    pub fn new(subject: String, template: String, images: Vec<ImageAsset>) -> Self {
        let attachments: Arc<[Attachment]> = Arc::from(build_inline_attachments(images));
        let images_html = image_tags(&attachments);

        Self {
            run_id: Uuid::now_v7(),
            subject,
            template,
            attachments,
            images_html,
        }
    }
}

/// Bulk sender
pub struct CampaignService {
    config: CampaignConfig,
    transport: Arc<dyn MailTransport>,
    validator: EmailValidator,
}

impl CampaignService {
    pub fn new(
        config: CampaignConfig,
        transport: Arc<dyn MailTransport>,
        validator: EmailValidator,
    ) -> Self {
        Self {
            config,
            transport,
            validator,
        }
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Process every contact in order, one at a time, and summarize.
    pub async fn run(&self, input: CampaignInput) -> CampaignResult {
        let CampaignInput {
            subject,
            message_template,
            contacts,
            images,
        } = input;

        let ctx = RunContext::new(subject, message_template, images);
        let span = tracing::info_span!(
            "campaign",
            run_id = %ctx.run_id,
            contacts = contacts.len(),
            images = ctx.attachments.len(),
        );

        async {
            let mut outcomes = Vec::with_capacity(contacts.len());

            for contact in &contacts {
                outcomes.push(self.process_contact(&ctx, contact).await);
            }

            let result = CampaignResult::from_outcomes(outcomes);
            tracing::info!(
                sent = result.sent_count(),
                failed = result.failed_count(),
                "Campaign finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Validate, render and send for one contact. Never fails: every error
    /// is folded into the returned outcome.
    pub async fn process_contact(
        &self,
        ctx: &RunContext,
        contact: &NormalizedContact,
    ) -> DeliveryOutcome {
        let raw_email = contact.email();
        tracing::debug!(email = ?raw_email, "Processing contact");

        let email = match self.validator.validate(raw_email.as_deref()).await {
            Validation::Valid { email, .. } => email,
            rejected => {
                let reported = raw_email
                    .as_deref()
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .unwrap_or(UNKNOWN_EMAIL)
                    .to_string();
                tracing::warn!(email = %reported, reason = ?rejected, "Invalid or unreachable email");
                return DeliveryOutcome::invalid(reported);
            }
        };

        let html = render_message(
            &ctx.template,
            contact.name().as_deref(),
            contact.number().as_deref(),
            &ctx.images_html,
        );

        let message = EmailBuilder::new()
            .from(self.config.sender.clone())
            .to(email.as_str())
            .subject(ctx.subject.as_str())
            .html(html)
            .attachments(Arc::clone(&ctx.attachments))
            .build();

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(email = %email, error = %e, "Could not build message");
                return DeliveryOutcome::failed(email);
            }
        };

        let sent = tokio::time::timeout(self.config.send_timeout, self.transport.send(&message))
            .await
            .unwrap_or(Err(SmtpError::Timeout(self.config.send_timeout)));

        match sent {
            Ok(reply) if reply.is_success() => {
                tracing::info!(email = %email, code = %reply.code, "Email sent");
                DeliveryOutcome::sent(email)
            }
            Ok(reply) => {
                tracing::error!(email = %email, code = %reply.code, reply = ?reply.message, "Relay refused message");
                DeliveryOutcome::failed(email)
            }
            Err(e) => {
                tracing::error!(email = %email, error = %e, "Failed to send");
                DeliveryOutcome::failed(email)
            }
        }
    }
}
