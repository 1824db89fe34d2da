//! Bulkmail server assembly

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers::{campaign, meta, CampaignHandler};
use crate::services::{
    campaign::CampaignConfig, smtp::MailTransport, validator::MxLookup, CampaignService,
    DnsMxLookup, EmailValidator, SmtpError, SmtpTransport,
};

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub campaigns: Arc<CampaignHandler>,
    pub max_images: usize,
}

/// The assembled application
pub struct BulkMailServer {
    config: AppConfig,
    state: AppState,
    transport: Arc<dyn MailTransport>,
}

impl BulkMailServer {
    /// Wire the SMTP relay and system resolver from `config`
    pub fn new(config: AppConfig) -> Result<Self, SmtpError> {
        let transport = Arc::new(SmtpTransport::new(config.smtp.clone())?);
        let lookup = Arc::new(DnsMxLookup::from_system_conf());
        Ok(Self::with_capabilities(config, transport, lookup))
    }

    /// Wire caller-supplied capabilities
    pub fn with_capabilities(
        config: AppConfig,
        transport: Arc<dyn MailTransport>,
        lookup: Arc<dyn MxLookup>,
    ) -> Self {
        let validator = EmailValidator::new(lookup, config.dns_timeout);
        let campaign_config =
            CampaignConfig::new(config.sender.clone()).with_send_timeout(config.send_timeout);
        let service = Arc::new(CampaignService::new(
            campaign_config,
            Arc::clone(&transport),
            validator,
        ));

        let state = AppState {
            campaigns: Arc::new(CampaignHandler::new(service)),
            max_images: config.max_images,
        };

        Self {
            config,
            state,
            transport,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check that the mail relay accepts connections
    pub async fn check_transport(&self) -> Result<(), SmtpError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(SmtpError::Connection(format!(
                "{}:{} refused the connection test",
                self.config.smtp.host, self.config.smtp.port
            )))
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(meta::health))
            .route("/download-excel", get(meta::download_template))
            .route("/send-emails", post(campaign::send_emails))
            .layer(DefaultBodyLimit::max(self.config.max_upload_bytes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve until the process is stopped
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Server running");

        axum::serve(listener, self.router()).await
    }
}
