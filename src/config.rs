//! Process configuration from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::models::EmailAddress;
use crate::services::smtp::{SmtpConfig, TlsMode};

/// Configuration error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address
    pub bind_addr: IpAddr,
    /// Listen port
    pub port: u16,
    /// Outgoing relay
    pub smtp: SmtpConfig,
    /// Sender of every message
    pub sender: EmailAddress,
    /// Bound on each MX lookup
    pub dns_timeout: Duration,
    /// Bound on each message submission
    pub send_timeout: Duration,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
    /// Images accepted per request
    pub max_images: usize,
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 5000;
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
    pub const DEFAULT_MAX_IMAGES: usize = 10;

    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`, which maps a variable name to its value.
    ///
    /// Without `SMTP_HOST` the Gmail relay is used and `GMAIL_USER` /
    /// `GMAIL_PASS` are required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let port = parse_or(&get, "SMTP_PORT", 587)?;
                let tls = match get("SMTP_TLS") {
                    Some(value) => TlsMode::from_str(&value).map_err(|_| ConfigError::Invalid {
                        var: "SMTP_TLS",
                        value,
                    })?,
                    None => TlsMode::StartTls,
                };

                let mut config = SmtpConfig::relay(host, port).with_tls(tls);
                let user = get("SMTP_USER").or_else(|| get("GMAIL_USER"));
                let pass = get("SMTP_PASS").or_else(|| get("GMAIL_PASS"));
                match (user, pass) {
                    (Some(user), Some(pass)) => config = config.with_auth(user, pass),
                    (Some(_), None) => return Err(ConfigError::Missing("SMTP_PASS")),
                    _ => {}
                }
                config
            }
            None => {
                let user = get("GMAIL_USER").ok_or(ConfigError::Missing("GMAIL_USER"))?;
                let pass = get("GMAIL_PASS").ok_or(ConfigError::Missing("GMAIL_PASS"))?;
                SmtpConfig::gmail(user, pass)
            }
        };

        let send_timeout = Duration::from_secs(parse_or(&get, "SEND_TIMEOUT_SECS", 30)?);
        let smtp = smtp.with_timeout(send_timeout);

        let mut sender = get("MAIL_FROM")
            .or_else(|| smtp.username().map(str::to_string))
            .map(EmailAddress::from)
            .ok_or(ConfigError::Missing("MAIL_FROM"))?;
        if let Some(name) = get("MAIL_FROM_NAME") {
            sender = sender.with_name(name);
        }

        Ok(Self {
            bind_addr: parse_or(&get, "BIND_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(&get, "PORT", Self::DEFAULT_PORT)?,
            smtp,
            sender,
            dns_timeout: Duration::from_secs(parse_or(&get, "DNS_TIMEOUT_SECS", 10)?),
            send_timeout,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", Self::DEFAULT_MAX_UPLOAD_BYTES)?,
            max_images: parse_or(&get, "MAX_IMAGES", Self::DEFAULT_MAX_IMAGES)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
