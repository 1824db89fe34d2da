//! Email Validator - address shape and MX deliverability

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// MX lookup error
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("DNS lookup failed: {0}")]
    Resolve(String),
}

/// Mail-exchange lookup capability
#[async_trait]
pub trait MxLookup: Send + Sync {
    /// Whether `domain` publishes at least one MX record
    async fn has_mx_records(&self, domain: &str) -> Result<bool, LookupError>;
}

/// MX lookups through the system resolver
pub struct DnsMxLookup {
    resolver: TokioAsyncResolver,
}

impl DnsMxLookup {
    pub fn new(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }

    /// Use `/etc/resolv.conf` (or the platform equivalent), falling back to
    /// the resolver defaults when it cannot be read.
    pub fn from_system_conf() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "System resolver config unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });

        Self::new(resolver)
    }
}

#[async_trait]
impl MxLookup for DnsMxLookup {
    async fn has_mx_records(&self, domain: &str) -> Result<bool, LookupError> {
        let lookup = self
            .resolver
            .mx_lookup(domain)
            .await
            .map_err(|e| LookupError::Resolve(e.to_string()))?;

        Ok(lookup.iter().next().is_some())
    }
}

/// Result of validating one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid { email: String, domain: String },
    InvalidSyntax,
    Undeliverable,
}

/// `local@domain.tld` with no whitespace and a single `@`
pub fn is_valid_syntax(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// The part after the `@`
pub fn domain_of(email: &str) -> Option<&str> {
    email.split('@').nth(1)
}

/// Two-gate address validator
pub struct EmailValidator {
    lookup: Arc<dyn MxLookup>,
    timeout: Duration,
}

impl EmailValidator {
    pub fn new(lookup: Arc<dyn MxLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Validate a raw cell value. The syntax gate runs first and a failure
    /// there skips the lookup entirely. Lookup errors and timeouts count as
    /// undeliverable.
    pub async fn validate(&self, email: Option<&str>) -> Validation {
        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(email) => email,
            None => return Validation::InvalidSyntax,
        };

        if !is_valid_syntax(email) {
            return Validation::InvalidSyntax;
        }

        let domain = match domain_of(email) {
            Some(domain) => domain,
            None => return Validation::InvalidSyntax,
        };

        match tokio::time::timeout(self.timeout, self.lookup.has_mx_records(domain)).await {
            Ok(Ok(true)) => Validation::Valid {
                email: email.to_string(),
                domain: domain.to_string(),
            },
            Ok(Ok(false)) => {
                tracing::debug!(domain, "No MX records");
                Validation::Undeliverable
            }
            Ok(Err(e)) => {
                tracing::debug!(domain, error = %e, "MX lookup failed");
                Validation::Undeliverable
            }
            Err(_) => {
                tracing::warn!(domain, timeout = ?self.timeout, "MX lookup timed out");
                Validation::Undeliverable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::StaticMxLookup;

    fn validator(lookup: Arc<StaticMxLookup>) -> EmailValidator {
        EmailValidator::new(lookup, Duration::from_secs(1))
    }

    #[test]
    fn test_syntax_gate() {
        assert!(is_valid_syntax("sam@example.com"));
        assert!(is_valid_syntax("first.last+tag@mail.example.co.uk"));

        assert!(!is_valid_syntax("not-an-email"));
        assert!(!is_valid_syntax("sam@example"));
        assert!(!is_valid_syntax("sam@@example.com"));
        assert!(!is_valid_syntax("sa m@example.com"));
        assert!(!is_valid_syntax("@example.com"));
        assert!(!is_valid_syntax(""));
    }

    #[tokio::test]
    async fn test_bad_syntax_skips_lookup() {
        let lookup = Arc::new(StaticMxLookup::with_domains(&["example.com"]));
        let validator = validator(Arc::clone(&lookup));

        assert_eq!(validator.validate(Some("not-an-email")).await, Validation::InvalidSyntax);
        assert_eq!(validator.validate(Some("   ")).await, Validation::InvalidSyntax);
        assert_eq!(validator.validate(None).await, Validation::InvalidSyntax);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_domain_without_mx_is_undeliverable() {
        let lookup = Arc::new(StaticMxLookup::with_domains(&["example.com"]));
        let validator = validator(Arc::clone(&lookup));

        let result = validator.validate(Some("sam@nomail.test")).await;
        assert_eq!(result, Validation::Undeliverable);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_valid_address_is_trimmed() {
        let lookup = Arc::new(StaticMxLookup::with_domains(&["example.com"]));
        let validator = validator(lookup);

        let result = validator.validate(Some("  sam@example.com ")).await;
        assert_eq!(
            result,
            Validation::Valid {
                email: "sam@example.com".to_string(),
                domain: "example.com".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_lookup_error_is_undeliverable() {
        let lookup = Arc::new(StaticMxLookup::failing());
        let validator = validator(lookup);

        let result = validator.validate(Some("sam@example.com")).await;
        assert_eq!(result, Validation::Undeliverable);
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out() {
        let lookup = Arc::new(
            StaticMxLookup::with_domains(&["example.com"]).with_delay(Duration::from_millis(200)),
        );
        let validator = EmailValidator::new(lookup, Duration::from_millis(20));

        let result = validator.validate(Some("sam@example.com")).await;
        assert_eq!(result, Validation::Undeliverable);
    }
}
