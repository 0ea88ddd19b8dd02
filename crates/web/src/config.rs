//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DAILYREP_DATABASE_URL` - `PostgreSQL` connection string
//! - `DAILYREP_BASE_URL` - Public URL for the site
//! - `DAILYREP_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `OPENPAY_MERCHANT_ID` - Billing gateway merchant id
//! - `OPENPAY_PRIVATE_KEY` - Billing gateway private API key (server-side only)
//! - `OPENPAY_PUBLIC_KEY` - Billing gateway public key (used by the card tokenizer)
//! - `OPENPAY_PLAN_ID` - The single subscription plan every member is billed on
//! - `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` - Outbound email relay
//! - `EMAIL_FROM` - From address for transactional email
//! - `CONTACT_RECIPIENT` - Destination for contact-form submissions
//!
//! ## Optional
//! - `DAILYREP_HOST` - Bind address (default: 127.0.0.1)
//! - `DAILYREP_PORT` - Listen port (default: 3000)
//! - `DAILYREP_MEDIA_DIR` - Directory for uploaded exercise videos (default: media)
//! - `OPENPAY_API_BASE` - Gateway base URL override (sandbox/testing)
//! - `SMTP_PORT` - SMTP relay port (default: 587)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use dailyrep_core::PlanId;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Directory for uploaded exercise videos
    pub media_dir: PathBuf,
    /// Billing gateway configuration
    pub billing: BillingConfig,
    /// Outbound email configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Billing gateway configuration.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct BillingConfig {
    /// Merchant id assigned by the gateway
    pub merchant_id: String,
    /// Private API key (server-side only)
    pub private_key: SecretString,
    /// Public key, safe to expose to the browser tokenizer
    pub public_key: String,
    /// The single subscription plan every member is billed on
    pub plan_id: PlanId,
    /// Gateway API base URL (overridable for sandbox/testing)
    pub api_base: String,
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("merchant_id", &self.merchant_id)
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .field("plan_id", &self.plan_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Outbound SMTP email configuration.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
    /// From address for transactional email
    pub from_address: String,
    /// Destination for contact-form submissions
    pub contact_recipient: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("contact_recipient", &self.contact_recipient)
            .finish()
    }
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("DAILYREP_DATABASE_URL")?;
        let host = get_env_or_default("DAILYREP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DAILYREP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DAILYREP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DAILYREP_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("DAILYREP_BASE_URL")?;
        let session_secret = get_validated_secret("DAILYREP_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "DAILYREP_SESSION_SECRET")?;
        let media_dir = PathBuf::from(get_env_or_default("DAILYREP_MEDIA_DIR", "media"));

        let billing = BillingConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            media_dir,
            billing,
            email,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BillingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            merchant_id: get_required_env("OPENPAY_MERCHANT_ID")?,
            private_key: get_validated_secret("OPENPAY_PRIVATE_KEY")?,
            public_key: get_required_env("OPENPAY_PUBLIC_KEY")?,
            plan_id: PlanId::from(get_required_env("OPENPAY_PLAN_ID")?),
            api_base: get_env_or_default("OPENPAY_API_BASE", "https://api.openpay.mx/v1"),
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let smtp_port = get_env_or_default("SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("EMAIL_FROM")?,
            contact_recipient: get_required_env("CONTACT_RECIPIENT")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by managed postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = WebConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            media_dir: PathBuf::from("media"),
            billing: BillingConfig {
                merchant_id: "m8m0qzxkjh".to_string(),
                private_key: SecretString::from("sk_live_redacted"),
                public_key: "pk_live_redacted".to_string(),
                plan_id: PlanId::from("pdbq5yqomrc"),
                api_base: "https://api.openpay.mx/v1".to_string(),
            },
            email: EmailConfig {
                smtp_host: "smtp.sendgrid.net".to_string(),
                smtp_port: 587,
                smtp_username: "apikey".to_string(),
                smtp_password: SecretString::from("sg_key"),
                from_address: "noreply@dailyrep.fit".to_string(),
                contact_recipient: "hello@dailyrep.fit".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_billing_config_debug_redacts_private_key() {
        let config = BillingConfig {
            merchant_id: "m8m0qzxkjh".to_string(),
            private_key: SecretString::from("sk_super_private_value"),
            public_key: "pk_public_value".to_string(),
            plan_id: PlanId::from("pdbq5yqomrc"),
            api_base: "https://api.openpay.mx/v1".to_string(),
        };

        let debug_output = format!("{config:?}");

        // Public fields should be visible
        assert!(debug_output.contains("m8m0qzxkjh"));
        assert!(debug_output.contains("pk_public_value"));

        // The private key must be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_super_private_value"));
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.sendgrid.net".to_string(),
            smtp_port: 587,
            smtp_username: "apikey".to_string(),
            smtp_password: SecretString::from("sg_super_private"),
            from_address: "noreply@dailyrep.fit".to_string(),
            contact_recipient: "hello@dailyrep.fit".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sg_super_private"));
    }
}
