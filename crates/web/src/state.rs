//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::billing::{GatewayError, OpenpayClient, SubscriptionService};
use crate::config::WebConfig;
use crate::services::EmailService;

/// Error constructing application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("billing client error: {0}")]
    Billing(#[from] GatewayError),
    #[error("smtp configuration error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the database pool, configuration,
/// the billing service, and the outbound mailer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: PgPool,
    billing: SubscriptionService<OpenpayClient>,
    email: EmailService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the billing HTTP client or the SMTP relay cannot
    /// be configured.
    pub fn new(config: WebConfig, pool: PgPool) -> Result<Self, StateError> {
        let gateway = OpenpayClient::new(&config.billing)?;
        let billing = SubscriptionService::new(gateway, config.billing.plan_id.clone());
        let email = EmailService::new(&config.email, &config.base_url)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                billing,
                email,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the billing service.
    #[must_use]
    pub fn billing(&self) -> &SubscriptionService<OpenpayClient> {
        &self.inner.billing
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }
}
