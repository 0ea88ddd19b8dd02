//! Billing gateway abstraction.
//!
//! The [`Gateway`] trait is the seam between the reconciliation service and
//! the payment provider: production code uses the live HTTP client, tests
//! substitute a fake that records calls.

use std::future::Future;

use thiserror::Error;

use dailyrep_core::{CustomerId, SubscriptionId};

use super::types::{CustomerPayload, RemoteCustomer, RemoteSubscription, SubscriptionRequest};

/// Errors that can occur when talking to the billing gateway.
///
/// These are propagated verbatim to callers; the service layer performs no
/// retry or backoff.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("gateway error {status}: {description}")]
    Api {
        status: u16,
        error_code: Option<i64>,
        description: String,
    },

    /// The gateway responded with a body this client could not parse.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Operations the billing gateway exposes.
///
/// One method per provider endpoint; each call is a single awaited round
/// trip. Implementations must be safe to share across requests.
pub trait Gateway: Send + Sync {
    /// Create a customer record at the gateway.
    fn create_customer(
        &self,
        payload: &CustomerPayload,
    ) -> impl Future<Output = Result<RemoteCustomer, GatewayError>> + Send;

    /// Update an existing customer record.
    fn update_customer(
        &self,
        id: &CustomerId,
        payload: &CustomerPayload,
    ) -> impl Future<Output = Result<RemoteCustomer, GatewayError>> + Send;

    /// Subscribe a customer to a plan using a one-time card token.
    fn create_subscription(
        &self,
        customer: &CustomerId,
        request: &SubscriptionRequest,
    ) -> impl Future<Output = Result<RemoteSubscription, GatewayError>> + Send;

    /// Fetch the current state of a customer's subscription.
    fn get_subscription(
        &self,
        customer: &CustomerId,
        subscription: &SubscriptionId,
    ) -> impl Future<Output = Result<RemoteSubscription, GatewayError>> + Send;

    /// Cancel a customer's subscription.
    fn delete_subscription(
        &self,
        customer: &CustomerId,
        subscription: &SubscriptionId,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
