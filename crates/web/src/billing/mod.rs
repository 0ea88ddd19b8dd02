//! Payment gateway integration.
//!
//! [`openpay`] is the HTTP client for the Openpay REST API, [`gateway`]
//! the trait seam that lets [`subscription`] run against a fake in tests.

pub mod gateway;
pub mod openpay;
pub mod subscription;
pub mod types;

pub use gateway::{Gateway, GatewayError};
pub use openpay::OpenpayClient;
pub use subscription::{BillingError, CustomerSync, SubscriptionService};
pub use types::{CustomerPayload, RemoteCustomer, RemoteSubscription};
