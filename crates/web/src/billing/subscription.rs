//! Subscription reconciliation service.
//!
//! Keeps a member's local billing linkage (`payment.customer_id` /
//! `payment.subscription_id`) consistent with the remote gateway, and answers
//! the access gate's "is this subscription active" query.
//!
//! The service is stateless and never writes the user record: every
//! operation returns the data the calling handler must persist. That keeps a
//! single writer for the user entity and lets these flows run against a fake
//! gateway in tests.

use thiserror::Error;

use dailyrep_core::{CustomerId, PlanId};

use crate::models::User;

use super::gateway::{Gateway, GatewayError};
use super::types::{CustomerPayload, RemoteCustomer, RemoteSubscription, SubscriptionRequest};

/// Errors from billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The member has no gateway linkage yet; the caller must register the
    /// prerequisite (customer, then subscription) first. Raised before any
    /// gateway call is made and never retried automatically.
    #[error("billing profile is not registered with the payment gateway")]
    NotRegistered,

    /// The gateway call failed; surfaced verbatim, no retry.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Outcome of [`SubscriptionService::update_customer_or_recreate`].
#[derive(Debug)]
pub enum CustomerSync {
    /// The remote customer was updated in place.
    Updated(RemoteCustomer),
    /// The update failed but a fresh customer was created; the caller must
    /// persist the replacement id.
    Recreated(CustomerId),
}

/// Reconciles local billing linkage with the remote gateway.
///
/// Safe to share across requests: no interior state, one outbound call per
/// operation. Concurrent submissions for the *same* member are not
/// coordinated here; the gateway's own semantics govern that race.
pub struct SubscriptionService<G> {
    gateway: G,
    plan_id: PlanId,
}

impl<G: Gateway> SubscriptionService<G> {
    /// Create a service billing every member on the one configured plan.
    pub const fn new(gateway: G, plan_id: PlanId) -> Self {
        Self { gateway, plan_id }
    }

    /// Ensure a remote customer exists for this member.
    ///
    /// If the member is already linked, the stored id is returned without
    /// touching the gateway; the remote record is *not* re-synced. Otherwise
    /// a customer is created from the member's profile and address and the
    /// new id is returned for the caller to persist.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Gateway` if the create call fails. No retry.
    pub async fn ensure_customer(&self, user: &User) -> Result<CustomerId, BillingError> {
        if let Some(customer_id) = &user.payment.customer_id {
            return Ok(customer_id.clone());
        }

        let payload = CustomerPayload::from_user(user);
        let customer = self.gateway.create_customer(&payload).await?;

        tracing::info!(user_id = %user.id, customer_id = %customer.id, "Gateway customer created");
        Ok(customer.id)
    }

    /// Push the member's current profile and address to the remote customer.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::NotRegistered` (without any gateway call) if
    /// the member has no customer linkage; `BillingError::Gateway` if the
    /// update is rejected.
    pub async fn update_customer(&self, user: &User) -> Result<RemoteCustomer, BillingError> {
        let Some(customer_id) = &user.payment.customer_id else {
            return Err(BillingError::NotRegistered);
        };

        let payload = CustomerPayload::from_user(user);
        let customer = self.gateway.update_customer(customer_id, &payload).await?;
        Ok(customer)
    }

    /// Update the remote customer, recreating it once if the update fails.
    ///
    /// Recovery path for a remote customer deleted out-of-band while the
    /// local record still references it. Exactly one create attempt is made;
    /// if that also fails, the *original* update error is surfaced.
    ///
    /// # Errors
    ///
    /// As [`Self::update_customer`], with the fallback semantics above.
    pub async fn update_customer_or_recreate(
        &self,
        user: &User,
    ) -> Result<CustomerSync, BillingError> {
        let update_err = match self.update_customer(user).await {
            Ok(customer) => return Ok(CustomerSync::Updated(customer)),
            Err(BillingError::NotRegistered) => return Err(BillingError::NotRegistered),
            Err(err) => err,
        };

        tracing::warn!(
            user_id = %user.id,
            error = %update_err,
            "Customer update rejected, attempting re-create"
        );

        let payload = CustomerPayload::from_user(user);
        match self.gateway.create_customer(&payload).await {
            Ok(customer) => {
                tracing::info!(
                    user_id = %user.id,
                    customer_id = %customer.id,
                    "Gateway customer re-created after failed update"
                );
                Ok(CustomerSync::Recreated(customer.id))
            }
            Err(create_err) => {
                tracing::error!(
                    user_id = %user.id,
                    error = %create_err,
                    "Customer re-create also failed; surfacing original update error"
                );
                Err(update_err)
            }
        }
    }

    /// Subscribe the member to the configured plan with a one-time card
    /// token. The token is submitted to the gateway and dropped.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::NotRegistered` (without any gateway call) if
    /// the member has no customer linkage; `BillingError::Gateway` if the
    /// gateway rejects the subscription.
    pub async fn add_subscription(
        &self,
        user: &User,
        card_token: &str,
    ) -> Result<RemoteSubscription, BillingError> {
        let Some(customer_id) = &user.payment.customer_id else {
            return Err(BillingError::NotRegistered);
        };

        let request = SubscriptionRequest {
            plan_id: self.plan_id.clone(),
            source_id: card_token.to_owned(),
        };

        let subscription = self
            .gateway
            .create_subscription(customer_id, &request)
            .await?;

        tracing::info!(
            user_id = %user.id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Gateway subscription created"
        );
        Ok(subscription)
    }

    /// Fetch the member's subscription as the gateway currently sees it.
    ///
    /// Queried fresh on every gated request; there is deliberately no local
    /// cache, so the remote source of truth is reflected immediately.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::NotRegistered` (without any gateway call)
    /// unless both linkage ids are present; `BillingError::Gateway` on any
    /// provider failure, which callers must treat as "cannot verify, deny".
    pub async fn get_status(&self, user: &User) -> Result<RemoteSubscription, BillingError> {
        let (Some(customer_id), Some(subscription_id)) =
            (&user.payment.customer_id, &user.payment.subscription_id)
        else {
            return Err(BillingError::NotRegistered);
        };

        let subscription = self
            .gateway
            .get_subscription(customer_id, subscription_id)
            .await?;
        Ok(subscription)
    }

    /// Cancel the member's subscription at the gateway.
    ///
    /// On success the caller clears `payment.subscription_id`; this service
    /// never mutates the user record itself.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::NotRegistered` (without any gateway call)
    /// unless both linkage ids are present; `BillingError::Gateway` if the
    /// cancellation is rejected.
    pub async fn cancel_subscription(&self, user: &User) -> Result<(), BillingError> {
        let (Some(customer_id), Some(subscription_id)) =
            (&user.payment.customer_id, &user.payment.subscription_id)
        else {
            return Err(BillingError::NotRegistered);
        };

        self.gateway
            .delete_subscription(customer_id, subscription_id)
            .await?;

        tracing::info!(user_id = %user.id, "Gateway subscription cancelled");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use dailyrep_core::{Email, SubscriptionId, SubscriptionStatus, UserId};

    use crate::models::{Address, PaymentLink, Profile};

    use super::*;

    /// Fake gateway that counts calls and fails on demand.
    #[derive(Default)]
    struct FakeGateway {
        create_customer_calls: AtomicUsize,
        update_customer_calls: AtomicUsize,
        create_subscription_calls: AtomicUsize,
        get_subscription_calls: AtomicUsize,
        delete_subscription_calls: AtomicUsize,

        fail_create_customer: bool,
        fail_update_customer: bool,
        fail_get_subscription: bool,
        status: Option<SubscriptionStatus>,
    }

    fn api_error(description: &str) -> GatewayError {
        GatewayError::Api {
            status: 400,
            error_code: Some(1001),
            description: description.to_owned(),
        }
    }

    impl Gateway for FakeGateway {
        async fn create_customer(
            &self,
            payload: &CustomerPayload,
        ) -> Result<RemoteCustomer, GatewayError> {
            self.create_customer_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_create_customer {
                return Err(api_error("create rejected"));
            }
            Ok(RemoteCustomer {
                id: CustomerId::from("cus_1"),
                name: Some(payload.name.clone()),
                last_name: Some(payload.last_name.clone()),
                email: Some(payload.email.clone()),
                phone_number: Some(payload.phone_number.clone()),
            })
        }

        async fn update_customer(
            &self,
            id: &CustomerId,
            payload: &CustomerPayload,
        ) -> Result<RemoteCustomer, GatewayError> {
            self.update_customer_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_update_customer {
                return Err(api_error("update rejected"));
            }
            Ok(RemoteCustomer {
                id: id.clone(),
                name: Some(payload.name.clone()),
                last_name: Some(payload.last_name.clone()),
                email: Some(payload.email.clone()),
                phone_number: Some(payload.phone_number.clone()),
            })
        }

        async fn create_subscription(
            &self,
            _customer: &CustomerId,
            request: &SubscriptionRequest,
        ) -> Result<RemoteSubscription, GatewayError> {
            self.create_subscription_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.plan_id.as_str(), "plan_1");
            Ok(RemoteSubscription {
                id: SubscriptionId::from("sub_1"),
                status: SubscriptionStatus::Trial,
                plan_id: Some(request.plan_id.clone()),
                charge_date: None,
                trial_end_date: None,
                card: None,
            })
        }

        async fn get_subscription(
            &self,
            _customer: &CustomerId,
            subscription: &SubscriptionId,
        ) -> Result<RemoteSubscription, GatewayError> {
            self.get_subscription_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_get_subscription {
                return Err(api_error("gateway unavailable"));
            }
            Ok(RemoteSubscription {
                id: subscription.clone(),
                status: self.status.clone().unwrap_or(SubscriptionStatus::Active),
                plan_id: None,
                charge_date: None,
                trial_end_date: None,
                card: None,
            })
        }

        async fn delete_subscription(
            &self,
            _customer: &CustomerId,
            _subscription: &SubscriptionId,
        ) -> Result<(), GatewayError> {
            self.delete_subscription_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn user(payment: PaymentLink) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("member@example.com").unwrap(),
            profile: Profile {
                first_name: Some("Ana".to_owned()),
                last_name: Some("Torres".to_owned()),
                gender: None,
                phone: Some("5512345678".to_owned()),
            },
            address: Address::default(),
            payment,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn unlinked() -> User {
        user(PaymentLink::default())
    }

    fn registered() -> User {
        user(PaymentLink {
            customer_id: Some(CustomerId::from("cus_1")),
            subscription_id: None,
        })
    }

    fn subscribed() -> User {
        user(PaymentLink {
            customer_id: Some(CustomerId::from("cus_1")),
            subscription_id: Some(SubscriptionId::from("sub_1")),
        })
    }

    fn service(gateway: FakeGateway) -> SubscriptionService<FakeGateway> {
        SubscriptionService::new(gateway, PlanId::from("plan_1"))
    }

    // Scenario A: new user, no linkage -> create exactly once, never update.
    #[tokio::test]
    async fn test_ensure_customer_creates_once_for_unlinked_user() {
        let svc = service(FakeGateway::default());

        let id = svc.ensure_customer(&unlinked()).await.unwrap();

        assert_eq!(id.as_str(), "cus_1");
        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.gateway.update_customer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ensure_customer_is_noop_when_linked() {
        let svc = service(FakeGateway::default());

        let id = svc.ensure_customer(&registered()).await.unwrap();

        assert_eq!(id.as_str(), "cus_1");
        // Idempotent: no gateway traffic at all, no field re-sync.
        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 0);
        assert_eq!(svc.gateway.update_customer_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ensure_customer_surfaces_create_failure() {
        let svc = service(FakeGateway {
            fail_create_customer: true,
            ..FakeGateway::default()
        });

        let err = svc.ensure_customer(&unlinked()).await.unwrap_err();
        assert!(matches!(err, BillingError::Gateway(_)));
        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operations_require_registration_without_gateway_calls() {
        let svc = service(FakeGateway::default());
        let user = unlinked();

        assert!(matches!(
            svc.update_customer(&user).await.unwrap_err(),
            BillingError::NotRegistered
        ));
        assert!(matches!(
            svc.add_subscription(&user, "tok_1").await.unwrap_err(),
            BillingError::NotRegistered
        ));
        assert!(matches!(
            svc.get_status(&user).await.unwrap_err(),
            BillingError::NotRegistered
        ));
        assert!(matches!(
            svc.cancel_subscription(&user).await.unwrap_err(),
            BillingError::NotRegistered
        ));

        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 0);
        assert_eq!(svc.gateway.update_customer_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            svc.gateway.create_subscription_calls.load(Ordering::SeqCst),
            0
        );
        assert_eq!(svc.gateway.get_subscription_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            svc.gateway.delete_subscription_calls.load(Ordering::SeqCst),
            0
        );
    }

    // Scenario B: customer linked but no subscription provisioned yet.
    #[tokio::test]
    async fn test_get_status_requires_subscription_id() {
        let svc = service(FakeGateway::default());

        let err = svc.get_status(&registered()).await.unwrap_err();

        assert!(matches!(err, BillingError::NotRegistered));
        assert_eq!(svc.gateway.get_subscription_calls.load(Ordering::SeqCst), 0);
    }

    // Scenario C: fully linked, gateway reports active.
    #[tokio::test]
    async fn test_get_status_returns_remote_subscription() {
        let svc = service(FakeGateway {
            status: Some(SubscriptionStatus::Active),
            ..FakeGateway::default()
        });

        let sub = svc.get_status(&subscribed()).await.unwrap();

        assert!(sub.status.is_active_like());
        assert_eq!(svc.gateway.get_subscription_calls.load(Ordering::SeqCst), 1);
    }

    // Scenario D: gateway reports cancelled; status is surfaced as-is.
    #[tokio::test]
    async fn test_get_status_surfaces_inactive_status() {
        let svc = service(FakeGateway {
            status: Some(SubscriptionStatus::Cancelled),
            ..FakeGateway::default()
        });

        let sub = svc.get_status(&subscribed()).await.unwrap();
        assert!(!sub.status.is_active_like());
    }

    #[tokio::test]
    async fn test_get_status_propagates_gateway_failure() {
        let svc = service(FakeGateway {
            fail_get_subscription: true,
            ..FakeGateway::default()
        });

        let err = svc.get_status(&subscribed()).await.unwrap_err();
        assert!(matches!(err, BillingError::Gateway(_)));
        // Exactly one attempt; no retry.
        assert_eq!(svc.gateway.get_subscription_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_subscription_submits_plan_and_token() {
        let svc = service(FakeGateway::default());

        let sub = svc.add_subscription(&registered(), "tok_1").await.unwrap();

        assert_eq!(sub.id.as_str(), "sub_1");
        assert_eq!(
            svc.gateway.create_subscription_calls.load(Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn test_cancel_subscription_deletes_remote() {
        let svc = service(FakeGateway::default());

        svc.cancel_subscription(&subscribed()).await.unwrap();

        assert_eq!(
            svc.gateway.delete_subscription_calls.load(Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn test_update_customer_updates_in_place() {
        let svc = service(FakeGateway::default());

        let result = svc.update_customer_or_recreate(&registered()).await.unwrap();

        assert!(matches!(result, CustomerSync::Updated(_)));
        assert_eq!(svc.gateway.update_customer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 0);
    }

    // Scenario E, recovery half: update fails, single re-create succeeds.
    #[tokio::test]
    async fn test_update_failure_recreates_customer_once() {
        let svc = service(FakeGateway {
            fail_update_customer: true,
            ..FakeGateway::default()
        });

        let result = svc.update_customer_or_recreate(&registered()).await.unwrap();

        match result {
            CustomerSync::Recreated(id) => assert_eq!(id.as_str(), "cus_1"),
            CustomerSync::Updated(_) => panic!("expected re-create path"),
        }
        assert_eq!(svc.gateway.update_customer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 1);
    }

    // Scenario E, failure half: both fail, the original update error wins.
    #[tokio::test]
    async fn test_update_and_recreate_failure_surfaces_update_error() {
        let svc = service(FakeGateway {
            fail_update_customer: true,
            fail_create_customer: true,
            ..FakeGateway::default()
        });

        let err = svc
            .update_customer_or_recreate(&registered())
            .await
            .unwrap_err();

        match err {
            BillingError::Gateway(GatewayError::Api { description, .. }) => {
                assert_eq!(description, "update rejected");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The fallback is attempted at most once.
        assert_eq!(svc.gateway.update_customer_calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.gateway.create_customer_calls.load(Ordering::SeqCst), 1);
    }
}
