//! Member domain types.
//!
//! These are validated domain objects, separate from database row types.
//! Password material never appears here; it stays inside the repository and
//! auth service.

use chrono::{DateTime, Utc};

use dailyrep_core::{CustomerId, Email, SubscriptionId, UserId};

/// A registered member (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Member's email address, unique per account.
    pub email: Email,
    /// Optional profile details, filled in after signup.
    pub profile: Profile,
    /// Optional billing address, filled in before payment.
    pub address: Address,
    /// Linkage to the payment gateway.
    pub payment: PaymentLink,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a member may fill in after signup.
///
/// Everything here is optional; signup only requires email and password.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
}

/// Billing address fields, all optional until the member provides them.
#[derive(Debug, Clone, Default)]
pub struct Address {
    pub city: Option<String>,
    pub state: Option<String>,
    pub line1: Option<String>,
    pub postal_code: Option<String>,
}

/// The member's linkage to the payment gateway.
///
/// Invariant enforced by the repository: a subscription id is only ever
/// stored alongside a customer id.
#[derive(Debug, Clone, Default)]
pub struct PaymentLink {
    /// Gateway customer this member maps to, once registered.
    pub customer_id: Option<CustomerId>,
    /// Gateway subscription, once one has been provisioned.
    pub subscription_id: Option<SubscriptionId>,
}

impl PaymentLink {
    /// Whether the member has both linkage ids and can be status-checked.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.customer_id.is_some() && self.subscription_id.is_some()
    }
}

impl User {
    /// Full name if the profile has one, otherwise the email local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.profile.first_name, &self.profile.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.email.local_part().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("ana@example.com").unwrap(),
            profile: Profile::default(),
            address: Address::default(),
            payment: PaymentLink::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user().display_name(), "ana");

        let mut named = user();
        named.profile.first_name = Some("Ana".to_owned());
        assert_eq!(named.display_name(), "Ana");

        named.profile.last_name = Some("Torres".to_owned());
        assert_eq!(named.display_name(), "Ana Torres");
    }

    #[test]
    fn test_is_subscribed_requires_both_ids() {
        let mut payment = PaymentLink::default();
        assert!(!payment.is_subscribed());

        payment.customer_id = Some(CustomerId::from("cus_1"));
        assert!(!payment.is_subscribed());

        payment.subscription_id = Some(SubscriptionId::from("sub_1"));
        assert!(payment.is_subscribed());
    }
}
