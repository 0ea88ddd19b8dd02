//! Wire types for the billing gateway.
//!
//! These mirror the gateway's JSON shapes. Remote customers and
//! subscriptions are projections owned by the gateway; locally only the
//! identifiers linking a member to them are persisted.

use serde::{Deserialize, Serialize};

use dailyrep_core::{CustomerId, PlanId, SubscriptionId, SubscriptionStatus};

use crate::models::User;

/// Country code submitted with every customer address.
///
/// The merchant account is scoped to a single country; the gateway rejects
/// payloads without one.
pub const COUNTRY_CODE: &str = "MX";

/// Customer payload for gateway create/update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerPayload {
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: AddressPayload,
}

/// Address portion of a [`CustomerPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPayload {
    pub city: String,
    pub state: String,
    pub line1: String,
    pub postal_code: String,
    pub country_code: String,
}

impl CustomerPayload {
    /// Build a customer payload from a member's profile and address.
    ///
    /// Fields the member has not filled in yet are sent as empty strings;
    /// the country code is fixed per merchant account.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();

        Self {
            name: field(&user.profile.first_name),
            last_name: field(&user.profile.last_name),
            email: user.email.as_str().to_owned(),
            phone_number: field(&user.profile.phone),
            address: AddressPayload {
                city: field(&user.address.city),
                state: field(&user.address.state),
                line1: field(&user.address.line1),
                postal_code: field(&user.address.postal_code),
                country_code: COUNTRY_CODE.to_owned(),
            },
        }
    }
}

/// Request body for the gateway's subscription-create endpoint.
///
/// `source_id` is the one-time card token minted by the browser tokenizer.
/// It is submitted once and never persisted or logged.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest {
    pub plan_id: PlanId,
    pub source_id: String,
}

/// A customer record as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCustomer {
    pub id: CustomerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// A subscription record as the gateway reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSubscription {
    pub id: SubscriptionId,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    /// Next charge date, gateway-formatted.
    #[serde(default)]
    pub charge_date: Option<String>,
    /// Trial expiry date, gateway-formatted.
    #[serde(default)]
    pub trial_end_date: Option<String>,
    #[serde(default)]
    pub card: Option<CardSummary>,
}

/// Masked card details attached to a subscription, for display only.
#[derive(Debug, Clone, Deserialize)]
pub struct CardSummary {
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub holder_name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Address, PaymentLink, Profile};
    use chrono::Utc;
    use dailyrep_core::{Email, UserId};

    fn bare_user() -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("member@example.com").unwrap(),
            profile: Profile::default(),
            address: Address::default(),
            payment: PaymentLink::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_payload_defaults_missing_fields_to_empty() {
        let payload = CustomerPayload::from_user(&bare_user());

        assert_eq!(payload.name, "");
        assert_eq!(payload.last_name, "");
        assert_eq!(payload.email, "member@example.com");
        assert_eq!(payload.phone_number, "");
        assert_eq!(payload.address.city, "");
        assert_eq!(payload.address.postal_code, "");
        assert_eq!(payload.address.country_code, COUNTRY_CODE);
    }

    #[test]
    fn test_payload_uses_profile_and_address() {
        let mut user = bare_user();
        user.profile.first_name = Some("Ana".to_owned());
        user.profile.last_name = Some("Torres".to_owned());
        user.profile.phone = Some("5512345678".to_owned());
        user.address.city = Some("CDMX".to_owned());
        user.address.line1 = Some("Av. Reforma 1".to_owned());

        let payload = CustomerPayload::from_user(&user);
        assert_eq!(payload.name, "Ana");
        assert_eq!(payload.last_name, "Torres");
        assert_eq!(payload.phone_number, "5512345678");
        assert_eq!(payload.address.city, "CDMX");
        assert_eq!(payload.address.line1, "Av. Reforma 1");
        // state was never filled in
        assert_eq!(payload.address.state, "");
    }

    #[test]
    fn test_remote_subscription_deserializes_unknown_status() {
        let json = r#"{"id":"sub_1","status":"paused","plan_id":"plan_1"}"#;
        let sub: RemoteSubscription = serde_json::from_str(json).unwrap();
        assert!(!sub.status.is_active_like());
        assert_eq!(sub.id.as_str(), "sub_1");
    }

    #[test]
    fn test_subscription_request_wire_shape() {
        let req = SubscriptionRequest {
            plan_id: PlanId::from("plan_1"),
            source_id: "tok_abc".to_owned(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["plan_id"], "plan_1");
        assert_eq!(json["source_id"], "tok_abc");
    }
}
