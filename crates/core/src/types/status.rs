//! Status enums for gateway-owned entities.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle status of a remote subscription, as reported by the billing
/// gateway.
///
/// The gateway owns the full status set; locally only the "active-like"
/// distinction matters. Unknown values are preserved in [`Self::Other`] and
/// treated as not active, so a new provider-side status can never grant
/// access by accident.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    /// Free trial period, access granted.
    Trial,
    /// Paid and current, access granted.
    Active,
    /// Cancelled by the member or the merchant.
    Cancelled,
    /// A charge attempt failed and the gateway is retrying.
    PastDue,
    /// Charging has been given up on.
    Unpaid,
    /// Any status this application does not recognize.
    Other(String),
}

impl SubscriptionStatus {
    /// Whether this status grants access to gated content.
    ///
    /// Only `trial` and `active` qualify; everything else, including unknown
    /// statuses, is denied.
    #[must_use]
    pub const fn is_active_like(&self) -> bool {
        matches!(self, Self::Trial | Self::Active)
    }

    /// The gateway's wire representation of this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Trial => "trial",
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::PastDue => "past_due",
            Self::Unpaid => "unpaid",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(s: &str) -> Self {
        match s {
            "trial" => Self::Trial,
            "active" => Self::Active,
            "cancelled" => Self::Cancelled,
            "past_due" => Self::PastDue,
            "unpaid" => Self::Unpaid,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_active_like() {
        assert!(SubscriptionStatus::Trial.is_active_like());
        assert!(SubscriptionStatus::Active.is_active_like());
        assert!(!SubscriptionStatus::Cancelled.is_active_like());
        assert!(!SubscriptionStatus::PastDue.is_active_like());
        assert!(!SubscriptionStatus::Unpaid.is_active_like());
        assert!(!SubscriptionStatus::Other("paused".to_owned()).is_active_like());
    }

    #[test]
    fn test_wire_roundtrip() {
        for wire in ["trial", "active", "cancelled", "past_due", "unpaid"] {
            let status = SubscriptionStatus::from(wire);
            assert_eq!(status.as_str(), wire);
        }
    }

    #[test]
    fn test_unknown_preserved() {
        let status = SubscriptionStatus::from("charge_pending");
        assert_eq!(status, SubscriptionStatus::Other("charge_pending".to_owned()));
        assert_eq!(status.as_str(), "charge_pending");
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");

        let status: SubscriptionStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Active);

        let status: SubscriptionStatus = serde_json::from_str("\"paused\"").unwrap();
        assert!(!status.is_active_like());
    }
}
