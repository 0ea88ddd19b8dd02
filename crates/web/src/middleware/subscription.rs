//! Subscription access gate.
//!
//! Guards member-only content: a request is admitted only when the visitor
//! is logged in, has a fully registered billing profile, and the gateway
//! reports their subscription as trial or active. The status is checked
//! fresh on every gated request; a status that cannot be verified denies
//! access.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use dailyrep_core::SubscriptionStatus;

use crate::db::users::UserRepository;
use crate::models::{CurrentUser, session::keys};
use crate::state::AppState;

/// What the gate learned about the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateInput {
    /// Nobody logged in.
    Anonymous,
    /// Logged in, but billing linkage is incomplete.
    NotRegistered,
    /// Logged in and linked; the gateway reported this status.
    Status(SubscriptionStatus),
    /// Logged in and linked, but the status could not be verified.
    CheckFailed,
}

/// Where the gate sends a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Active-like subscription; let the request through.
    Admit,
    RedirectLogin,
    /// Missing billing linkage or inactive subscription.
    RedirectBilling,
    /// Status unverifiable (gateway trouble); back to the home page.
    RedirectHome,
}

/// The gate's decision table.
#[must_use]
pub fn decide(input: &GateInput) -> GateDecision {
    match input {
        GateInput::Anonymous => GateDecision::RedirectLogin,
        GateInput::NotRegistered => GateDecision::RedirectBilling,
        GateInput::Status(status) if status.is_active_like() => GateDecision::Admit,
        GateInput::Status(_) => GateDecision::RedirectBilling,
        GateInput::CheckFailed => GateDecision::RedirectHome,
    }
}

/// Axum middleware enforcing the access gate on member-only routes.
pub async fn require_active_subscription(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let current: Option<CurrentUser> = match request.extensions().get::<Session>() {
        Some(session) => session.get(keys::CURRENT_USER).await.ok().flatten(),
        None => None,
    };

    let input = match &current {
        Some(current) => gate_input(&state, current).await,
        None => GateInput::Anonymous,
    };

    match decide(&input) {
        GateDecision::Admit => next.run(request).await,
        GateDecision::RedirectLogin => {
            Redirect::to("/login?error=Please+log+in+to+continue").into_response()
        }
        GateDecision::RedirectBilling => {
            Redirect::to("/billing?error=An+active+subscription+is+required").into_response()
        }
        GateDecision::RedirectHome => {
            Redirect::to("/?error=We+could+not+verify+your+subscription").into_response()
        }
    }
}

/// Resolve the member's live billing state for the gate.
async fn gate_input(state: &AppState, current: &CurrentUser) -> GateInput {
    let users = UserRepository::new(state.pool());
    let user = match users.get_by_id(current.id).await {
        Ok(Some(user)) => user,
        // A stale session for a deleted account is anonymous.
        Ok(None) => return GateInput::Anonymous,
        Err(err) => {
            tracing::error!(user_id = %current.id, error = %err, "Gate lookup failed");
            return GateInput::CheckFailed;
        }
    };

    if !user.payment.is_subscribed() {
        return GateInput::NotRegistered;
    }

    match state.billing().get_status(&user).await {
        Ok(subscription) => GateInput::Status(subscription.status),
        Err(err) => {
            // Cannot verify, deny.
            tracing::warn!(user_id = %user.id, error = %err, "Gate status check failed");
            GateInput::CheckFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_requires_login_first() {
        assert_eq!(decide(&GateInput::Anonymous), GateDecision::RedirectLogin);
    }

    #[test]
    fn test_gate_admits_trial_and_active() {
        for status in [SubscriptionStatus::Trial, SubscriptionStatus::Active] {
            assert_eq!(decide(&GateInput::Status(status)), GateDecision::Admit);
        }
    }

    #[test]
    fn test_gate_denies_inactive_statuses() {
        for status in [
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Unpaid,
            SubscriptionStatus::Other("paused".to_owned()),
        ] {
            assert_eq!(
                decide(&GateInput::Status(status)),
                GateDecision::RedirectBilling
            );
        }
    }

    #[test]
    fn test_gate_sends_unregistered_members_to_billing() {
        assert_eq!(
            decide(&GateInput::NotRegistered),
            GateDecision::RedirectBilling
        );
    }

    #[test]
    fn test_gate_fails_closed_on_unverifiable_status() {
        assert_eq!(decide(&GateInput::CheckFailed), GateDecision::RedirectHome);
    }
}
