//! Billing route handlers.
//!
//! The payment flow: the browser tokenizes the card with the gateway's JS
//! library (using the merchant id and public key), then posts the one-time
//! token and device session id here. The handler registers the member as a
//! gateway customer if needed, subscribes them to the configured plan, and
//! persists the resulting ids.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::billing::{BillingError, RemoteSubscription};
use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::user::User;
use crate::routes::auth::MessageQuery;
use crate::state::AppState;

/// Payment form data from the client-side tokenizer.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    /// One-time card token minted by the gateway's JS library.
    pub token_id: String,
    /// Anti-fraud device fingerprint, required by the gateway.
    pub device_session_id: String,
}

/// Billing overview template.
#[derive(Template, WebTemplate)]
#[template(path = "billing/index.html")]
pub struct BillingTemplate {
    pub user: User,
    /// Live subscription, when the member has one and it was queryable.
    pub subscription: Option<RemoteSubscription>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Add-payment page template; exposes the tokenizer's credentials.
#[derive(Template, WebTemplate)]
#[template(path = "billing/add_payment.html")]
pub struct AddPaymentTemplate {
    pub merchant_id: String,
    pub public_key: String,
    pub error: Option<String>,
}

/// Display the billing overview.
///
/// The remote subscription is shown when queryable; a gateway failure
/// degrades to the local linkage view rather than erroring the page.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))?;

    let subscription = if user.payment.is_subscribed() {
        match state.billing().get_status(&user).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(user_id = %user.id, "Subscription lookup failed: {}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(BillingTemplate {
        user,
        subscription,
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Display the add-payment page with the client-side tokenizer.
pub async fn add_payment_page(
    State(state): State<AppState>,
    RequireAuth(_current): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let billing = &state.config().billing;
    AddPaymentTemplate {
        merchant_id: billing.merchant_id.clone(),
        public_key: billing.public_key.clone(),
        error: query.error,
    }
}

/// Handle the payment form: register the customer, then subscribe.
///
/// `ensure_customer` is idempotent, so a retry after a failed subscription
/// attempt reuses the linked customer instead of creating another.
pub async fn submit_payment(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    if form.token_id.trim().is_empty() || form.device_session_id.trim().is_empty() {
        return Ok(
            Redirect::to("/billing/add-payment?error=Card+details+are+incomplete").into_response(),
        );
    }

    let users = UserRepository::new(state.pool());
    let mut user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))?;

    if user.payment.subscription_id.is_some() {
        return Ok(
            Redirect::to("/billing?error=You+already+have+a+subscription").into_response(),
        );
    }

    let customer_id = state.billing().ensure_customer(&user).await?;
    if user.payment.customer_id.is_none() {
        users.set_customer_id(user.id, &customer_id).await?;
        user.payment.customer_id = Some(customer_id);
    }

    match state.billing().add_subscription(&user, &form.token_id).await {
        Ok(subscription) => {
            users.set_subscription_id(user.id, &subscription.id).await?;

            if let Err(e) = state
                .email()
                .send_subscription_started(
                    user.email.as_str(),
                    &user.display_name(),
                    subscription.status.as_str(),
                )
                .await
            {
                tracing::error!(user_id = %user.id, "Failed to send welcome email: {}", e);
                sentry::capture_error(&e);
            }

            Ok(Redirect::to("/billing?success=Your+subscription+is+active").into_response())
        }
        Err(BillingError::Gateway(e)) => {
            // Card declined or similar; the customer linkage survives for
            // the retry.
            tracing::warn!(user_id = %user.id, "Subscription rejected: {}", e);
            Ok(
                Redirect::to("/billing/add-payment?error=Your+card+was+declined")
                    .into_response(),
            )
        }
        Err(e @ BillingError::NotRegistered) => Err(e.into()),
    }
}

/// Handle subscription cancellation.
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Response, AppError> {
    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))?;

    match state.billing().cancel_subscription(&user).await {
        Ok(()) => {
            users.clear_subscription_id(user.id).await?;
            Ok(Redirect::to("/billing?success=Your+subscription+has+been+cancelled")
                .into_response())
        }
        Err(BillingError::NotRegistered) => {
            Ok(Redirect::to("/billing?error=No+subscription+to+cancel").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
