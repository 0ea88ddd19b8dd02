//! Account route handlers.
//!
//! Profile editing keeps the gateway customer in sync: after a local save
//! the remote customer is updated, falling back to a single re-create whose
//! replacement id is persisted.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::billing::CustomerSync;
use crate::db::users::UserRepository;
use crate::error::{AppError, clear_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user};
use crate::models::user::{Address, Profile, User};
use crate::routes::auth::MessageQuery;
use crate::services::AuthService;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Profile form data. Empty strings clear the stored value.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub line1: Option<String>,
    pub postal_code: Option<String>,
}

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub user: User,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the account page.
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

    Ok(AccountTemplate {
        user,
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Handle profile form submission.
///
/// Saves locally first, then pushes the change to the gateway customer. A
/// replaced customer id from the re-create path is persisted before
/// reporting success; a gateway failure leaves the local save in place.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let profile = Profile {
        first_name: non_empty(form.first_name),
        last_name: non_empty(form.last_name),
        gender: non_empty(form.gender),
        phone: non_empty(form.phone),
    };
    let address = Address {
        city: non_empty(form.city),
        state: non_empty(form.state),
        line1: non_empty(form.line1),
        postal_code: non_empty(form.postal_code),
    };

    let users = UserRepository::new(state.pool());
    let user = users.update_profile(current.id, &profile, &address).await?;

    // Not yet a gateway customer: nothing remote to sync.
    if user.payment.customer_id.is_none() {
        return Ok(Redirect::to("/account?success=Profile+updated").into_response());
    }

    match state.billing().update_customer_or_recreate(&user).await {
        Ok(CustomerSync::Updated(_)) => {
            Ok(Redirect::to("/account?success=Profile+updated").into_response())
        }
        Ok(CustomerSync::Recreated(customer_id)) => {
            users.set_customer_id(user.id, &customer_id).await?;
            tracing::info!(user_id = %user.id, "Replacement gateway customer persisted");
            Ok(Redirect::to("/account?success=Profile+updated").into_response())
        }
        Err(e) => {
            tracing::error!(user_id = %user.id, "Customer sync failed: {}", e);
            sentry::capture_error(&e);
            Ok(Redirect::to(
                "/account?error=Profile+saved,+but+billing+details+could+not+be+synced",
            )
            .into_response())
        }
    }
}

/// Handle password change form submission.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(Redirect::to("/account?error=Passwords+do+not+match").into_response());
    }

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))?;

    let auth = AuthService::new(state.pool());
    match auth
        .change_password(&user, &form.current_password, &form.password)
        .await
    {
        Ok(()) => {
            if let Err(e) = state
                .email()
                .send_password_changed(user.email.as_str(), &user.display_name())
                .await
            {
                tracing::error!(user_id = %user.id, "Failed to send confirmation email: {}", e);
                sentry::capture_error(&e);
            }
            Ok(Redirect::to("/account?success=Password+updated").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            Ok(Redirect::to("/account?error=Current+password+is+incorrect").into_response())
        }
        Err(AuthError::WeakPassword(_)) => Ok(Redirect::to(
            "/account?error=Password+must+be+at+least+8+characters",
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Handle account deletion.
///
/// Cancels any remote subscription best-effort before removing the local
/// record; a failed cancellation is reported to Sentry but doesn't block
/// the deletion.
pub async fn delete_account(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Result<Response, AppError> {
    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account".to_owned()))?;

    if user.payment.is_subscribed() {
        if let Err(e) = state.billing().cancel_subscription(&user).await {
            tracing::error!(user_id = %user.id, "Cancel before delete failed: {}", e);
            sentry::capture_error(&e);
        }
    }

    users.delete(user.id).await?;

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    tracing::info!(user_id = %user.id, "Account deleted");
    Ok(Redirect::to("/?success=Your+account+has+been+deleted").into_response())
}

/// Treat empty or whitespace-only form fields as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims_and_drops_blanks() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("   ".to_owned())), None);
        assert_eq!(non_empty(Some("  CDMX ".to_owned())), Some("CDMX".to_owned()));
    }
}
