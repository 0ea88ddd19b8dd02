//! Authentication route handlers.
//!
//! Login, signup, logout, and the forgot/reset password flow.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::services::auth::AuthError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot.html")]
pub struct ForgotTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub error: Option<String>,
    pub token: String,
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.login_with_password(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
            };
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/login?error=Something+went+wrong").into_response();
            }
            set_sentry_user(&user.id, Some(user.email.as_str()));

            Redirect::to("/routines").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {}", e);
            Redirect::to("/login?error=Invalid+email+or+password").into_response()
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/").into_response()
}

// =============================================================================
// Signup
// =============================================================================

/// Display the signup page.
pub async fn signup_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    SignupTemplate { error: query.error }
}

/// Handle signup form submission.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to("/signup?error=Passwords+do+not+match").into_response();
    }

    let auth = AuthService::new(state.pool());

    match auth
        .register_with_password(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email.clone(),
            };
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::error!("Failed to set session: {}", e);
                return Redirect::to("/login?success=Account+created,+please+log+in")
                    .into_response();
            }
            set_sentry_user(&user.id, Some(user.email.as_str()));

            Redirect::to("/billing").into_response()
        }
        Err(AuthError::UserAlreadyExists) => {
            Redirect::to("/signup?error=An+account+with+this+email+already+exists").into_response()
        }
        Err(AuthError::WeakPassword(_)) => {
            Redirect::to("/signup?error=Password+must+be+at+least+8+characters").into_response()
        }
        Err(AuthError::InvalidEmail(_)) => {
            Redirect::to("/signup?error=Invalid+email+address").into_response()
        }
        Err(e) => {
            tracing::error!("Signup failed: {}", e);
            Redirect::to("/signup?error=Something+went+wrong").into_response()
        }
    }
}

// =============================================================================
// Forgot / Reset Password
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    ForgotTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle the forgot password form: email a one-hour reset link.
///
/// Responds identically whether or not the account exists, so addresses
/// cannot be probed.
pub async fn forgot(State(state): State<AppState>, Form(form): Form<ForgotForm>) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.start_password_reset(&form.email).await {
        Ok((user, token)) => {
            if let Err(e) = state
                .email()
                .send_password_reset(user.email.as_str(), &user.display_name(), &token)
                .await
            {
                tracing::error!(user_id = %user.id, "Failed to send reset email: {}", e);
                sentry::capture_error(&e);
            }
        }
        Err(AuthError::UserNotFound | AuthError::InvalidEmail(_)) => {
            tracing::debug!("Reset requested for unknown address");
        }
        Err(e) => {
            tracing::error!("Password reset failed: {}", e);
            sentry::capture_error(&e);
        }
    }

    Redirect::to("/forgot?success=If+that+address+exists,+a+reset+link+is+on+its+way")
        .into_response()
}

/// Display the reset password page for a token from the emailed link.
pub async fn reset_page(
    Path(token): Path<String>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ResetTemplate {
        error: query.error,
        token,
    }
}

/// Handle the reset password form.
pub async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Response {
    if form.password != form.password_confirm {
        return Redirect::to(&format!("/reset/{token}?error=Passwords+do+not+match"))
            .into_response();
    }

    let auth = AuthService::new(state.pool());

    match auth.reset_password(&token, &form.password).await {
        Ok(user) => {
            if let Err(e) = state
                .email()
                .send_password_changed(user.email.as_str(), &user.display_name())
                .await
            {
                tracing::error!(user_id = %user.id, "Failed to send confirmation email: {}", e);
                sentry::capture_error(&e);
            }

            Redirect::to("/login?success=Password+updated,+please+log+in").into_response()
        }
        Err(AuthError::InvalidResetToken) => {
            Redirect::to("/forgot?error=This+reset+link+is+invalid+or+has+expired").into_response()
        }
        Err(AuthError::WeakPassword(_)) => Redirect::to(&format!(
            "/reset/{token}?error=Password+must+be+at+least+8+characters"
        ))
        .into_response(),
        Err(e) => {
            tracing::error!("Password reset failed: {}", e);
            Redirect::to("/forgot?error=Something+went+wrong").into_response()
        }
    }
}
