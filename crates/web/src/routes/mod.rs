//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth
//! GET  /login                  - Login page
//! POST /login                  - Login action
//! GET  /signup                 - Signup page
//! POST /signup                 - Signup action
//! POST /logout                 - Logout action
//! GET  /forgot                 - Forgot password page
//! POST /forgot                 - Email a reset link
//! GET  /reset/{token}          - Reset password page
//! POST /reset/{token}          - Reset password action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! POST /account/profile        - Update profile (syncs gateway customer)
//! POST /account/password       - Change password
//! POST /account/delete         - Delete account
//!
//! # Billing (requires auth)
//! GET  /billing                - Billing overview with live status
//! GET  /billing/add-payment    - Card tokenizer page
//! POST /billing/payment        - Register customer + subscribe
//! POST /billing/cancel         - Cancel subscription
//!
//! # Routines (subscription gate)
//! GET  /routines               - Routine list
//! GET  /routine/{index}        - Today's workout player
//!
//! # Exercises (subscription gate)
//! GET  /exercises              - Exercise list
//! GET  /exercises/new          - New exercise form
//! POST /exercises              - Create (multipart with videos)
//! GET  /exercises/{id}/edit    - Edit form
//! POST /exercises/{id}         - Update (multipart)
//! POST /exercises/{id}/delete  - Delete
//!
//! # Contact
//! GET  /contact                - Contact page
//! POST /contact                - Send message to staff
//! ```

pub mod account;
pub mod auth;
pub mod billing;
pub mod contact;
pub mod exercises;
pub mod home;
pub mod routines;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::middleware::require_active_subscription;
use crate::state::AppState;

/// Create the public routes router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(home::health))
        .route("/health/ready", get(home::health_ready))
        .route("/contact", get(contact::page).post(contact::submit))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", get(auth::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/forgot", get(auth::forgot_page).post(auth::forgot))
        .route("/reset/{token}", get(auth::reset_page).post(auth::reset))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(account::index))
        .route("/account/profile", post(account::update_profile))
        .route("/account/password", post(account::change_password))
        .route("/account/delete", post(account::delete_account))
}

/// Create the billing routes router.
pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/billing", get(billing::index))
        .route("/billing/add-payment", get(billing::add_payment_page))
        .route("/billing/payment", post(billing::submit_payment))
        .route("/billing/cancel", post(billing::cancel))
}

/// Create the member-only routes, behind the subscription gate.
pub fn gated_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/routines", get(routines::index))
        .route("/routine/{index}", get(routines::player))
        .route(
            "/exercises",
            get(exercises::index)
                .post(exercises::create)
                .layer(DefaultBodyLimit::max(exercises::UPLOAD_BODY_LIMIT)),
        )
        .route("/exercises/new", get(exercises::new_page))
        .route("/exercises/{id}/edit", get(exercises::edit_page))
        .route(
            "/exercises/{id}",
            post(exercises::update).layer(DefaultBodyLimit::max(exercises::UPLOAD_BODY_LIMIT)),
        )
        .route("/exercises/{id}/delete", post(exercises::delete))
        .layer(middleware::from_fn_with_state(
            state,
            require_active_subscription,
        ))
}
