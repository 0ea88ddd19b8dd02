//! Contact form handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use dailyrep_core::Email;

use crate::middleware::OptionalAuth;
use crate::routes::auth::MessageQuery;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    /// Prefilled for logged-in members.
    pub email: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the contact page.
pub async fn page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    ContactTemplate {
        email: user.map(|u| u.email.as_str().to_owned()),
        error: query.error,
        success: query.success,
    }
}

/// Handle contact form submission.
pub async fn submit(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let name = form.name.trim();
    let message = form.message.trim();

    if name.is_empty() || message.is_empty() {
        return Redirect::to("/contact?error=Name+and+message+are+required").into_response();
    }
    let Ok(email) = Email::parse(form.email.trim()) else {
        return Redirect::to("/contact?error=Please+enter+a+valid+email+address").into_response();
    };

    match state
        .email()
        .send_contact_message(name, email.as_str(), message)
        .await
    {
        Ok(()) => {
            Redirect::to("/contact?success=Thanks,+we+will+get+back+to+you").into_response()
        }
        Err(e) => {
            tracing::error!("Contact message failed: {}", e);
            sentry::capture_error(&e);
            Redirect::to("/contact?error=Your+message+could+not+be+sent").into_response()
        }
    }
}
