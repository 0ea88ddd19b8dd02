//! Email service for password resets, billing receipts, and contact mail.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

/// HTML template for the password changed notice.
#[derive(Template)]
#[template(path = "email/password_changed.html")]
struct PasswordChangedEmailHtml<'a> {
    name: &'a str,
}

/// Plain text template for the password changed notice.
#[derive(Template)]
#[template(path = "email/password_changed.txt")]
struct PasswordChangedEmailText<'a> {
    name: &'a str,
}

/// HTML template for the subscription confirmation email.
#[derive(Template)]
#[template(path = "email/subscription_started.html")]
struct SubscriptionStartedEmailHtml<'a> {
    name: &'a str,
    status: &'a str,
}

/// Plain text template for the subscription confirmation email.
#[derive(Template)]
#[template(path = "email/subscription_started.txt")]
struct SubscriptionStartedEmailText<'a> {
    name: &'a str,
    status: &'a str,
}

/// Plain text template relaying a contact-form message to staff.
#[derive(Template)]
#[template(path = "email/contact.txt")]
struct ContactEmailText<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    contact_recipient: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            contact_recipient: config.contact_recipient.clone(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let reset_url = format!("{}/reset/{token}", self.base_url);
        let html = PasswordResetEmailHtml {
            name,
            reset_url: &reset_url,
        }
        .render()?;
        let text = PasswordResetEmailText {
            name,
            reset_url: &reset_url,
        }
        .render()?;

        self.send_multipart_email(to, "Reset your Daily Rep password", &text, &html)
            .await
    }

    /// Notify a member that their password was changed.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_password_changed(&self, to: &str, name: &str) -> Result<(), EmailError> {
        let html = PasswordChangedEmailHtml { name }.render()?;
        let text = PasswordChangedEmailText { name }.render()?;

        self.send_multipart_email(to, "Your Daily Rep password was changed", &text, &html)
            .await
    }

    /// Confirm a new subscription to the member.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or a template fails to
    /// render.
    pub async fn send_subscription_started(
        &self,
        to: &str,
        name: &str,
        status: &str,
    ) -> Result<(), EmailError> {
        let html = SubscriptionStartedEmailHtml { name, status }.render()?;
        let text = SubscriptionStartedEmailText { name, status }.render()?;

        self.send_multipart_email(to, "Welcome to Daily Rep", &text, &html)
            .await
    }

    /// Relay a contact-form submission to the configured staff inbox.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to send or the template fails to
    /// render.
    pub async fn send_contact_message(
        &self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<(), EmailError> {
        let text = ContactEmailText {
            name,
            email,
            message,
        }
        .render()?;

        let mail = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(self
                .contact_recipient
                .parse()
                .map_err(|_| EmailError::InvalidAddress(self.contact_recipient.clone()))?)
            .subject(format!("Contact form: {name}"))
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text),
            )?;

        self.mailer.send(mail).await?;

        tracing::info!(from = %email, "Contact message relayed");
        Ok(())
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}
