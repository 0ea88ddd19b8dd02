//! Integration tests for Daily Rep.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! docker compose up -d db
//! cargo run -p dailyrep-cli -- migrate
//!
//! # Start the web server
//! cargo run -p dailyrep-web
//!
//! # Run the ignored end-to-end tests against it
//! cargo test -p dailyrep-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `web_auth` - Signup, login, logout and password reset flows
//! - `web_billing` - Subscription lifecycle and the access gate
//!
//! Tests that talk to the payment gateway need OpenPay sandbox
//! credentials in the server's environment; card tokens have to be
//! produced by the browser tokenizer, so those paths are only covered
//! up to the point where a token is required.

use reqwest::Client;

/// Base URL of the running web server (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("DAILYREP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A cookie-keeping client, so session log-ins survive across requests.
///
/// Redirects are not followed: most form handlers answer with a
/// `303 See Other` and the tests assert on the `Location` header.
#[must_use]
pub fn web_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique throwaway email per test run, so reruns never collide on
/// the `users.email` unique index.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 6];
    rand::rng().fill_bytes(&mut bytes);
    let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{suffix}@example.com")
}
