//! End-to-end tests for the account flows.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The web server running (cargo run -p dailyrep-web)
//!
//! Run with: cargo test -p dailyrep-integration-tests -- --ignored

use dailyrep_integration_tests::{base_url, unique_email, web_client};
use reqwest::{Client, StatusCode};

/// Sign up a fresh account and leave the client logged in.
async fn signup(client: &Client, email: &str, password: &str) {
    let base = base_url();
    let resp = client
        .post(format!("{base}/signup"))
        .form(&[
            ("email", email),
            ("password", password),
            ("password_confirm", password),
        ])
        .send()
        .await
        .expect("Failed to submit signup form");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/billing");
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running web server"]
async fn test_health_endpoints() {
    let client = web_client();
    let base = base_url();

    let resp = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("Failed to reach health endpoint");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base}/health/ready"))
        .send()
        .await
        .expect("Failed to reach readiness endpoint");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Signup & Login
// ============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_signup_then_login() {
    let client = web_client();
    let base = base_url();
    let email = unique_email("signup");

    signup(&client, &email, "correct horse battery").await;

    // A fresh client has no session and must log in from scratch.
    let client = web_client();
    let resp = client
        .post(format!("{base}/login"))
        .form(&[("email", email.as_str()), ("password", "correct horse battery")])
        .send()
        .await
        .expect("Failed to submit login form");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/routines");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_signup_duplicate_email_rejected() {
    let client = web_client();
    let base = base_url();
    let email = unique_email("dup");

    signup(&client, &email, "correct horse battery").await;

    let resp = client
        .post(format!("{base}/signup"))
        .form(&[
            ("email", email.as_str()),
            ("password", "correct horse battery"),
            ("password_confirm", "correct horse battery"),
        ])
        .send()
        .await
        .expect("Failed to submit duplicate signup");

    // Bounced back to the signup page with an error in the query string.
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/signup?error="));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_login_wrong_password_rejected() {
    let client = web_client();
    let base = base_url();
    let email = unique_email("wrongpw");

    signup(&client, &email, "correct horse battery").await;

    let client = web_client();
    let resp = client
        .post(format!("{base}/login"))
        .form(&[("email", email.as_str()), ("password", "not the password")])
        .send()
        .await
        .expect("Failed to submit login form");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login?error="));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_logout_clears_session() {
    let client = web_client();
    let base = base_url();
    let email = unique_email("logout");

    signup(&client, &email, "correct horse battery").await;

    let resp = client
        .post(format!("{base}/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // The account page needs a session and should now bounce to login.
    let resp = client
        .get(format!("{base}/account"))
        .send()
        .await
        .expect("Failed to request account page");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_forgot_password_is_uniform() {
    let client = web_client();
    let base = base_url();
    let email = unique_email("forgot");

    signup(&client, &email, "correct horse battery").await;

    // Real account and unknown account must get the same answer, so
    // the form cannot be used to probe which emails are registered.
    let known = client
        .post(format!("{base}/forgot"))
        .form(&[("email", email.as_str())])
        .send()
        .await
        .expect("Failed to submit forgot form");
    let unknown = client
        .post(format!("{base}/forgot"))
        .form(&[("email", "nobody-here@example.com")])
        .send()
        .await
        .expect("Failed to submit forgot form");

    assert_eq!(known.status(), unknown.status());
    assert_eq!(location(&known), location(&unknown));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_reset_with_bogus_token_rejected() {
    let client = web_client();
    let base = base_url();

    let resp = client
        .post(format!("{base}/reset/{}", "0".repeat(64)))
        .form(&[
            ("password", "a brand new password"),
            ("password_confirm", "a brand new password"),
        ])
        .send()
        .await
        .expect("Failed to submit reset form");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/forgot?error="));
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_profile_update_persists() {
    let client = web_client();
    let base = base_url();
    let email = unique_email("profile");

    signup(&client, &email, "correct horse battery").await;

    let resp = client
        .post(format!("{base}/account/profile"))
        .form(&[
            ("first_name", "Ana"),
            ("last_name", "Torres"),
            ("city", "Monterrey"),
        ])
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let body = client
        .get(format!("{base}/account"))
        .send()
        .await
        .expect("Failed to load account page")
        .text()
        .await
        .expect("Failed to read account page");
    assert!(body.contains("Ana"));
    assert!(body.contains("Torres"));
}
