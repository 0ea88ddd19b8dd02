//! Home page and health check handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::middleware::OptionalAuth;
use crate::routes::auth::MessageQuery;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub logged_in: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the home page.
pub async fn index(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    HomeTemplate {
        logged_in: user.is_some(),
        error: query.error,
        success: query.success,
    }
}

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    "OK"
}

/// Readiness check: verifies the database is reachable.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable").into_response()
        }
    }
}
