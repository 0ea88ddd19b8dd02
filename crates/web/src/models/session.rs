//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use dailyrep_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data kept in the session to identify the logged-in member;
/// everything else is loaded per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Member's database ID.
    pub id: UserId,
    /// Member's email address.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in member.
    pub const CURRENT_USER: &str = "current_user";
}
