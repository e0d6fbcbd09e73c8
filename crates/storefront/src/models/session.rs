//! What the storefront keeps in a tower-sessions session.

use serde::{Deserialize, Serialize};

use karya_core::{Email, UserId};

use super::User;

/// The signed-in account, written by `SessionWriter::establish` and read by
/// the auth extractors. A successful profile edit rewrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    pub const CURRENT_USER: &str = "current_user";

    /// One-time CSRF state for the Google redirect.
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";
}
