//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use karya_core::{Email, ImageDescriptor, UserId};

/// Access scope of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserScope {
    #[default]
    Customer,
    Admin,
}

impl UserScope {
    /// Parse the stored column value; anything unknown is a customer.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::Customer,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

/// A storefront account.
///
/// The password hash is deliberately absent; it lives in its own table and
/// only the credential check in `crate::db::users` ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Full display name, set from the profile page.
    pub name: Option<String>,
    pub email: Email,
    pub phone: Option<String>,
    pub image: Option<ImageDescriptor>,
    pub scope: UserScope,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub image: Option<ImageDescriptor>,
}

/// Fields written by the profile-update workflow.
///
/// `updated_at` is stamped by the store when the change is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: String,
    pub username: String,
    pub phone: String,
    /// A replacement picture. `None` leaves the stored image untouched.
    pub image: Option<ImageDescriptor>,
}

/// A committed profile write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileWrite {
    pub user: User,
    /// The picture this write displaced, read under the same row lock.
    /// `None` when the image was kept or the user had none.
    pub replaced_image: Option<ImageDescriptor>,
}
