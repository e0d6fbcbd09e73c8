//! Business logic services for storefront.
//!
//! # Services
//!
//! - `account` - Address and profile mutation workflows
//! - `auth` - Credential and Google sign-in, sign-up, sign-out
//! - `cache` - Cached account views and their invalidation
//! - `media` - Profile picture hosting (Cloudinary)
//! - `outcome` - The `{success, message}` result of every action

pub mod account;
pub mod auth;
pub mod cache;
pub mod media;
pub mod outcome;

pub use account::{AddressWorkflow, ProfileUpdate, ProfileWorkflow};
pub use auth::{AuthError, AuthService, GoogleClient, SessionWriter};
pub use cache::{PageCache, RevalidateScope, ViewInvalidator, ViewPath};
pub use media::{CloudinaryClient, ImageHost, MediaError};
pub use outcome::{ActionOutcome, FailureKind};
