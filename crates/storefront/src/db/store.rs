//! Storage seams used by the account and auth workflows.
//!
//! The workflows are generic over these traits so they can run against
//! `PostgreSQL` in production and against in-memory stores in tests.

use karya_core::{AddressId, Email, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressInput, NewUser, ProfileChanges, ProfileWrite, User};

/// Account persistence.
pub trait UserStore: Send + Sync {
    /// Insert a user together with its password hash.
    fn create_with_password(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Insert a user that signs in through an external provider only.
    fn create_oauth(
        &self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// The user and their stored hash, or `None` if either is missing.
    fn get_password_hash(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    /// Apply profile changes and stamp `updated_at`. The image column is
    /// only written when `changes.image` carries a replacement.
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> impl Future<Output = Result<ProfileWrite, RepositoryError>> + Send;
}

/// Address persistence. Every operation is scoped to the owning user.
pub trait AddressStore: Send + Sync {
    /// Insert an inactive address.
    fn create(
        &self,
        owner: UserId,
        input: &AddressInput,
    ) -> impl Future<Output = Result<Address, RepositoryError>> + Send;

    /// Returns `RepositoryError::NotFound` if the owner has no such address.
    fn update(
        &self,
        owner: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> impl Future<Output = Result<Address, RepositoryError>> + Send;

    /// Returns `RepositoryError::NotFound` if the owner has no such address.
    fn delete(
        &self,
        owner: UserId,
        id: AddressId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Make `id` the owner's only active address, atomically.
    ///
    /// Returns `RepositoryError::NotFound` (and changes nothing) if the owner
    /// has no such address.
    fn set_active(
        &self,
        owner: UserId,
        id: AddressId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Active address first, then newest first.
    fn list_for_user(
        &self,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<Address>, RepositoryError>> + Send;
}
