//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] karya_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Session could not be read or written.
    #[error("session error: {0}")]
    Session(String),

    /// Google OAuth exchange failed.
    #[error("oauth error: {0}")]
    OAuth(String),

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// What a failed sign-in tells the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInError {
    /// Unknown email, missing password, or wrong password.
    InvalidCredentials,
    /// Anything else.
    Unknown,
}

impl From<&AuthError> for SignInError {
    fn from(error: &AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials | AuthError::InvalidEmail(_) => Self::InvalidCredentials,
            _ => Self::Unknown,
        }
    }
}
