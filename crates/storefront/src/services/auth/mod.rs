//! Authentication service.
//!
//! Credential sign-in and sign-up, sign-out, and Google sign-in. Session
//! state is written through [`SessionWriter`] so the flows can be exercised
//! without a session store.

mod error;
pub mod google;

pub use error::{AuthError, SignInError};
pub use google::{GoogleClient, GoogleProfile};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, info, instrument};

use karya_core::Email;

use crate::db::RepositoryError;
use crate::db::store::UserStore;
use crate::models::{CurrentUser, NewUser, User, session_keys};
use crate::services::outcome::{ActionOutcome, FailureKind};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Writes the signed-in identity to the caller's session.
pub trait SessionWriter: Send + Sync {
    /// Rotate the session id and store `user` as the current user.
    fn establish(&self, user: &CurrentUser) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Overwrite the stored user, keeping the session id.
    fn refresh(&self, user: &CurrentUser) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Drop everything stored in the session.
    fn clear(&self) -> impl Future<Output = Result<(), AuthError>> + Send;
}

impl SessionWriter for Session {
    async fn establish(&self, user: &CurrentUser) -> Result<(), AuthError> {
        // New id on privilege change.
        self.cycle_id()
            .await
            .map_err(|e| AuthError::Session(e.to_string()))?;
        self.insert(session_keys::CURRENT_USER, user)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))
    }

    async fn refresh(&self, user: &CurrentUser) -> Result<(), AuthError> {
        self.insert(session_keys::CURRENT_USER, user)
            .await
            .map_err(|e| AuthError::Session(e.to_string()))
    }

    async fn clear(&self) -> Result<(), AuthError> {
        self.flush()
            .await
            .map_err(|e| AuthError::Session(e.to_string()))
    }
}

/// Sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpInput {
    pub username: String,
    pub password: String,
    pub email: String,
    pub phone: String,
}

/// Authentication service.
pub struct AuthService<'a, S> {
    users: &'a S,
}

impl<'a, S: UserStore> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a S) -> Self {
        Self { users }
    }

    /// Check credentials and establish a session.
    #[instrument(skip_all)]
    pub async fn sign_in<W: SessionWriter>(
        &self,
        input: &SignInInput,
        session: &W,
    ) -> ActionOutcome {
        match self.sign_in_user(&input.email, &input.password, session).await {
            Ok(user) => {
                info!(user_id = %user.id, "User signed in");
                ActionOutcome::Success("Successfully logged in.")
            }
            Err(e) => match SignInError::from(&e) {
                SignInError::InvalidCredentials => {
                    ActionOutcome::Failure(FailureKind::InvalidCredentials)
                }
                SignInError::Unknown => {
                    error!(error = %e, "Sign-in failed");
                    ActionOutcome::unknown()
                }
            },
        }
    }

    /// Create an account, then sign in with the submitted credentials.
    ///
    /// No sign-in is attempted unless the account was created.
    #[instrument(skip_all)]
    pub async fn sign_up<W: SessionWriter>(
        &self,
        input: &SignUpInput,
        session: &W,
    ) -> ActionOutcome {
        let user = match self.register_with_password(input).await {
            Ok(user) => user,
            Err(AuthError::InvalidEmail(e)) => {
                return ActionOutcome::validation(capitalize(&e.to_string()));
            }
            Err(AuthError::WeakPassword(message)) => {
                return ActionOutcome::validation(capitalize(&message));
            }
            Err(e) => {
                error!(error = %e, "Sign-up failed");
                return ActionOutcome::unknown();
            }
        };
        info!(user_id = %user.id, "User registered");

        match self.sign_in_user(&input.email, &input.password, session).await {
            Ok(_) => ActionOutcome::Success("Successfully registered."),
            Err(e) => {
                error!(error = %e, user_id = %user.id, "Sign-in after sign-up failed");
                ActionOutcome::unknown()
            }
        }
    }

    /// Clear the session.
    #[instrument(skip_all)]
    pub async fn sign_out<W: SessionWriter>(&self, session: &W) -> ActionOutcome {
        match session.clear().await {
            Ok(()) => ActionOutcome::Success("Successfully logged out."),
            Err(e) => {
                error!(error = %e, "Sign-out failed");
                ActionOutcome::unknown()
            }
        }
    }

    /// Find or create the account for a verified Google identity and
    /// establish a session for it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::OAuth` if Google has not verified the email.
    /// Returns `AuthError::Repository` or `AuthError::Session` if persisting fails.
    #[instrument(skip_all)]
    pub async fn sign_in_with_google<W: SessionWriter>(
        &self,
        profile: &GoogleProfile,
        session: &W,
    ) -> Result<User, AuthError> {
        if !profile.email_verified {
            return Err(AuthError::OAuth("email not verified by Google".to_owned()));
        }
        let email = Email::parse(&profile.email)?;

        let user = match self.users.get_by_email(&email).await? {
            Some(user) => user,
            None => self.create_google_user(email, profile.name.clone()).await?,
        };

        session.establish(&CurrentUser::from(&user)).await?;
        Ok(user)
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email or username is taken.
    pub async fn register_with_password(&self, input: &SignUpInput) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;

        validate_password(&input.password)?;

        let password_hash = hash_password(&input.password)?;

        let new_user = NewUser {
            username: input.username.trim().to_owned(),
            email,
            phone: Some(input.phone.trim().to_owned()).filter(|phone| !phone.is_empty()),
            name: None,
            image: None,
        };

        self.users
            .create_with_password(&new_user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    async fn sign_in_user<W: SessionWriter>(
        &self,
        email: &str,
        password: &str,
        session: &W,
    ) -> Result<User, AuthError> {
        let user = self.login_with_password(email, password).await?;
        session.establish(&CurrentUser::from(&user)).await?;
        Ok(user)
    }

    /// Usernames are unique, so fall back to a suffixed local part when the
    /// plain one is taken.
    async fn create_google_user(
        &self,
        email: Email,
        name: Option<String>,
    ) -> Result<User, AuthError> {
        let local = email.as_str().split('@').next().unwrap_or_default().to_owned();
        let mut new_user = NewUser {
            username: local.clone(),
            email,
            phone: None,
            name,
            image: None,
        };

        match self.users.create_oauth(&new_user).await {
            Err(RepositoryError::Conflict(_)) => {
                let suffix: u16 = rand::rng().random_range(1000..10_000);
                new_user.username = format!("{local}{suffix}");
                Ok(self.users.create_oauth(&new_user).await?)
            }
            other => Ok(other?),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect::<String>() + "."
    })
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
