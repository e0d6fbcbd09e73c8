//! Google OAuth route handlers.
//!
//! - Login: stores a CSRF state in the session and redirects to Google
//! - Callback: checks the state, fetches the Google profile and signs the
//!   matching account in (creating it on first use)

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::set_sentry_user;
use crate::models::session_keys;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Where the browser lands after a failed Google sign-in.
const SIGNIN_ERROR_PATH: &str = "/auth/signin?error=google";

/// Query parameters from the Google OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&byte| char::from(byte))
        .collect()
}

/// `GET /auth/google/login`
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = generate_random_string(32);

    if let Err(e) = session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!(error = %e, "Failed to store OAuth state in session");
        return Redirect::to(SIGNIN_ERROR_PATH).into_response();
    }

    Redirect::to(&state.google().authorization_url(&oauth_state)).into_response()
}

/// `GET /auth/google/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "Google OAuth error");
        return Redirect::to(SIGNIN_ERROR_PATH).into_response();
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        tracing::warn!("Google OAuth callback missing code or state");
        return Redirect::to(SIGNIN_ERROR_PATH).into_response();
    };

    // One-time use
    let stored_state: Option<String> = session
        .remove(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!("Google OAuth state mismatch");
        return Redirect::to(SIGNIN_ERROR_PATH).into_response();
    }

    let profile = match state.google().fetch_profile(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch Google profile");
            return Redirect::to(SIGNIN_ERROR_PATH).into_response();
        }
    };

    let users = UserRepository::new(state.pool());
    match AuthService::new(&users)
        .sign_in_with_google(&profile, &session)
        .await
    {
        Ok(user) => {
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "User signed in with Google");
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Google sign-in failed");
            Redirect::to(SIGNIN_ERROR_PATH).into_response()
        }
    }
}
