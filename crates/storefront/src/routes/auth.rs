//! Credential authentication route handlers.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::{AuthService, SignInInput, SignUpInput};
use crate::services::outcome::ActionOutcome;
use crate::state::AppState;

use super::json_body;

/// Tag Sentry with whoever the session now belongs to.
async fn tag_signed_in_user(session: &Session) {
    if let Ok(Some(user)) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
    {
        set_sentry_user(&user.id, Some(user.email.as_str()));
    }
}

/// `POST /auth/signin`
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<SignInInput>, JsonRejection>,
) -> ActionOutcome {
    let input = match json_body(payload) {
        Ok(input) => input,
        Err(outcome) => return outcome,
    };

    let users = UserRepository::new(state.pool());
    let outcome = AuthService::new(&users).sign_in(&input, &session).await;
    if outcome.is_success() {
        tag_signed_in_user(&session).await;
    }
    outcome
}

/// `POST /auth/signup`
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<SignUpInput>, JsonRejection>,
) -> ActionOutcome {
    let input = match json_body(payload) {
        Ok(input) => input,
        Err(outcome) => return outcome,
    };
    if input.username.trim().is_empty() {
        return ActionOutcome::validation("Username is required.");
    }

    let users = UserRepository::new(state.pool());
    let outcome = AuthService::new(&users).sign_up(&input, &session).await;
    if outcome.is_success() {
        tag_signed_in_user(&session).await;
    }
    outcome
}

/// `POST /auth/signout`
pub async fn sign_out(State(state): State<AppState>, session: Session) -> ActionOutcome {
    let users = UserRepository::new(state.pool());
    let outcome = AuthService::new(&users).sign_out(&session).await;
    clear_sentry_user();
    outcome
}
